use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::EdlError;

pub const REQUEST_KEY_PREFIX: &str = "request:";
pub const REQUEST_KEY_PATTERN: &str = "request:*";

/// Set holding every accepted URL. Read by the enforcement point.
pub const EDL_KEY: &str = "edl";

pub const FIELD_USER: &str = "user";
pub const FIELD_URL: &str = "url";
pub const FIELD_REASON: &str = "reason";

/// Fields a pending request must carry. Terminal transitions delete exactly these.
pub const REQUEST_FIELDS: [&str; 3] = [FIELD_USER, FIELD_URL, FIELD_REASON];

/// Opaque request identifier, equal to the suffix of its `request:<id>` key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// Blank ids are rejected. Anything else is kept verbatim, surrounding
    /// whitespace included, so it names exactly the key the caller sent.
    pub fn parse(raw: &str) -> Result<Self, EdlError> {
        if raw.trim().is_empty() {
            return Err(EdlError::InvalidRequestId(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    /// Recover the id from a storage key. Returns `None` for keys outside the
    /// request namespace.
    pub fn from_key(key: &str) -> Option<Self> {
        key.strip_prefix(REQUEST_KEY_PREFIX)
            .map(|id| Self(id.to_string()))
    }

    pub fn key(&self) -> String {
        format!("{}{}", REQUEST_KEY_PREFIX, self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A pending unblock request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub id: RequestId,
    pub user: String,
    pub url: String,
    pub reason: String,
}

/// What a `request:<id>` hash turned out to hold when it was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredRequest {
    /// None of the request fields are present. The key is logically gone.
    Absent,
    /// Some but not all fields are present, e.g. after a half-applied delete.
    Incomplete { present: Vec<&'static str> },
    Pending(Request),
}

impl Request {
    /// Map a field set read from the store onto a request.
    ///
    /// Unknown fields are ignored. A request only exists when all of
    /// `user`, `url` and `reason` are present.
    pub fn decode(id: RequestId, mut fields: HashMap<String, String>) -> StoredRequest {
        let user = fields.remove(FIELD_USER);
        let url = fields.remove(FIELD_URL);
        let reason = fields.remove(FIELD_REASON);

        match (user, url, reason) {
            (Some(user), Some(url), Some(reason)) => StoredRequest::Pending(Request {
                id,
                user,
                url,
                reason,
            }),
            (None, None, None) => StoredRequest::Absent,
            (user, url, reason) => {
                let present = [
                    (FIELD_USER, user.is_some()),
                    (FIELD_URL, url.is_some()),
                    (FIELD_REASON, reason.is_some()),
                ]
                .into_iter()
                .filter_map(|(name, found)| found.then_some(name))
                .collect();
                StoredRequest::Incomplete { present }
            }
        }
    }

    /// Field/value pairs written to the request's hash.
    pub fn encode(&self) -> [(&'static str, &str); 3] {
        [
            (FIELD_USER, self.user.as_str()),
            (FIELD_URL, self.url.as_str()),
            (FIELD_REASON, self.reason.as_str()),
        ]
    }

    pub fn key(&self) -> String {
        self.id.key()
    }
}
