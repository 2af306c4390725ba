//! Request store accessor: reads pending requests out of the key-value store
//! and writes new ones into it.

use std::sync::Arc;

use crate::errors::EdlError;
use crate::models::request::{Request, RequestId, StoredRequest, REQUEST_KEY_PATTERN};
use crate::store::KvStore;

/// Result of enumerating the request namespace.
#[derive(Debug, Default)]
pub struct RequestListing {
    pub requests: Vec<Request>,
    /// Ids whose hash holds only some of the request fields. They are not
    /// pending requests and are left untouched.
    pub incomplete: Vec<RequestId>,
}

#[derive(Clone)]
pub struct RequestStore {
    store: Arc<dyn KvStore>,
}

impl RequestStore {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Enumerate every pending request.
    ///
    /// Order follows the store's key enumeration and is not stable. Any store
    /// failure aborts the whole listing.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self) -> Result<RequestListing, EdlError> {
        let keys = self
            .store
            .enumerate_keys(REQUEST_KEY_PATTERN)
            .await
            .map_err(EdlError::StoreUnavailable)?;

        let mut listing = RequestListing::default();
        for key in keys {
            let Some(id) = RequestId::from_key(&key) else {
                continue;
            };
            let fields = self
                .store
                .get_all_fields(&key)
                .await
                .map_err(|source| EdlError::FieldRead { key, source })?;

            match Request::decode(id.clone(), fields) {
                StoredRequest::Pending(request) => listing.requests.push(request),
                // deleted between enumeration and read
                StoredRequest::Absent => {}
                StoredRequest::Incomplete { .. } => listing.incomplete.push(id),
            }
        }
        Ok(listing)
    }

    /// Read one field of a request. A missing request or field is an error,
    /// never an empty string.
    #[tracing::instrument(skip(self))]
    pub async fn field(&self, id: &RequestId, field: &str) -> Result<String, EdlError> {
        let key = id.key();
        self.store
            .get_field(&key, field)
            .await
            .map_err(|source| EdlError::FieldRead { key, source })
    }

    /// Record a new pending request under a fresh id.
    #[tracing::instrument(skip(self, reason))]
    pub async fn submit(&self, user: &str, url: &str, reason: &str) -> Result<Request, EdlError> {
        if user.trim().is_empty() {
            return Err(EdlError::InvalidSubmission("user is required".into()));
        }
        if url.trim().is_empty() {
            return Err(EdlError::InvalidSubmission("url is required".into()));
        }

        let id = RequestId::parse(&uuid::Uuid::new_v4().simple().to_string())?;
        let request = Request {
            id,
            user: user.trim().to_string(),
            url: url.trim().to_string(),
            reason: reason.to_string(),
        };
        let key = request.key();
        self.store
            .set_fields(&key, &request.encode())
            .await
            .map_err(|source| EdlError::StoreWrite { key, source })?;
        Ok(request)
    }
}
