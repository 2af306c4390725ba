//! Terminal transitions for pending requests.
//!
//! Accept: read url → add url to the EDL set → delete the request fields.
//! Reject: delete the request fields.
//!
//! The store only guarantees single-key atomicity, so the steps run strictly
//! in order and the delete is verified by its field count. The URL is
//! committed to the EDL set before the request is deleted: a failure between
//! the two leaves the request pending, and retrying is safe because the set
//! add is idempotent.

use std::sync::Arc;

use crate::errors::EdlError;
use crate::models::request::{RequestId, EDL_KEY, FIELD_URL, REQUEST_FIELDS};
use crate::requests::RequestStore;
use crate::store::KvStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    pub id: RequestId,
    pub url: String,
    /// False when the URL was already a member of the EDL set. Informational
    /// only: the accept still succeeds.
    pub newly_listed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejected {
    pub id: RequestId,
}

#[derive(Clone)]
pub struct TransitionEngine {
    store: Arc<dyn KvStore>,
    requests: RequestStore,
}

impl TransitionEngine {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self {
            requests: RequestStore::new(store.clone()),
            store,
        }
    }

    /// Promote a pending request's URL into the EDL set and retire the request.
    #[tracing::instrument(skip(self))]
    pub async fn accept(&self, id: &RequestId) -> Result<Accepted, EdlError> {
        // nothing has been written yet if this fails
        let url = self.requests.field(id, FIELD_URL).await?;

        let added = self
            .store
            .set_add(EDL_KEY, &url)
            .await
            .map_err(|source| EdlError::StoreWrite {
                key: EDL_KEY.to_string(),
                source,
            })?;

        self.delete_request(id).await?;

        Ok(Accepted {
            id: id.clone(),
            url,
            newly_listed: added > 0,
        })
    }

    /// Discard a pending request. The EDL set is never touched.
    #[tracing::instrument(skip(self))]
    pub async fn reject(&self, id: &RequestId) -> Result<Rejected, EdlError> {
        self.delete_request(id).await?;
        Ok(Rejected { id: id.clone() })
    }

    async fn delete_request(&self, id: &RequestId) -> Result<(), EdlError> {
        let key = id.key();
        let deleted = self
            .store
            .delete_fields(&key, &REQUEST_FIELDS)
            .await
            .map_err(|source| EdlError::StoreWrite { key, source })?;

        if deleted != REQUEST_FIELDS.len() {
            return Err(EdlError::DeleteMismatch {
                id: id.clone(),
                expected: REQUEST_FIELDS.len(),
                deleted,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use tokio_test::{assert_err, assert_ok};

    async fn seeded() -> (MemoryStore, TransitionEngine) {
        let mem = MemoryStore::new();
        mem.set_fields(
            "request:42",
            &[("user", "alice"), ("url", "http://x.test"), ("reason", "work")],
        )
        .await
        .unwrap();
        let engine = TransitionEngine::new(Arc::new(mem.clone()));
        (mem, engine)
    }

    fn id(raw: &str) -> RequestId {
        RequestId::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn test_accept_adds_url_then_deletes_request() {
        let (mem, engine) = seeded().await;
        let accepted = assert_ok!(engine.accept(&id("42")).await);

        assert_eq!(accepted.url, "http://x.test");
        assert!(accepted.newly_listed);
        assert!(mem.is_member(EDL_KEY, "http://x.test"));
        assert!(!mem.contains_key("request:42"));
    }

    #[tokio::test]
    async fn test_accept_with_url_already_listed_succeeds() {
        let (mem, engine) = seeded().await;
        mem.set_add(EDL_KEY, "http://x.test").await.unwrap();

        let accepted = assert_ok!(engine.accept(&id("42")).await);
        assert!(!accepted.newly_listed);
        assert_eq!(mem.set_len(EDL_KEY), 1);
        assert!(!mem.contains_key("request:42"));
    }

    #[tokio::test]
    async fn test_accept_missing_request_writes_nothing() {
        let (mem, engine) = seeded().await;
        let err = assert_err!(engine.accept(&id("99")).await);

        assert!(err.is_not_found());
        assert_eq!(mem.set_len(EDL_KEY), 0);
        assert!(mem.contains_key("request:42"));
    }

    #[tokio::test]
    async fn test_reject_leaves_edl_untouched() {
        let (mem, engine) = seeded().await;
        assert_ok!(engine.reject(&id("42")).await);

        assert_eq!(mem.set_len(EDL_KEY), 0);
        assert!(!mem.contains_key("request:42"));
    }

    #[tokio::test]
    async fn test_reject_twice_reports_mismatch() {
        let (_, engine) = seeded().await;
        assert_ok!(engine.reject(&id("42")).await);

        let err = assert_err!(engine.reject(&id("42")).await);
        assert!(matches!(err, EdlError::DeleteMismatch { deleted: 0, .. }));
        assert!(!err.is_partial_delete());
    }

    #[tokio::test]
    async fn test_accept_partial_request_reports_partial_delete() {
        let mem = MemoryStore::new();
        mem.set_fields("request:5", &[("url", "http://p.test"), ("user", "dan")])
            .await
            .unwrap();
        let engine = TransitionEngine::new(Arc::new(mem.clone()));

        let err = assert_err!(engine.accept(&id("5")).await);
        assert!(matches!(err, EdlError::DeleteMismatch { deleted: 2, expected: 3, .. }));
        assert!(err.is_partial_delete());
        // the url was committed before the delete was checked
        assert!(mem.is_member(EDL_KEY, "http://p.test"));
    }
}
