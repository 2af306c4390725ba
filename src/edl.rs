//! Read side of the EDL set, as served to the enforcement point.

use std::sync::Arc;

use crate::errors::EdlError;
use crate::models::request::EDL_KEY;
use crate::store::KvStore;

#[derive(Clone)]
pub struct EdlList {
    store: Arc<dyn KvStore>,
}

impl EdlList {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Every URL in the set, sorted.
    pub async fn members(&self) -> Result<Vec<String>, EdlError> {
        let mut urls = self
            .store
            .set_members(EDL_KEY)
            .await
            .map_err(|source| EdlError::FieldRead {
                key: EDL_KEY.to_string(),
                source,
            })?;
        urls.sort();
        Ok(urls)
    }

    /// Plain-text feed: one URL per line, each line newline-terminated.
    pub async fn render(&self) -> Result<String, EdlError> {
        Ok(self
            .members()
            .await?
            .into_iter()
            .map(|url| url + "\n")
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_render_one_url_per_line() {
        let mem = MemoryStore::new();
        mem.set_add(EDL_KEY, "http://b.test").await.unwrap();
        mem.set_add(EDL_KEY, "http://a.test").await.unwrap();

        let edl = EdlList::new(Arc::new(mem));
        assert_eq!(edl.render().await.unwrap(), "http://a.test\nhttp://b.test\n");
    }

    #[tokio::test]
    async fn test_render_empty_set() {
        let edl = EdlList::new(Arc::new(MemoryStore::new()));
        assert_eq!(edl.render().await.unwrap(), "");
    }
}
