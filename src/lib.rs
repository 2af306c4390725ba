//! EDL Admin — approval workflow for External Dynamic List unblock requests.
//!
//! Library crate shared by the `edl-admin` binary and the integration tests.

pub mod api;
pub mod cli;
pub mod config;
pub mod edl;
pub mod errors;
pub mod metrics;
pub mod models;
pub mod requests;
pub mod store;
pub mod transitions;

use std::sync::Arc;

use edl::EdlList;
use metrics::Metrics;
use requests::RequestStore;
use store::{KvStore, MemoryStore, RedisStore};
use transitions::TransitionEngine;

/// Shared application state passed to handlers.
pub struct AppState {
    pub requests: RequestStore,
    pub engine: TransitionEngine,
    pub edl: EdlList,
    pub metrics: Metrics,
    pub config: config::Config,
}

impl AppState {
    pub fn new(store: Arc<dyn KvStore>, config: config::Config) -> anyhow::Result<Self> {
        Ok(Self {
            requests: RequestStore::new(store.clone()),
            engine: TransitionEngine::new(store.clone()),
            edl: EdlList::new(store),
            metrics: Metrics::new()?,
            config,
        })
    }
}

/// Open the store backend selected in the config.
pub async fn connect_store(cfg: &config::Config) -> anyhow::Result<Arc<dyn KvStore>> {
    match cfg.store_backend {
        config::StoreBackend::Redis => {
            tracing::info!(host = %cfg.redis_host, "Connecting to Redis...");
            let store = RedisStore::connect(&cfg.redis_url(), cfg.store_timeout).await?;
            Ok(Arc::new(store))
        }
        config::StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on exit");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
