//! Prometheus metrics for the approval workflow.
//!
//! Metrics live in a registry owned by the recorder rather than the global
//! default registry, so several app instances can coexist in one process.

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

pub struct Metrics {
    registry: Registry,
    transitions_total: IntCounterVec,
    edl_duplicates_total: IntCounter,
    pending_requests: IntGauge,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let transitions_total = IntCounterVec::new(
            Opts::new(
                "edl_admin_transitions_total",
                "Accept/reject attempts by outcome",
            ),
            &["action", "outcome"],
        )?;
        let edl_duplicates_total = IntCounter::new(
            "edl_admin_edl_duplicates_total",
            "Accepted URLs that were already in the EDL set",
        )?;
        let pending_requests = IntGauge::new(
            "edl_admin_pending_requests",
            "Pending requests seen by the last listing",
        )?;

        registry.register(Box::new(transitions_total.clone()))?;
        registry.register(Box::new(edl_duplicates_total.clone()))?;
        registry.register(Box::new(pending_requests.clone()))?;

        Ok(Self {
            registry,
            transitions_total,
            edl_duplicates_total,
            pending_requests,
        })
    }

    /// `outcome` is "ok" or an `EdlError::kind()` label.
    pub fn record_transition(&self, action: &str, outcome: &str) {
        self.transitions_total
            .with_label_values(&[action, outcome])
            .inc();
    }

    pub fn record_duplicate(&self) {
        self.edl_duplicates_total.inc();
    }

    pub fn set_pending(&self, count: usize) {
        self.pending_requests.set(count as i64);
    }

    /// Prometheus text exposition of every metric in this registry.
    pub fn encode(&self) -> String {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .unwrap_or_default();
        String::from_utf8(buffer).unwrap_or_default()
    }
}
