use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

use crate::statemachine::TransitionError;

/// Lifecycle counters, process-wide
#[derive(Debug, Default)]
pub struct LifecycleMetrics {
    pub meldingen_created: AtomicU64,
    pub transitions_applied: AtomicU64,
    pub unknown_transition: AtomicU64,
    pub transition_not_allowed: AtomicU64,
    pub token_rejected: AtomicU64,
    pub guard_failed: AtomicU64,
    pub assets_rejected: AtomicU64,
    pub conflicts: AtomicU64,
}

impl LifecycleMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_created(&self) {
        self.meldingen_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_transition(&self) {
        self.transitions_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejection(&self, error: &TransitionError) {
        let counter = match error {
            TransitionError::UnknownTransition { .. } => &self.unknown_transition,
            TransitionError::TransitionNotAllowed { .. } => &self.transition_not_allowed,
            TransitionError::TokenInvalidated | TransitionError::TokenExpired => &self.token_rejected,
            TransitionError::GuardFailed { .. } => &self.guard_failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_asset_rejected(&self) {
        self.assets_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_conflict(&self) {
        self.conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> LifecycleStats {
        LifecycleStats {
            meldingen_created: self.meldingen_created.load(Ordering::Relaxed),
            transitions_applied: self.transitions_applied.load(Ordering::Relaxed),
            unknown_transition: self.unknown_transition.load(Ordering::Relaxed),
            transition_not_allowed: self.transition_not_allowed.load(Ordering::Relaxed),
            token_rejected: self.token_rejected.load(Ordering::Relaxed),
            guard_failed: self.guard_failed.load(Ordering::Relaxed),
            assets_rejected: self.assets_rejected.load(Ordering::Relaxed),
            conflicts: self.conflicts.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            created = stats.meldingen_created,
            transitions = stats.transitions_applied,
            unknown_transition = stats.unknown_transition,
            not_allowed = stats.transition_not_allowed,
            token_rejected = stats.token_rejected,
            guard_failed = stats.guard_failed,
            assets_rejected = stats.assets_rejected,
            conflicts = stats.conflicts,
            "Lifecycle metrics"
        );
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct LifecycleStats {
    pub meldingen_created: u64,
    pub transitions_applied: u64,
    pub unknown_transition: u64,
    pub transition_not_allowed: u64,
    pub token_rejected: u64,
    pub guard_failed: u64,
    pub assets_rejected: u64,
    pub conflicts: u64,
}

/// Global metrics instance
static LIFECYCLE_METRICS: std::sync::LazyLock<LifecycleMetrics> =
    std::sync::LazyLock::new(LifecycleMetrics::new);

pub fn lifecycle_metrics() -> &'static LifecycleMetrics {
    &LIFECYCLE_METRICS
}

/// Time an operation and log its duration
pub struct OperationTimer {
    operation: String,
    start: Instant,
}

impl OperationTimer {
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            start: Instant::now(),
        }
    }

    pub fn finish(self) {
        let duration = self.start.elapsed();
        info!(
            operation = %self.operation,
            duration_ms = duration.as_millis() as u64,
            "Operation completed"
        );
    }
}
