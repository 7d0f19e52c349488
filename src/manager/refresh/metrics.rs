// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for grant freshness checks.
#[derive(Debug, Default)]
pub struct RefreshMetrics {
	checks: AtomicU64,
	reused: AtomicU64,
	refreshed: AtomicU64,
	failures: AtomicU64,
}
impl RefreshMetrics {
	/// Returns the total number of freshness checks.
	pub fn checks(&self) -> u64 {
		self.checks.load(Ordering::Relaxed)
	}

	/// Returns how many checks found the grant still fresh.
	pub fn reused(&self) -> u64 {
		self.reused.load(Ordering::Relaxed)
	}

	/// Returns how many checks refreshed the grant against the token endpoint.
	pub fn refreshed(&self) -> u64 {
		self.refreshed.load(Ordering::Relaxed)
	}

	/// Returns how many checks failed.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_check(&self) {
		self.checks.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_reuse(&self) {
		self.reused.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh(&self) {
		self.refreshed.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}
}
