//! Key-identifier-indexed cache of realm verification keys.
//!
//! Lookups hit the in-memory map first. A miss triggers one fetch of the realm's key set,
//! but only when at least `min_interval` has passed since the last fetch; inside that window
//! an unknown `kid` resolves to [`KeyLookup::Unresolved`] without network traffic, so a flood
//! of forged key identifiers cannot hammer the authorization server. Misses that arrive while a
//! fetch is in flight wait for it and never start another one, whether it succeeded or not.

mod key;

pub use key::*;

// std
use std::{
	sync::atomic::{AtomicU64, Ordering},
	time::Instant,
};
// self
use crate::{
	_prelude::*,
	obs::{self, FlowKind, FlowOutcome},
};

/// Boxed future returned by [`KeySetSource`] implementations.
pub type KeySetFuture<'a> = Pin<Box<dyn Future<Output = Result<JwkSet>> + 'a + Send>>;

/// Supplier of the realm's published key set.
pub trait KeySetSource
where
	Self: Send + Sync,
{
	/// Fetches the current key set.
	fn fetch_key_set(&self) -> KeySetFuture<'_>;
}

/// Result of a key lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyLookup {
	/// A key with the requested identifier is known.
	Found(VerificationKey),
	/// The identifier is unknown and no refetch was allowed or it did not publish the key.
	Unresolved,
}

struct CacheState {
	keys: Arc<HashMap<String, VerificationKey>>,
	last_fetch: Option<Instant>,
}

/// Shared cache of verification keys keyed by `kid`.
pub struct KeyringCache {
	source: Arc<dyn KeySetSource>,
	min_interval: std::time::Duration,
	state: RwLock<CacheState>,
	fetch_gate: AsyncMutex<()>,
	attempts: AtomicU64,
	fetches: AtomicU64,
}
impl KeyringCache {
	/// Creates an empty cache backed by `source`; negative intervals count as zero.
	pub fn new(source: Arc<dyn KeySetSource>, min_interval: Duration) -> Self {
		let min_interval = if min_interval.is_negative() {
			std::time::Duration::ZERO
		} else {
			min_interval.unsigned_abs()
		};

		Self {
			source,
			min_interval,
			state: RwLock::new(CacheState { keys: Default::default(), last_fetch: None }),
			fetch_gate: AsyncMutex::new(()),
			attempts: AtomicU64::new(0),
			fetches: AtomicU64::new(0),
		}
	}

	/// Resolves the key for `kid`, refetching the key set when the throttle allows it.
	///
	/// Concurrent misses share one fetch: later callers wait for it, re-check the map, and
	/// report [`KeyLookup::Unresolved`] when the key is still absent instead of fetching again.
	pub async fn get_key(&self, kid: &str) -> Result<KeyLookup> {
		if let Some(key) = self.cached(kid) {
			return Ok(KeyLookup::Found(key));
		}

		let seen_attempts = self.attempts.load(Ordering::Acquire);
		let _gate = self.fetch_gate.lock().await;

		if let Some(key) = self.cached(kid) {
			return Ok(KeyLookup::Found(key));
		}
		if self.attempts.load(Ordering::Acquire) != seen_attempts {
			#[cfg(feature = "tracing")]
			tracing::debug!(kid, "Concurrent key-set fetch did not publish the kid.");

			return Ok(KeyLookup::Unresolved);
		}
		if !self.fetch_window_open() {
			#[cfg(feature = "tracing")]
			tracing::debug!(kid, "Key-set refetch throttled; unknown kid left unresolved.");
			obs::record_flow_outcome(FlowKind::KeyFetch, FlowOutcome::Throttled);

			return Ok(KeyLookup::Unresolved);
		}

		let fetched =
			obs::observe_flow(FlowKind::KeyFetch, "get_key", self.source.fetch_key_set()).await;

		self.attempts.fetch_add(1, Ordering::Release);

		let keys = index_key_set(fetched?);

		#[cfg(feature = "tracing")]
		tracing::debug!(count = keys.len(), "Realm key set replaced.");

		{
			let mut state = self.state.write();

			state.keys = Arc::new(keys);
			state.last_fetch = Some(Instant::now());
		}

		self.fetches.fetch_add(1, Ordering::Relaxed);

		Ok(self.cached(kid).map_or(KeyLookup::Unresolved, KeyLookup::Found))
	}

	/// Empties the cache and forgets the last fetch instant.
	pub fn clear(&self) {
		let mut state = self.state.write();

		state.keys = Default::default();
		state.last_fetch = None;
	}

	/// Number of successful key-set fetches performed so far.
	pub fn fetch_count(&self) -> u64 {
		self.fetches.load(Ordering::Relaxed)
	}

	/// Number of keys currently cached.
	pub fn len(&self) -> usize {
		self.state.read().keys.len()
	}

	/// Returns `true` when no key is cached.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn cached(&self, kid: &str) -> Option<VerificationKey> {
		let keys = self.state.read().keys.clone();

		keys.get(kid).cloned()
	}

	fn fetch_window_open(&self) -> bool {
		self.state
			.read()
			.last_fetch
			.is_none_or(|last| last.elapsed() > self.min_interval)
	}
}
impl Debug for KeyringCache {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let state = self.state.read();

		f.debug_struct("KeyringCache")
			.field("min_interval", &self.min_interval)
			.field("keys", &state.keys.keys().collect::<Vec<_>>())
			.field("last_fetch", &state.last_fetch)
			.field("fetches", &self.fetch_count())
			.finish()
	}
}

fn index_key_set(set: JwkSet) -> HashMap<String, VerificationKey> {
	set.keys
		.iter()
		.filter_map(|jwk| {
			let kid = jwk.kid.clone()?;

			match VerificationKey::from_jwk(jwk) {
				Ok(key) => Some((kid, key)),
				Err(_e) => {
					#[cfg(feature = "tracing")]
					tracing::debug!(kid = %kid, error = %_e, "Skipping unusable published key.");

					None
				},
			}
		})
		.collect()
}
