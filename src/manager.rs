//! Grant lifecycle orchestration for one realm client.
//!
//! [`GrantManager`] owns the realm configuration, the HTTP transport, the keyring-backed
//! signature verifier, and the not-before watermark. Every grant it hands out has passed the
//! full validation pipeline; every token it accepts has been checked for expiry, signedness,
//! type, staleness, issuer, audience, and signature, in that order.

pub mod introspect;
pub mod obtain;
pub mod refresh;
pub mod validate;

pub use introspect::*;
pub use obtain::*;
pub use refresh::*;
pub use validate::*;

// std
use std::sync::atomic::{AtomicI64, Ordering};
// self
use crate::{
	_prelude::*,
	config::RealmConfig,
	grant::Grant,
	http::RealmHttpClient,
	keyring::KeyringCache,
	oauth::{RealmClient, TransportErrorMapper},
	verify::SignatureVerifier,
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// Manager specialized for the crate's default reqwest transport stack.
pub type ReqwestGrantManager = GrantManager<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Obtains, refreshes, and validates grants for a single realm client.
pub struct GrantManager<C, M>
where
	C: ?Sized + RealmHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Validated realm/client configuration.
	pub config: RealmConfig,
	/// Shared counters for freshness checks and refreshes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	realm: Arc<RealmClient<C, M>>,
	verifier: SignatureVerifier,
	not_before: AtomicI64,
}
impl<C, M> GrantManager<C, M>
where
	C: ?Sized + RealmHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a manager that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		config: RealmConfig,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		let realm = Arc::new(RealmClient::new(&config, http_client.into(), mapper.into()));
		let keyring = KeyringCache::new(realm.clone(), config.min_key_refetch_interval);
		let verifier = SignatureVerifier::new(config.public_key.clone(), Arc::new(keyring));

		Self {
			config,
			refresh_metrics: Default::default(),
			realm,
			verifier,
			not_before: AtomicI64::new(0),
		}
	}

	/// Current not-before watermark in seconds since the epoch.
	pub fn not_before(&self) -> i64 {
		self.not_before.load(Ordering::Acquire)
	}

	/// Replaces the not-before watermark; tokens issued before it are rejected as stale.
	///
	/// This is the hook an administrative push (revocation) handler calls.
	pub fn set_not_before(&self, watermark: i64) {
		self.not_before.store(watermark, Ordering::Release);

		#[cfg(feature = "tracing")]
		tracing::info!(watermark, "Not-before watermark updated.");
	}

	/// Returns `true` when the manager may refresh `grant`.
	pub fn is_grant_refreshable(&self, grant: &Grant) -> bool {
		!self.config.bearer_only && grant.refresh_token.is_some()
	}

	/// Keyring used to resolve realm signing keys.
	pub fn keyring(&self) -> &KeyringCache {
		self.verifier.keyring()
	}

	/// Signature verifier shared by every validation.
	pub fn verifier(&self) -> &SignatureVerifier {
		&self.verifier
	}
}
#[cfg(feature = "reqwest")]
impl GrantManager<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a manager that provisions its own reqwest transport.
	///
	/// The transport applies [`RealmConfig::request_timeout`] to every request and never
	/// follows redirects.
	pub fn new(config: RealmConfig) -> Result<Self> {
		let http_client = ReqwestHttpClient::with_timeout(config.request_timeout.unsigned_abs())?;

		Ok(Self::with_http_client(config, http_client, ReqwestTransportErrorMapper))
	}
}
impl<C, M> Debug for GrantManager<C, M>
where
	C: ?Sized + RealmHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("GrantManager")
			.field("config", &self.config)
			.field("not_before", &self.not_before())
			.field("refresh_metrics", &self.refresh_metrics)
			.finish()
	}
}
