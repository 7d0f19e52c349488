//! Realm and client configuration consumed by the grant manager.
//!
//! A [`RealmConfig`] is always produced by [`RealmConfigBuilder::build`], either directly or through
//! serde (`RealmConfig` deserializes via the builder), so every instance has passed validation
//! and carries its derived [`RealmEndpoints`].

/// Builder API for assembling realm configurations.
pub mod builder;

pub use builder::*;

// self
use crate::{_prelude::*, keyring::VerificationKey};

/// Default minimum interval between two key-set fetches.
pub const DEFAULT_MIN_KEY_REFETCH_INTERVAL: Duration = Duration::seconds(10);
/// Default timeout attached to every outbound request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::seconds(10);

const OPENID_CONNECT_PATH: &str = "protocol/openid-connect";

/// Endpoint set derived from the realm URL.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealmEndpoints {
	/// Token endpoint used by every grant exchange.
	pub token: Url,
	/// Token introspection endpoint.
	pub introspection: Url,
	/// User info endpoint.
	pub userinfo: Url,
	/// Key-publication (JWKS) endpoint.
	pub certs: Url,
}
impl RealmEndpoints {
	/// Derives the OpenID Connect endpoints below `realm_url`.
	pub fn from_realm_url(realm_url: &Url) -> Result<Self, RealmConfigError> {
		let base = format!("{}/{OPENID_CONNECT_PATH}", realm_url.as_str().trim_end_matches('/'));
		let endpoint = |suffix: &str| {
			Url::parse(&format!("{base}/{suffix}"))
				.map_err(|source| RealmConfigError::InvalidUrl { source })
		};

		Ok(Self {
			token: endpoint("token")?,
			introspection: endpoint("token/introspect")?,
			userinfo: endpoint("userinfo")?,
			certs: endpoint("certs")?,
		})
	}
}

/// Validated realm/client configuration.
#[derive(Clone, Deserialize)]
#[serde(try_from = "RealmConfigBuilder")]
pub struct RealmConfig {
	/// Realm base URL, `{auth_server_url}/realms/{realm}`.
	pub realm_url: Url,
	/// Client identifier registered with the realm.
	pub client_id: String,
	/// Public clients authenticate with `client_id` only.
	pub public_client: bool,
	/// Bearer-only services validate access tokens but never refresh grants.
	pub bearer_only: bool,
	/// Static realm key; when present the keyring is never consulted.
	pub public_key: Option<VerificationKey>,
	/// Minimum interval between two key-set fetches.
	pub min_key_refetch_interval: Duration,
	/// Require access tokens to list the client in `aud`.
	pub verify_token_audience: bool,
	/// Timeout applied to each outbound request.
	pub request_timeout: Duration,
	/// Endpoints derived from [`realm_url`](Self::realm_url).
	pub endpoints: RealmEndpoints,
	client_secret: Option<String>,
	issuer: String,
}
impl RealmConfig {
	/// Creates a new builder for the provided realm URL and client identifier.
	pub fn builder(realm_url: Url, client_id: impl Into<String>) -> RealmConfigBuilder {
		RealmConfigBuilder::new(realm_url, client_id)
	}

	/// Joins a server base URL and realm name into `{auth_server_url}/realms/{realm}`.
	pub fn realm_url_for(auth_server_url: &Url, realm: &str) -> Result<Url, RealmConfigError> {
		if realm.is_empty() {
			return Err(RealmConfigError::EmptyRealm);
		}

		let mut url = auth_server_url.clone();

		url.path_segments_mut()
			.map_err(|_| RealmConfigError::UnusableRealmUrl {
				url: auth_server_url.as_str().to_owned(),
				reason: "URL cannot be a base",
			})?
			.pop_if_empty()
			.push("realms")
			.push(realm);

		Ok(url)
	}

	/// Client secret used for HTTP Basic authentication, absent for public clients.
	pub fn client_secret(&self) -> Option<&str> {
		if self.public_client { None } else { self.client_secret.as_deref() }
	}

	/// Expected `iss` claim: the realm URL without a trailing slash.
	pub fn issuer(&self) -> &str {
		&self.issuer
	}
}
impl Debug for RealmConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RealmConfig")
			.field("realm_url", &self.realm_url.as_str())
			.field("client_id", &self.client_id)
			.field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
			.field("public_client", &self.public_client)
			.field("bearer_only", &self.bearer_only)
			.field("public_key", &self.public_key.is_some())
			.field("min_key_refetch_interval", &self.min_key_refetch_interval)
			.field("verify_token_audience", &self.verify_token_audience)
			.field("request_timeout", &self.request_timeout)
			.finish()
	}
}
