// self
use crate::{
	_prelude::*,
	config::{
		DEFAULT_MIN_KEY_REFETCH_INTERVAL, DEFAULT_REQUEST_TIMEOUT, RealmConfig, RealmEndpoints,
	},
	error::KeyMaterialError,
	keyring::VerificationKey,
};

/// Errors raised while constructing or validating realm configurations.
#[derive(Debug, ThisError)]
pub enum RealmConfigError {
	/// The client identifier is mandatory.
	#[error("Client identifier must not be empty.")]
	EmptyClientId,
	/// The realm name is mandatory when joining it onto a server URL.
	#[error("Realm name must not be empty.")]
	EmptyRealm,
	/// A URL could not be parsed.
	#[error("Realm URL is invalid.")]
	InvalidUrl {
		/// Parser failure.
		#[source]
		source: url::ParseError,
	},
	/// The realm URL cannot serve as an endpoint base.
	#[error("Realm URL {url} is unusable: {reason}.")]
	UnusableRealmUrl {
		/// Offending URL.
		url: String,
		/// Why the URL was rejected.
		reason: &'static str,
	},
	/// Confidential clients must authenticate with a secret.
	#[error("Confidential clients require a client secret.")]
	MissingClientSecret,
	/// Intervals must not be negative.
	#[error("The `{field}` interval must not be negative.")]
	NegativeInterval {
		/// Offending field name.
		field: &'static str,
	},
	/// The request timeout must be positive.
	#[error("The request timeout must be positive.")]
	NonPositiveTimeout,
	/// The static realm public key could not be decoded.
	#[error("Realm public key is invalid.")]
	PublicKey(#[from] KeyMaterialError),
}

/// Builder for [`RealmConfig`] values.
#[derive(Debug, Deserialize)]
pub struct RealmConfigBuilder {
	/// Realm base URL, `{auth_server_url}/realms/{realm}`.
	pub realm_url: Url,
	/// Client identifier registered with the realm.
	#[serde(alias = "resource")]
	pub client_id: String,
	/// Secret for confidential clients.
	#[serde(default)]
	pub client_secret: Option<String>,
	/// Marks the client as public.
	#[serde(default, alias = "public-client")]
	pub public_client: bool,
	/// Marks the client as a bearer-only service.
	#[serde(default, alias = "bearer-only")]
	pub bearer_only: bool,
	/// Static realm key, PEM or bare base64 DER.
	#[serde(default, alias = "realm-public-key")]
	pub realm_public_key: Option<String>,
	/// Minimum interval between two key-set fetches.
	#[serde(
		default = "default_min_key_refetch_interval",
		deserialize_with = "seconds::deserialize",
		alias = "min-time-between-jwks-requests"
	)]
	pub min_key_refetch_interval: Duration,
	/// Require access tokens to list the client in `aud`.
	#[serde(default, alias = "verify-token-audience")]
	pub verify_token_audience: bool,
	/// Timeout applied to each outbound request.
	#[serde(default = "default_request_timeout", deserialize_with = "seconds::deserialize")]
	pub request_timeout: Duration,
}
impl RealmConfigBuilder {
	/// Creates a new builder seeded with the realm URL and client identifier.
	pub fn new(realm_url: Url, client_id: impl Into<String>) -> Self {
		Self {
			realm_url,
			client_id: client_id.into(),
			client_secret: None,
			public_client: false,
			bearer_only: false,
			realm_public_key: None,
			min_key_refetch_interval: DEFAULT_MIN_KEY_REFETCH_INTERVAL,
			verify_token_audience: false,
			request_timeout: DEFAULT_REQUEST_TIMEOUT,
		}
	}

	/// Sets the client secret used by confidential clients.
	pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
		self.client_secret = Some(secret.into());

		self
	}

	/// Marks the client as public.
	pub fn public_client(mut self, public: bool) -> Self {
		self.public_client = public;

		self
	}

	/// Marks the client as bearer-only.
	pub fn bearer_only(mut self, bearer_only: bool) -> Self {
		self.bearer_only = bearer_only;

		self
	}

	/// Pins a static realm public key (PEM or bare base64 DER).
	pub fn realm_public_key(mut self, key: impl Into<String>) -> Self {
		self.realm_public_key = Some(key.into());

		self
	}

	/// Overrides the minimum interval between key-set fetches.
	pub fn min_key_refetch_interval(mut self, interval: Duration) -> Self {
		self.min_key_refetch_interval = interval;

		self
	}

	/// Enables the access-token audience check.
	pub fn verify_token_audience(mut self, verify: bool) -> Self {
		self.verify_token_audience = verify;

		self
	}

	/// Overrides the per-request timeout.
	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = timeout;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<RealmConfig, RealmConfigError> {
		if self.client_id.trim().is_empty() {
			return Err(RealmConfigError::EmptyClientId);
		}

		validate_realm_url(&self.realm_url)?;

		let client_secret = self.client_secret.filter(|secret| !secret.is_empty());

		if !self.public_client && !self.bearer_only && client_secret.is_none() {
			return Err(RealmConfigError::MissingClientSecret);
		}
		if self.min_key_refetch_interval.is_negative() {
			return Err(RealmConfigError::NegativeInterval { field: "min_key_refetch_interval" });
		}
		if !self.request_timeout.is_positive() {
			return Err(RealmConfigError::NonPositiveTimeout);
		}

		let public_key =
			self.realm_public_key.as_deref().map(VerificationKey::from_public_key).transpose()?;
		let endpoints = RealmEndpoints::from_realm_url(&self.realm_url)?;
		let issuer = self.realm_url.as_str().trim_end_matches('/').to_owned();

		Ok(RealmConfig {
			realm_url: self.realm_url,
			client_id: self.client_id,
			public_client: self.public_client,
			bearer_only: self.bearer_only,
			public_key,
			min_key_refetch_interval: self.min_key_refetch_interval,
			verify_token_audience: self.verify_token_audience,
			request_timeout: self.request_timeout,
			endpoints,
			client_secret,
			issuer,
		})
	}
}
impl TryFrom<RealmConfigBuilder> for RealmConfig {
	type Error = RealmConfigError;

	fn try_from(builder: RealmConfigBuilder) -> Result<Self, Self::Error> {
		builder.build()
	}
}

fn validate_realm_url(url: &Url) -> Result<(), RealmConfigError> {
	let reject = |reason| {
		Err(RealmConfigError::UnusableRealmUrl { url: url.as_str().to_owned(), reason })
	};

	if !matches!(url.scheme(), "http" | "https") {
		return reject("scheme must be http or https");
	}
	if url.cannot_be_a_base() || url.host().is_none() {
		return reject("URL has no host");
	}
	if url.query().is_some() || url.fragment().is_some() {
		return reject("query and fragment are not allowed");
	}

	Ok(())
}

fn default_min_key_refetch_interval() -> Duration {
	DEFAULT_MIN_KEY_REFETCH_INTERVAL
}

fn default_request_timeout() -> Duration {
	DEFAULT_REQUEST_TIMEOUT
}

mod seconds {
	// crates.io
	use serde::Deserializer;
	// self
	use crate::_prelude::*;

	pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
	where
		D: Deserializer<'de>,
	{
		i64::deserialize(deserializer).map(Duration::seconds)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn builder() -> RealmConfigBuilder {
		RealmConfigBuilder::new(
			Url::parse("https://sso.example.com/realms/demo").expect("URL fixture should parse."),
			"app",
		)
	}

	#[test]
	fn confidential_client_requires_secret() {
		let err = builder().build().expect_err("Missing secret should be rejected.");

		assert!(matches!(err, RealmConfigError::MissingClientSecret));
		assert!(builder().client_secret("s3cr3t").build().is_ok());
		assert!(builder().public_client(true).build().is_ok());
		assert!(builder().bearer_only(true).build().is_ok());
	}

	#[test]
	fn empty_secret_counts_as_missing() {
		let err = builder().client_secret("").build().expect_err("Empty secret should fail.");

		assert!(matches!(err, RealmConfigError::MissingClientSecret));
	}

	#[test]
	fn rejects_blank_client_id() {
		let mut builder = builder().public_client(true);

		builder.client_id = "  ".into();

		assert!(matches!(builder.build(), Err(RealmConfigError::EmptyClientId)));
	}

	#[test]
	fn rejects_unusable_realm_urls() {
		for raw in [
			"ftp://sso.example.com/realms/demo",
			"https://sso.example.com/realms/demo?x=1",
			"https://sso.example.com/realms/demo#frag",
			"mailto:admin@example.com",
		] {
			let url = Url::parse(raw).expect("URL fixture should parse.");
			let result = RealmConfigBuilder::new(url, "app").public_client(true).build();

			assert!(
				matches!(result, Err(RealmConfigError::UnusableRealmUrl { .. })),
				"{raw} should be rejected."
			);
		}
	}

	#[test]
	fn plain_http_is_allowed_for_local_realms() {
		let url = Url::parse("http://127.0.0.1:8080/realms/dev").expect("URL should parse.");

		assert!(RealmConfigBuilder::new(url, "app").public_client(true).build().is_ok());
	}

	#[test]
	fn rejects_invalid_durations() {
		let negative =
			builder().public_client(true).min_key_refetch_interval(Duration::seconds(-1)).build();
		let zero_timeout = builder().public_client(true).request_timeout(Duration::ZERO).build();

		assert!(matches!(negative, Err(RealmConfigError::NegativeInterval { .. })));
		assert!(matches!(zero_timeout, Err(RealmConfigError::NonPositiveTimeout)));
		assert!(
			builder().public_client(true).min_key_refetch_interval(Duration::ZERO).build().is_ok()
		);
	}

	#[test]
	fn rejects_garbage_public_key() {
		let result = builder().public_client(true).realm_public_key("not a key!").build();

		assert!(matches!(result, Err(RealmConfigError::PublicKey(_))));
	}

	#[test]
	fn accepts_adapter_style_field_names() {
		let builder: RealmConfigBuilder = serde_json::from_value(serde_json::json!({
			"realm_url": "https://sso.example.com/realms/demo",
			"resource": "app",
			"public-client": true,
			"bearer-only": true,
			"min-time-between-jwks-requests": 30,
			"verify-token-audience": true,
		}))
		.expect("Adapter-style JSON should deserialize.");

		assert_eq!(builder.client_id, "app");
		assert!(builder.public_client);
		assert!(builder.bearer_only);
		assert!(builder.verify_token_audience);
		assert_eq!(builder.min_key_refetch_interval, Duration::seconds(30));
		assert_eq!(builder.request_timeout, DEFAULT_REQUEST_TIMEOUT);
	}
}
