//! Crate-level error types shared by the codec, keyring, verifier, and manager.

// self
use crate::{_prelude::*, config::RealmConfigError, http::Endpoint, token::Token};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
///
/// Access-control layers are expected to branch on the variant: only a successful
/// validation means the claims may be trusted.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Non-2xx status or network failure while talking to the authorization server.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Response body was not valid JSON or lacked expected fields.
	#[error(transparent)]
	MalformedResponse(#[from] MalformedResponseError),
	/// A token failed one of the validation checks.
	#[error(transparent)]
	TokenValidation(#[from] TokenValidationError),
	/// A grant could not be refreshed.
	#[error(transparent)]
	RefreshUnavailable(#[from] RefreshUnavailableError),
	/// No verification key could be resolved for the token's key identifier.
	#[error("Failed to resolve a verification key for kid {}.", kid.as_deref().unwrap_or("<none>"))]
	KeyResolution {
		/// Key identifier carried by the token header, if any.
		kid: Option<String>,
	},
	/// First failure observed while validating the tokens of a grant.
	#[error("Grant validation failed: {source}")]
	GrantValidation {
		/// Underlying token-level failure.
		#[source]
		source: Box<Error>,
	},
}
impl Error {
	/// Wraps a token-level failure with the grant validation context.
	pub fn grant_validation(source: Error) -> Self {
		Self::GrantValidation { source: Box::new(source) }
	}

	/// Returns the token validation kind, looking through the grant validation wrapper.
	pub fn validation_kind(&self) -> Option<TokenValidationKind> {
		match self {
			Self::TokenValidation(err) => Some(err.kind),
			Self::GrantValidation { source } => source.validation_kind(),
			_ => None,
		}
	}
}

impl From<RealmConfigError> for Error {
	fn from(e: RealmConfigError) -> Self {
		ConfigError::from(e).into()
	}
}

/// Configuration and request-construction failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Realm configuration failed validation.
	#[error(transparent)]
	Realm(#[from] RealmConfigError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures converting published or configured key material into a verification key.
#[derive(Debug, ThisError)]
pub enum KeyMaterialError {
	/// Only RSA keys are usable for RS256 verification.
	#[error("Unsupported key type `{kty}`.")]
	UnsupportedKeyType {
		/// Declared `kty` value.
		kty: String,
	},
	/// A required JWK member is absent.
	#[error("JWK is missing the `{member}` member.")]
	MissingMember {
		/// Absent member name.
		member: &'static str,
	},
	/// A JWK member was not valid base64url.
	#[error("JWK member `{member}` is not valid base64url.")]
	Encoding {
		/// Offending member name.
		member: &'static str,
		/// Decoder failure.
		#[source]
		source: base64::DecodeError,
	},
	/// The static realm public key is neither PEM nor base64 DER.
	#[error("Realm public key is not valid base64.")]
	PublicKeyEncoding(#[source] base64::DecodeError),
	/// The public key structure could not be decoded.
	#[error("Public key could not be decoded: {message}.")]
	PublicKeyDecode {
		/// Decoder message.
		message: String,
	},
	/// The RSA parameters were rejected.
	#[error("RSA key parameters are invalid.")]
	Rsa(#[from] rsa::Error),
}

/// Transport-level failures (network, IO, HTTP status).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the {endpoint} endpoint.")]
	Network {
		/// Endpoint being called.
		endpoint: Endpoint,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the {endpoint} endpoint.")]
	Io {
		/// Endpoint being called.
		endpoint: Endpoint,
		/// IO failure.
		#[source]
		source: std::io::Error,
	},
	/// The request exceeded the configured timeout.
	#[error("Request to the {endpoint} endpoint timed out.")]
	Timeout {
		/// Endpoint being called.
		endpoint: Endpoint,
	},
	/// The authorization server answered with a non-2xx status.
	#[error("The {endpoint} endpoint returned HTTP {status}{}.", reason.as_deref().map(|r| format!(": {r}")).unwrap_or_default())]
	Status {
		/// Endpoint being called.
		endpoint: Endpoint,
		/// HTTP status code.
		status: u16,
		/// OAuth `error`/`error_description` or canonical reason, when available.
		reason: Option<String>,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(endpoint: Endpoint, src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { endpoint, source: Box::new(src) }
	}

	/// Returns the HTTP status code, if the failure carried one.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Status { status, .. } => Some(*status),
			_ => None,
		}
	}
}

/// The authorization server answered, but not with the expected document.
#[derive(Debug, ThisError)]
pub enum MalformedResponseError {
	/// The body was not valid JSON for the expected shape.
	#[error("The {endpoint} endpoint returned malformed JSON.")]
	Json {
		/// Endpoint being called.
		endpoint: Endpoint,
		/// Structured parsing failure with the offending path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// A required field was absent.
	#[error("The {endpoint} endpoint response is missing `{field}`.")]
	MissingField {
		/// Endpoint being called.
		endpoint: Endpoint,
		/// Missing field name.
		field: &'static str,
	},
	/// A successful status carried an OAuth error document.
	#[error("The {endpoint} endpoint returned an error: {error}.")]
	ErrorPayload {
		/// Endpoint being called.
		endpoint: Endpoint,
		/// OAuth `error` code.
		error: String,
		/// OAuth `error_description`, when supplied.
		description: Option<String>,
	},
}

/// Terminal failure states of the token validation pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenValidationKind {
	/// No token was supplied.
	Missing,
	/// The `exp` claim is in the past.
	Expired,
	/// The token carries no signed span (it did not parse).
	Unsigned,
	/// The `typ` claim does not match the expected token type.
	WrongType,
	/// The `iat` claim predates the manager's not-before watermark.
	FutureDated,
	/// The `iss` claim is not the realm URL.
	WrongIssuer,
	/// The audience or authorized party does not name this client.
	WrongAudience,
	/// The signature does not verify against the resolved key.
	BadSignature,
}
impl TokenValidationKind {
	/// Returns a stable label suitable for logs and metrics.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Missing => "missing",
			Self::Expired => "expired",
			Self::Unsigned => "not signed",
			Self::WrongType => "wrong type",
			Self::FutureDated => "stale token",
			Self::WrongIssuer => "wrong ISS",
			Self::WrongAudience => "wrong audience",
			Self::BadSignature => "signature invalid",
		}
	}
}
impl Display for TokenValidationKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// A token failed validation; carries the offending token when one was supplied.
#[derive(Debug, ThisError)]
#[error("Invalid token ({kind}).")]
pub struct TokenValidationError {
	/// Which check failed.
	pub kind: TokenValidationKind,
	/// The token that failed, absent for [`TokenValidationKind::Missing`].
	pub token: Option<Box<Token>>,
}
impl TokenValidationError {
	/// Builds an error attached to `token`.
	pub fn new(kind: TokenValidationKind, token: &Token) -> Self {
		Self { kind, token: Some(Box::new(token.clone())) }
	}

	/// Builds the error for an absent token.
	pub fn missing() -> Self {
		Self { kind: TokenValidationKind::Missing, token: None }
	}
}

/// Reasons a grant cannot be refreshed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ThisError)]
pub enum RefreshUnavailableError {
	/// The grant holds no refresh token.
	#[error("Unable to refresh without a refresh token.")]
	MissingRefreshToken,
	/// The refresh token itself has expired.
	#[error("Unable to refresh with an expired refresh token.")]
	RefreshTokenExpired,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn grant_validation_wraps_and_exposes_kind() {
		let token = Token::parse("not-a-token");
		let inner = Error::from(TokenValidationError::new(TokenValidationKind::Expired, &token));
		let wrapped = Error::grant_validation(inner);

		assert!(wrapped.to_string().starts_with("Grant validation failed: "));
		assert!(wrapped.to_string().contains("expired"));
		assert_eq!(wrapped.validation_kind(), Some(TokenValidationKind::Expired));

		let source = StdError::source(&wrapped).expect("Wrapper should expose its source.");

		assert_eq!(source.to_string(), "Invalid token (expired).");
	}

	#[test]
	fn status_error_formats_optional_reason() {
		let with_reason = TransportError::Status {
			endpoint: Endpoint::Token,
			status: 401,
			reason: Some("invalid_client".into()),
		};
		let bare = TransportError::Status { endpoint: Endpoint::UserInfo, status: 500, reason: None };

		assert_eq!(with_reason.to_string(), "The token endpoint returned HTTP 401: invalid_client.");
		assert_eq!(bare.to_string(), "The userinfo endpoint returned HTTP 500.");
		assert_eq!(with_reason.status(), Some(401));
	}

	#[test]
	fn refresh_errors_are_distinguishable() {
		assert_ne!(
			RefreshUnavailableError::MissingRefreshToken,
			RefreshUnavailableError::RefreshTokenExpired
		);
		assert!(
			RefreshUnavailableError::RefreshTokenExpired.to_string().contains("expired refresh token")
		);
	}
}
