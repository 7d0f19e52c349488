//! Request building and response decoding for the realm's OpenID Connect endpoints.

pub use oauth2;

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use oauth2::{
	AsyncHttpClient, HttpClientError, HttpRequest,
	http::{Method, Request, header},
};
use serde::de::DeserializeOwned;
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	config::{RealmConfig, RealmEndpoints},
	error::{ConfigError, MalformedResponseError, TransportError},
	grant::TokenPayload,
	http::{Endpoint, RealmHttpClient},
	keyring::{JwkSet, KeySetFuture, KeySetSource},
};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Maps HTTP transport failures into crate [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a crate error.
	fn map_transport_error(&self, endpoint: Endpoint, error: HttpClientError<E>) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(&self, endpoint: Endpoint, err: HttpClientError<ReqwestError>) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(endpoint, *inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io { endpoint, source: inner }.into(),
			HttpClientError::Other(message) =>
				TransportError::network(endpoint, std::io::Error::other(message)).into(),
			_ => TransportError::network(
				endpoint,
				std::io::Error::other("unrecognized HTTP client failure"),
			)
			.into(),
		}
	}
}

/// Grant types sent to the token endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
	/// Resource-owner password grant.
	Password,
	/// Authorization Code grant.
	AuthorizationCode,
	/// Client Credentials grant.
	ClientCredentials,
	/// Refresh Token grant.
	RefreshToken,
}
impl GrantType {
	/// Returns the RFC 6749 identifier for the grant type.
	pub const fn as_str(self) -> &'static str {
		match self {
			GrantType::Password => "password",
			GrantType::AuthorizationCode => "authorization_code",
			GrantType::ClientCredentials => "client_credentials",
			GrantType::RefreshToken => "refresh_token",
		}
	}
}
impl Display for GrantType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Claims returned by the user info endpoint.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
	/// Subject identifier.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub sub: Option<String>,
	/// Preferred username.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub preferred_username: Option<String>,
	/// E-mail address.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	/// Remaining claims.
	#[serde(flatten)]
	pub claims: serde_json::Map<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct IntrospectionResponse {
	active: bool,
}

#[derive(Deserialize)]
struct OAuthErrorBody {
	error: String,
	#[serde(default)]
	error_description: Option<String>,
}

/// Client for one realm: endpoints, client credentials, and the shared transport.
pub(crate) struct RealmClient<C, M>
where
	C: ?Sized + RealmHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	endpoints: RealmEndpoints,
	client_id: String,
	client_secret: Option<String>,
	http_client: Arc<C>,
	error_mapper: Arc<M>,
}
impl<C, M> RealmClient<C, M>
where
	C: ?Sized + RealmHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(crate) fn new(config: &RealmConfig, http_client: Arc<C>, error_mapper: Arc<M>) -> Self {
		Self {
			endpoints: config.endpoints.clone(),
			client_id: config.client_id.clone(),
			client_secret: config.client_secret().map(ToOwned::to_owned),
			http_client,
			error_mapper,
		}
	}

	/// POSTs a grant to the token endpoint, returning the decoded payload and the raw body.
	pub(crate) async fn exchange(
		&self,
		grant: GrantType,
		params: &[(&str, &str)],
	) -> Result<(TokenPayload, String)> {
		let mut form = Vec::with_capacity(params.len() + 1);

		form.push(("grant_type", grant.as_str()));
		form.extend_from_slice(params);

		let request = self.form_request(&self.endpoints.token, &form)?;
		let body = self.dispatch(Endpoint::Token, request).await?;
		let payload = decode_json::<TokenPayload>(Endpoint::Token, &body)?;

		if payload.access_token.is_none() {
			return Err(MalformedResponseError::MissingField {
				endpoint: Endpoint::Token,
				field: "access_token",
			}
			.into());
		}

		Ok((payload, String::from_utf8_lossy(&body).into_owned()))
	}

	/// Asks the introspection endpoint whether `token` is active.
	pub(crate) async fn introspect(&self, token: &str) -> Result<bool> {
		let request = self.form_request(&self.endpoints.introspection, &[("token", token)])?;
		let body = self.dispatch(Endpoint::Introspection, request).await?;

		Ok(decode_json::<IntrospectionResponse>(Endpoint::Introspection, &body)?.active)
	}

	/// Fetches the user info document with `token` as bearer credential.
	pub(crate) async fn user_info(&self, token: &str) -> Result<UserInfo> {
		let request = get_request(&self.endpoints.userinfo, Some(token))?;
		let body = self.dispatch(Endpoint::UserInfo, request).await?;
		let info = decode_json::<UserInfo>(Endpoint::UserInfo, &body)?;

		if let Some(error) = info.claims.get("error") {
			let description = info.claims.get("error_description").map(render_claim);

			return Err(MalformedResponseError::ErrorPayload {
				endpoint: Endpoint::UserInfo,
				error: render_claim(error),
				description,
			}
			.into());
		}

		Ok(info)
	}

	/// Downloads the realm's published key set.
	pub(crate) async fn key_set(&self) -> Result<JwkSet> {
		let request = get_request(&self.endpoints.certs, None)?;
		let body = self.dispatch(Endpoint::Certs, request).await?;

		decode_json(Endpoint::Certs, &body)
	}

	fn form_request(&self, url: &Url, params: &[(&str, &str)]) -> Result<HttpRequest> {
		let mut form = form_urlencoded::Serializer::new(String::new());
		let mut builder = Request::builder()
			.method(Method::POST)
			.uri(url.as_str())
			.header(header::CONTENT_TYPE, FORM_CONTENT_TYPE)
			.header(header::ACCEPT, JSON_CONTENT_TYPE);

		form.extend_pairs(params);

		match &self.client_secret {
			Some(secret) =>
				builder = builder.header(header::AUTHORIZATION, basic_auth(&self.client_id, secret)),
			None => {
				form.append_pair("client_id", &self.client_id);
			},
		}

		builder.body(form.finish().into_bytes()).map_err(|e| ConfigError::from(e).into())
	}

	async fn dispatch(&self, endpoint: Endpoint, request: HttpRequest) -> Result<Vec<u8>> {
		let handle = self.http_client.handle();
		let response = handle
			.call(request)
			.await
			.map_err(|e| self.error_mapper.map_transport_error(endpoint, e))?;
		let status = response.status();

		if !status.is_success() {
			let reason = oauth_error_reason(response.body())
				.or_else(|| status.canonical_reason().map(ToOwned::to_owned));

			#[cfg(feature = "tracing")]
			tracing::debug!(%endpoint, status = status.as_u16(), "Realm endpoint rejected the request.");

			return Err(TransportError::Status { endpoint, status: status.as_u16(), reason }.into());
		}

		Ok(response.into_body())
	}
}
impl<C, M> KeySetSource for RealmClient<C, M>
where
	C: ?Sized + RealmHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fetch_key_set(&self) -> KeySetFuture<'_> {
		Box::pin(self.key_set())
	}
}

fn get_request(url: &Url, bearer: Option<&str>) -> Result<HttpRequest> {
	let mut builder = Request::builder()
		.method(Method::GET)
		.uri(url.as_str())
		.header(header::ACCEPT, JSON_CONTENT_TYPE);

	if let Some(token) = bearer {
		builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
	}

	builder.body(Vec::new()).map_err(|e| ConfigError::from(e).into())
}

/// `Basic base64(urlenc(client_id):urlenc(secret))`, per RFC 6749 section 2.3.1.
fn basic_auth(client_id: &str, secret: &str) -> String {
	let encode = |value: &str| form_urlencoded::byte_serialize(value.as_bytes()).collect::<String>();

	format!("Basic {}", STANDARD.encode(format!("{}:{}", encode(client_id), encode(secret))))
}

pub(crate) fn decode_json<T>(endpoint: Endpoint, body: &[u8]) -> Result<T>
where
	T: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| MalformedResponseError::Json { endpoint, source }.into())
}

fn oauth_error_reason(body: &[u8]) -> Option<String> {
	let parsed = serde_json::from_slice::<OAuthErrorBody>(body).ok()?;

	Some(match parsed.error_description {
		Some(description) if !description.is_empty() => format!("{}: {description}", parsed.error),
		_ => parsed.error,
	})
}

fn render_claim(value: &serde_json::Value) -> String {
	match value {
		serde_json::Value::String(text) => text.clone(),
		other => other.to_string(),
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(endpoint: Endpoint, err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return TransportError::Timeout { endpoint }.into();
	}

	TransportError::network(endpoint, err).into()
}
