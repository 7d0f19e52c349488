//! Transport primitives for calls against the authorization server.
//!
//! [`RealmHttpClient`] is the crate's only dependency on an HTTP stack. Requests and
//! responses use the `oauth2` crate's [`HttpRequest`]/[`HttpResponse`] types so custom
//! transports can be plugged in without pulling reqwest into the core.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
use oauth2::{AsyncHttpClient, HttpClientError};
#[cfg(feature = "reqwest")] use oauth2::{HttpRequest, HttpResponse};
// self
use crate::_prelude::*;
#[cfg(feature = "reqwest")] use crate::error::ConfigError;

/// Authorization-server endpoints consumed by the manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endpoint {
	/// Token endpoint (all grant exchanges).
	Token,
	/// Token introspection endpoint.
	Introspection,
	/// User info endpoint.
	UserInfo,
	/// Key-publication (JWKS) endpoint.
	Certs,
}
impl Endpoint {
	/// Returns a stable label suitable for errors, spans, and metrics.
	pub const fn as_str(self) -> &'static str {
		match self {
			Endpoint::Token => "token",
			Endpoint::Introspection => "introspection",
			Endpoint::UserInfo => "userinfo",
			Endpoint::Certs => "certs",
		}
	}
}
impl Display for Endpoint {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Abstraction over HTTP transports able to reach the authorization server.
///
/// Implementations must be `Send + Sync + 'static` so one transport can be shared by the
/// manager and its keyring. Handles returned by [`handle`](RealmHttpClient::handle) own
/// whatever state they need, keeping their request futures `Send` for the whole exchange.
pub trait RealmHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// [`AsyncHttpClient`] handle used for a single exchange.
	type Handle: for<'c> AsyncHttpClient<
			'c,
			Error = HttpClientError<Self::TransportError>,
			Future: 'c + Send,
		>
		+ 'static
		+ Send
		+ Sync;

	/// Returns a handle ready to dispatch one request.
	fn handle(&self) -> Self::Handle;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Authorization-server endpoints answer directly, so the client built by
/// [`ReqwestHttpClient::with_timeout`] never follows redirects.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	///
	/// The caller is responsible for configuring a request timeout on `client`.
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client that fails any request exceeding `timeout`.
	pub fn with_timeout(timeout: std::time::Duration) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder()
			.timeout(timeout)
			.redirect(reqwest::redirect::Policy::none())
			.build()?;

		Ok(Self(client))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl RealmHttpClient for ReqwestHttpClient {
	type Handle = ReqwestHandle;
	type TransportError = ReqwestError;

	fn handle(&self) -> Self::Handle {
		ReqwestHandle(self.0.clone())
	}
}

/// Handle returned by [`ReqwestHttpClient`] that satisfies [`RealmHttpClient`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestHandle(ReqwestClient);
#[cfg(feature = "reqwest")]
impl<'c> AsyncHttpClient<'c> for ReqwestHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let client = self.0.clone();

		Box::pin(async move {
			let response =
				client.execute(request.try_into().map_err(Box::new)?).await.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn endpoint_labels_are_stable() {
		assert_eq!(Endpoint::Token.to_string(), "token");
		assert_eq!(Endpoint::Introspection.as_str(), "introspection");
		assert_eq!(Endpoint::UserInfo.as_str(), "userinfo");
		assert_eq!(Endpoint::Certs.as_str(), "certs");
	}

	#[cfg(feature = "reqwest")]
	#[test]
	fn timeout_client_builds() {
		let timeout = crate::config::DEFAULT_REQUEST_TIMEOUT.unsigned_abs();
		let client = ReqwestHttpClient::with_timeout(timeout);

		assert!(client.is_ok());
	}
}
