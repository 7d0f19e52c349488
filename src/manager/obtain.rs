//! Grant acquisition: password, authorization code, client credentials, and stored payloads.

// self
use crate::{
	_prelude::*,
	grant::{Grant, TokenPayload},
	http::{Endpoint, RealmHttpClient},
	manager::GrantManager,
	oauth::{self, GrantType, TransportErrorMapper},
	obs::{self, FlowKind},
};

const OPENID_SCOPE: &str = "openid";

/// Callback context for an authorization-code exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeExchangeContext {
	/// Redirect URI the code was issued for; must match the authorization request.
	pub redirect_uri: String,
	/// Application session identifier forwarded as `client_session_state`.
	pub session_state: Option<String>,
	/// Application host forwarded as `client_session_host`.
	pub session_host: Option<String>,
}
impl CodeExchangeContext {
	/// Creates a context for `redirect_uri` without session details.
	pub fn new(redirect_uri: impl Into<String>) -> Self {
		Self { redirect_uri: redirect_uri.into(), session_state: None, session_host: None }
	}

	/// Attaches the application session identifier.
	pub fn with_session_state(mut self, session_state: impl Into<String>) -> Self {
		self.session_state = Some(session_state.into());

		self
	}

	/// Attaches the application host.
	pub fn with_session_host(mut self, session_host: impl Into<String>) -> Self {
		self.session_host = Some(session_host.into());

		self
	}
}

impl<C, M> GrantManager<C, M>
where
	C: ?Sized + RealmHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Exchanges resource-owner credentials for a validated grant.
	pub async fn obtain_directly(&self, username: &str, password: &str) -> Result<Grant> {
		obs::observe_flow(FlowKind::Password, "obtain_directly", async {
			let params =
				[("username", username), ("password", password), ("scope", OPENID_SCOPE)];
			let (payload, raw) = self.realm.exchange(GrantType::Password, &params).await?;

			self.create_grant_from_payload(&payload, raw).await
		})
		.await
	}

	/// Exchanges an authorization code for a validated grant.
	pub async fn obtain_from_authorization_code(
		&self,
		code: &str,
		context: &CodeExchangeContext,
	) -> Result<Grant> {
		obs::observe_flow(FlowKind::AuthorizationCode, "obtain_from_authorization_code", async {
			let mut params = vec![("code", code), ("redirect_uri", context.redirect_uri.as_str())];

			if let Some(state) = context.session_state.as_deref() {
				params.push(("client_session_state", state));
			}
			if let Some(host) = context.session_host.as_deref() {
				params.push(("client_session_host", host));
			}

			let (payload, raw) =
				self.realm.exchange(GrantType::AuthorizationCode, &params).await?;

			self.create_grant_from_payload(&payload, raw).await
		})
		.await
	}

	/// Obtains a validated service-account grant with the client's own credentials.
	pub async fn obtain_from_client_credentials(&self) -> Result<Grant> {
		obs::observe_flow(FlowKind::ClientCredentials, "obtain_from_client_credentials", async {
			let params = [("scope", OPENID_SCOPE)];
			let (payload, raw) = self.realm.exchange(GrantType::ClientCredentials, &params).await?;

			self.create_grant_from_payload(&payload, raw).await
		})
		.await
	}

	/// Rebuilds a grant from a raw token-endpoint response, typically one persisted through the
	/// grant's `Display` output.
	///
	/// Bearer-only managers validate the access token only; otherwise the grant is made fresh
	/// (refreshing if needed) and then fully validated.
	pub async fn create_grant(&self, raw: &str) -> Result<Grant> {
		let payload = oauth::decode_json::<TokenPayload>(Endpoint::Token, raw.as_bytes())?;

		self.create_grant_from_payload(&payload, raw).await
	}

	/// Builds and validates a grant from an already decoded payload.
	pub async fn create_grant_from_payload(
		&self,
		payload: &TokenPayload,
		raw: impl Into<String>,
	) -> Result<Grant> {
		let mut grant = self.build_grant(payload, raw.into());

		obs::observe_flow(FlowKind::Validation, "create_grant", async {
			if !self.config.bearer_only {
				self.ensure_freshness(&mut grant).await?;
			}

			self.validate_grant(&grant).await?;

			Ok(())
		})
		.await?;

		Ok(grant)
	}

	pub(super) fn build_grant(&self, payload: &TokenPayload, raw: String) -> Grant {
		Grant::from_payload(payload, Some(&self.config.client_id)).with_raw(raw)
	}
}
