//! Grant aggregate produced by every successful exchange.

// self
use crate::{_prelude::*, token::Token};

/// JSON document returned by the token endpoint.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
	/// Compact access token.
	#[serde(default)]
	pub access_token: Option<String>,
	/// Compact refresh token.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<String>,
	/// Compact identity token.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id_token: Option<String>,
	/// Token type, usually `Bearer`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub token_type: Option<String>,
	/// Access-token lifetime in seconds.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expires_in: Option<i64>,
	/// Refresh-token lifetime in seconds.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh_expires_in: Option<i64>,
	/// Server-side session identifier.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub session_state: Option<String>,
	/// Granted scopes, space delimited.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub scope: Option<String>,
}
impl Debug for TokenPayload {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let redact = |value: &Option<String>| value.as_ref().map(|_| "<redacted>");

		f.debug_struct("TokenPayload")
			.field("access_token", &redact(&self.access_token))
			.field("refresh_token", &redact(&self.refresh_token))
			.field("id_token", &redact(&self.id_token))
			.field("token_type", &self.token_type)
			.field("expires_in", &self.expires_in)
			.field("refresh_expires_in", &self.refresh_expires_in)
			.field("scope", &self.scope)
			.finish()
	}
}

/// Set of tokens issued together by the authorization server.
///
/// Grant expiry is access-token expiry; a grant without an access token is expired.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Grant {
	/// Access token, present on every successful exchange.
	pub access_token: Option<Token>,
	/// Refresh token, absent for bearer-only and client-credential grants.
	pub refresh_token: Option<Token>,
	/// Identity token, present when the `openid` scope was granted.
	pub id_token: Option<Token>,
	/// Token type reported by the server.
	pub token_type: Option<String>,
	/// Access-token lifetime in seconds, as reported.
	pub expires_in: Option<i64>,
	raw: Option<RawPayload>,
}
impl Grant {
	/// Builds a grant from a decoded token-endpoint payload.
	///
	/// Tokens are parsed for `client_id` so unqualified role lookups resolve against it.
	pub fn from_payload(payload: &TokenPayload, client_id: Option<&str>) -> Self {
		let parse = |compact: &Option<String>| {
			compact.as_ref().map(|compact| match client_id {
				Some(client_id) => Token::parse_for_client(compact.as_str(), client_id),
				None => Token::parse(compact.as_str()),
			})
		};

		Self {
			access_token: parse(&payload.access_token),
			refresh_token: parse(&payload.refresh_token),
			id_token: parse(&payload.id_token),
			token_type: payload.token_type.clone(),
			expires_in: payload.expires_in,
			raw: None,
		}
	}

	/// Attaches the verbatim server response used for persistence.
	pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
		self.raw = Some(RawPayload(raw.into()));

		self
	}

	/// Verbatim server response, when the grant came from an exchange or a stored payload.
	pub fn raw(&self) -> Option<&str> {
		self.raw.as_ref().map(|raw| raw.0.as_str())
	}

	/// Replaces every field with the corresponding field of `source`.
	pub fn update(&mut self, source: Grant) {
		*self = source;
	}

	/// Returns `true` when there is no access token or it has expired.
	pub fn is_expired(&self) -> bool {
		self.access_token.as_ref().is_none_or(Token::is_expired)
	}
}
/// Renders the verbatim server response so a session store can persist and later rebuild it
/// with `GrantManager::create_grant`.
impl Display for Grant {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self.raw() {
			Some(raw) => f.write_str(raw),
			None => f.write_str("[no raw payload]"),
		}
	}
}

#[derive(Clone, PartialEq, Eq)]
struct RawPayload(String);
impl Debug for RawPayload {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}
