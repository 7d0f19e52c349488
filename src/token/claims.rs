//! Header and claim model of realm-issued tokens.

// self
use crate::_prelude::*;

/// JOSE header of a compact token.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenHeader {
	/// Signing algorithm (`RS256` for realm-issued tokens).
	pub alg: Option<String>,
	/// Key identifier used to resolve the verification key.
	pub kid: Option<String>,
	/// Media type, usually `JWT`.
	pub typ: Option<String>,
}

/// Claim set carried by realm-issued tokens.
///
/// Only the claims the validation pipeline and role lookups consume are typed; everything
/// else is preserved in [`extra`](Self::extra).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenClaims {
	/// Subject identifier.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub sub: Option<String>,
	/// Issuer, the realm URL.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub iss: Option<String>,
	/// Issued-at, seconds since the epoch.
	pub iat: i64,
	/// Expiry, seconds since the epoch.
	pub exp: i64,
	/// Realm token type: `Bearer`, `Refresh`, `Offline`, or `ID`.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub typ: Option<String>,
	/// Audience list.
	pub aud: Audience,
	/// Authorized party.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub azp: Option<String>,
	/// Server-side session identifier.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub session_state: Option<String>,
	/// Realm-level roles.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub realm_access: Option<RoleSet>,
	/// Client-level roles keyed by client identifier.
	#[serde(skip_serializing_if = "HashMap::is_empty")]
	pub resource_access: HashMap<String, RoleSet>,
	/// Authorization-services permissions.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub authorization: Option<Authorization>,
	/// Remaining claims.
	#[serde(flatten)]
	pub extra: serde_json::Map<String, serde_json::Value>,
}

/// `aud` claim, which realms emit either as a string or as an array.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "AudienceRepr", into = "AudienceRepr")]
pub struct Audience(pub Vec<String>);
impl Audience {
	/// Returns `true` if `client_id` is among the audiences.
	pub fn contains(&self, client_id: &str) -> bool {
		self.0.iter().any(|aud| aud == client_id)
	}

	/// Returns `true` when no audience was present.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum AudienceRepr {
	One(String),
	Many(Vec<String>),
}
impl From<AudienceRepr> for Audience {
	fn from(value: AudienceRepr) -> Self {
		match value {
			AudienceRepr::One(aud) => Self(vec![aud]),
			AudienceRepr::Many(auds) => Self(auds),
		}
	}
}
impl From<Audience> for AudienceRepr {
	fn from(mut value: Audience) -> Self {
		if value.0.len() == 1 { Self::One(value.0.remove(0)) } else { Self::Many(value.0) }
	}
}

/// Role list wrapper used by `realm_access` and `resource_access` entries.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSet {
	/// Granted role names.
	#[serde(default)]
	pub roles: Vec<String>,
}
impl RoleSet {
	/// Returns `true` if `role` is granted.
	pub fn contains(&self, role: &str) -> bool {
		self.roles.iter().any(|granted| granted == role)
	}
}

/// `authorization` claim issued by authorization services.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorization {
	/// Granted resource permissions.
	#[serde(default)]
	pub permissions: Vec<Permission>,
}

/// One granted resource permission.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
	/// Resource identifier.
	#[serde(default)]
	pub rsid: Option<String>,
	/// Resource name.
	#[serde(default)]
	pub rsname: Option<String>,
	/// Granted scopes; empty means every scope.
	#[serde(default)]
	pub scopes: Vec<String>,
}
impl Permission {
	/// Returns `true` if the permission targets `resource` by id or name.
	pub fn targets(&self, resource: &str) -> bool {
		self.rsid.as_deref() == Some(resource) || self.rsname.as_deref() == Some(resource)
	}
}
