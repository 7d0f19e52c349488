//! Role and permission lookups over decoded claims.
//!
//! Role names use a small grammar: `"role"` resolves against the client the token was parsed
//! for, `"realm:role"` against realm roles, and `"app:role"` against the named client's roles.

// self
use crate::token::Token;

const REALM_QUALIFIER: &str = "realm";

impl Token {
	/// Checks a role using the `role`, `realm:role`, or `app:role` grammar.
	///
	/// Only the first `:` separates the qualifier, so `app:scope:read` is role `scope:read` of
	/// `app`. Unqualified roles never match when the token was parsed without a client id.
	pub fn has_role(&self, name: &str) -> bool {
		match name.split_once(':') {
			None => self.client_id().is_some_and(|client| self.has_application_role(client, name)),
			Some((REALM_QUALIFIER, role)) => self.has_realm_role(role),
			Some((app, role)) => self.has_application_role(app, role),
		}
	}

	/// Checks `resource_access[app].roles`.
	pub fn has_application_role(&self, app: &str, role: &str) -> bool {
		self.claims().resource_access.get(app).is_some_and(|roles| roles.contains(role))
	}

	/// Checks `realm_access.roles`.
	pub fn has_realm_role(&self, role: &str) -> bool {
		self.claims().realm_access.as_ref().is_some_and(|roles| roles.contains(role))
	}

	/// Checks an authorization-services permission.
	///
	/// The first permission naming `resource` (by id or name) decides. When a scope is requested
	/// and that permission lists scopes, the scope must be among them.
	pub fn has_permission(&self, resource: &str, scope: Option<&str>) -> bool {
		let Some(authorization) = &self.claims().authorization else {
			return false;
		};
		let Some(permission) = authorization.permissions.iter().find(|p| p.targets(resource))
		else {
			return false;
		};

		match scope {
			Some(scope) if !permission.scopes.is_empty() =>
				permission.scopes.iter().any(|granted| granted == scope),
			_ => true,
		}
	}
}
