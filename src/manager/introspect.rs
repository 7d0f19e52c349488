//! Server-side token checks: introspection and user info.

pub use crate::oauth::UserInfo;

// self
use crate::{
	_prelude::*,
	http::RealmHttpClient,
	manager::GrantManager,
	oauth::TransportErrorMapper,
	obs::{self, FlowKind},
	token::TokenRef,
};

/// Answer of the introspection endpoint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum IntrospectionOutcome<'a> {
	/// The server reports the token active; carries the token as supplied.
	Active(TokenRef<'a>),
	/// The server reports the token inactive (revoked, expired, or unknown).
	Inactive,
}
impl IntrospectionOutcome<'_> {
	/// Returns `true` for [`IntrospectionOutcome::Active`].
	pub fn is_active(&self) -> bool {
		matches!(self, Self::Active(_))
	}
}

impl<C, M> GrantManager<C, M>
where
	C: ?Sized + RealmHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Asks the realm whether an access token is still active.
	///
	/// An inactive token is an `Ok` outcome; errors are reserved for transport and decoding
	/// failures.
	pub async fn validate_access_token<'a>(
		&self,
		token: impl Into<TokenRef<'a>>,
	) -> Result<IntrospectionOutcome<'a>> {
		let token = token.into();

		obs::observe_flow(FlowKind::Introspection, "validate_access_token", async {
			let active = self.realm.introspect(token.as_str()).await?;

			Ok(if active {
				IntrospectionOutcome::Active(token)
			} else {
				IntrospectionOutcome::Inactive
			})
		})
		.await
	}

	/// Fetches the user info document for an access token.
	pub async fn user_info<'a>(&self, token: impl Into<TokenRef<'a>>) -> Result<UserInfo> {
		let token = token.into();

		obs::observe_flow(FlowKind::UserInfo, "user_info", self.realm.user_info(token.as_str()))
			.await
	}
}
