//! Token and grant validation pipeline.

// self
use crate::{
	_prelude::*,
	error::{TokenValidationError, TokenValidationKind},
	grant::Grant,
	http::RealmHttpClient,
	manager::GrantManager,
	oauth::TransportErrorMapper,
	obs::{self, FlowKind},
	token::Token,
};

/// Token type a validation expects in the `typ` claim.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExpectedType {
	/// Access token (`Bearer`).
	Bearer,
	/// Refresh token (`Refresh` or `Offline`).
	Refresh,
	/// Identity token (`ID`).
	Id,
}
impl ExpectedType {
	/// Returns `true` if `typ` denotes this token type.
	pub fn matches(self, typ: Option<&str>) -> bool {
		match (self, typ) {
			(Self::Bearer, Some(typ)) => typ.eq_ignore_ascii_case("Bearer"),
			(Self::Refresh, Some(typ)) =>
				typ.eq_ignore_ascii_case("Refresh") || typ.eq_ignore_ascii_case("Offline"),
			(Self::Id, Some(typ)) => typ.eq_ignore_ascii_case("ID"),
			(_, None) => false,
		}
	}
}

impl<C, M> GrantManager<C, M>
where
	C: ?Sized + RealmHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Validates every token of a grant.
	///
	/// The access token is always checked; refresh and identity tokens are checked when present
	/// unless the manager is bearer-only. Checks run concurrently and the first failure wins,
	/// wrapped in [`Error::GrantValidation`]. The same grant is returned on success.
	pub async fn validate_grant<'g>(&self, grant: &'g Grant) -> Result<&'g Grant> {
		obs::observe_flow(FlowKind::Validation, "validate_grant", async {
			let access = self.validate_token_as(grant.access_token.as_ref(), ExpectedType::Bearer);

			if self.config.bearer_only {
				return access.await.map(|_| grant).map_err(Error::grant_validation);
			}

			let refresh = self.validate_optional(grant.refresh_token.as_ref(), ExpectedType::Refresh);
			let id = self.validate_optional(grant.id_token.as_ref(), ExpectedType::Id);

			futures::try_join!(access, refresh, id).map(|_| grant).map_err(Error::grant_validation)
		})
		.await
	}

	/// Validates a token without a type expectation.
	///
	/// Returns the same token on success so callers can chain on it.
	pub async fn validate_token<'t>(&self, token: Option<&'t Token>) -> Result<&'t Token> {
		self.check_token(token, None).await
	}

	/// Validates a token and additionally requires its `typ` claim to match `expected`.
	pub async fn validate_token_as<'t>(
		&self,
		token: Option<&'t Token>,
		expected: ExpectedType,
	) -> Result<&'t Token> {
		self.check_token(token, Some(expected)).await
	}

	async fn validate_optional(&self, token: Option<&Token>, expected: ExpectedType) -> Result<()> {
		match token {
			Some(token) => self.check_token(Some(token), Some(expected)).await.map(|_| ()),
			None => Ok(()),
		}
	}

	async fn check_token<'t>(
		&self,
		token: Option<&'t Token>,
		expected: Option<ExpectedType>,
	) -> Result<&'t Token> {
		let token = token.ok_or_else(TokenValidationError::missing)?;
		let claims = token.claims();

		if token.is_expired() {
			return reject(TokenValidationKind::Expired, token);
		}
		if token.signed().is_none() {
			return reject(TokenValidationKind::Unsigned, token);
		}
		if expected.is_some_and(|expected| !expected.matches(claims.typ.as_deref())) {
			return reject(TokenValidationKind::WrongType, token);
		}
		if claims.iat < self.not_before() {
			return reject(TokenValidationKind::FutureDated, token);
		}
		if claims.iss.as_deref() != Some(self.config.issuer()) {
			return reject(TokenValidationKind::WrongIssuer, token);
		}
		if !self.audience_accepted(token, expected) {
			return reject(TokenValidationKind::WrongAudience, token);
		}

		self.verifier.verify(token).await?;

		Ok(token)
	}

	// Identity tokens always name the client; access tokens only when audience checks are on.
	fn audience_accepted(&self, token: &Token, expected: Option<ExpectedType>) -> bool {
		let claims = token.claims();
		let client_id = self.config.client_id.as_str();

		match expected {
			Some(ExpectedType::Id) =>
				claims.aud.contains(client_id)
					&& claims.azp.as_deref().is_none_or(|azp| azp == client_id),
			Some(ExpectedType::Refresh) => true,
			Some(ExpectedType::Bearer) | None =>
				!self.config.verify_token_audience || claims.aud.contains(client_id),
		}
	}
}

fn reject<T>(kind: TokenValidationKind, token: &Token) -> Result<T> {
	#[cfg(feature = "tracing")]
	tracing::debug!(reason = kind.as_str(), "Token rejected.");

	Err(TokenValidationError::new(kind, token).into())
}
