//! Grant freshness: reuse while valid, refresh through the token endpoint once expired.

mod metrics;

pub use metrics::*;

// self
use crate::{
	_prelude::*,
	error::RefreshUnavailableError,
	grant::Grant,
	http::RealmHttpClient,
	manager::GrantManager,
	oauth::{GrantType, TransportErrorMapper},
	obs::{self, FlowKind},
};

impl<C, M> GrantManager<C, M>
where
	C: ?Sized + RealmHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Ensures the grant's access token is usable, refreshing it in place when expired.
	///
	/// A fresh grant is returned untouched. Otherwise the grant needs an unexpired refresh
	/// token; the refreshed grant is validated before it replaces every field of `grant`.
	/// On failure `grant` is left as it was.
	pub async fn ensure_freshness<'g>(&self, grant: &'g mut Grant) -> Result<&'g mut Grant> {
		self.refresh_metrics.record_check();

		if !grant.is_expired() {
			self.refresh_metrics.record_reuse();

			return Ok(grant);
		}

		let refreshed =
			obs::observe_flow(FlowKind::Refresh, "ensure_freshness", self.refresh(grant)).await;

		match refreshed {
			Ok(fresh) => {
				self.refresh_metrics.record_refresh();
				grant.update(fresh);

				Ok(grant)
			},
			Err(e) => {
				self.refresh_metrics.record_failure();

				Err(e)
			},
		}
	}

	async fn refresh(&self, grant: &Grant) -> Result<Grant> {
		let Some(refresh_token) = &grant.refresh_token else {
			return Err(RefreshUnavailableError::MissingRefreshToken.into());
		};

		if refresh_token.is_expired() {
			return Err(RefreshUnavailableError::RefreshTokenExpired.into());
		}

		let (payload, raw) = self
			.realm
			.exchange(GrantType::RefreshToken, &[("refresh_token", refresh_token.as_str())])
			.await?;
		let fresh = self.build_grant(&payload, raw);

		self.validate_grant(&fresh).await?;

		Ok(fresh)
	}
}
