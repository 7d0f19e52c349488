//! Optional observability helpers for manager flows.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `oidc_grants.flow` with the `flow` and
//!   `stage` (call site) fields.
//! - Enable `metrics` to increment the `oidc_grants_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Flow kinds observed by the grant manager and keyring.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Resource-owner password grant.
	Password,
	/// Authorization Code exchange.
	AuthorizationCode,
	/// Client Credentials grant.
	ClientCredentials,
	/// Refresh token grant.
	Refresh,
	/// Token introspection.
	Introspection,
	/// User info lookup.
	UserInfo,
	/// Realm key-set fetch.
	KeyFetch,
	/// Grant or token validation.
	Validation,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Password => "password",
			FlowKind::AuthorizationCode => "authorization_code",
			FlowKind::ClientCredentials => "client_credentials",
			FlowKind::Refresh => "refresh",
			FlowKind::Introspection => "introspection",
			FlowKind::UserInfo => "userinfo",
			FlowKind::KeyFetch => "key_fetch",
			FlowKind::Validation => "validation",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a manager helper.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
	/// Work skipped because a throttle window was still closed.
	Throttled,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
			FlowOutcome::Throttled => "throttled",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Runs `fut` inside a flow span, recording the attempt and its final outcome.
pub async fn observe_flow<T, Fut>(kind: FlowKind, stage: &'static str, fut: Fut) -> Result<T>
where
	Fut: Future<Output = Result<T>>,
{
	let span = FlowSpan::new(kind, stage);

	record_flow_outcome(kind, FlowOutcome::Attempt);

	let result = span.instrument(fut).await;

	record_flow_result(kind, &result);

	result
}
