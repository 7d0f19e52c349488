//! OAuth 2.0 / OpenID Connect grant lifecycle for Keycloak-style realms: obtain grants, keep them
//! fresh, and cryptographically validate every token before its claims are trusted.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod config;
pub mod error;
pub mod grant;
pub mod http;
pub mod keyring;
pub mod manager;
pub mod oauth;
pub mod obs;
pub mod token;
pub mod verify;

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};

pub use crate::{
	config::{RealmConfig, RealmEndpoints},
	grant::{Grant, TokenPayload},
	keyring::{KeyLookup, KeyringCache, VerificationKey},
	manager::{CodeExchangeContext, ExpectedType, GrantManager, IntrospectionOutcome, UserInfo},
	token::{Token, TokenRef},
	verify::SignatureVerifier,
};
#[cfg(feature = "reqwest")] pub use crate::manager::ReqwestGrantManager;
