//! Shared fixtures for the integration tests: a mock realm, signing keys, and token builders.

#![allow(dead_code)]

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use httpmock::prelude::*;
use rsa::{
	RsaPrivateKey,
	pkcs1v15::SigningKey,
	pkcs8::{DecodePrivateKey, EncodePublicKey, LineEnding},
	signature::{SignatureEncoding, Signer},
	traits::PublicKeyParts,
};
use serde_json::{Value, json};
use sha2::Sha256;
use time::OffsetDateTime;
// self
use oidc_grants::{RealmConfig, ReqwestGrantManager, config::RealmConfigBuilder, url::Url};

pub const CLIENT_ID: &str = "demo-app";
pub const CLIENT_SECRET: &str = "demo-secret";
pub const REALM_PATH: &str = "/realms/demo";
pub const TOKEN_PATH: &str = "/realms/demo/protocol/openid-connect/token";
pub const INTROSPECT_PATH: &str = "/realms/demo/protocol/openid-connect/token/introspect";
pub const USERINFO_PATH: &str = "/realms/demo/protocol/openid-connect/userinfo";
pub const CERTS_PATH: &str = "/realms/demo/protocol/openid-connect/certs";
pub const KID: &str = "realm-key-1";

pub const REALM_KEY_PEM: &str = include_str!("../fixtures/realm_signing_key.pem");
pub const ROGUE_KEY_PEM: &str = include_str!("../fixtures/rogue_signing_key.pem");

pub fn now() -> i64 {
	OffsetDateTime::now_utc().unix_timestamp()
}

pub fn realm_url(server: &MockServer) -> Url {
	Url::parse(&server.url(REALM_PATH)).expect("Mock realm URL should parse.")
}

pub fn issuer(server: &MockServer) -> String {
	server.url(REALM_PATH)
}

pub fn config_builder(server: &MockServer) -> RealmConfigBuilder {
	RealmConfig::builder(realm_url(server), CLIENT_ID).client_secret(CLIENT_SECRET)
}

pub fn manager_with(config: RealmConfig) -> ReqwestGrantManager {
	ReqwestGrantManager::new(config).expect("Reqwest manager should build.")
}

pub fn manager(server: &MockServer) -> ReqwestGrantManager {
	manager_with(config_builder(server).build().expect("Realm config should build."))
}

fn private_key(pem: &str) -> RsaPrivateKey {
	RsaPrivateKey::from_pkcs8_pem(pem).expect("Fixture signing key should decode.")
}

/// Claims of a realm-issued token of `typ` expiring `exp_in` seconds from now.
pub fn claims(server: &MockServer, typ: &str, exp_in: i64) -> Value {
	let now = now();

	json!({
		"iss": issuer(server),
		"sub": "user-1",
		"typ": typ,
		"iat": now,
		"exp": now + exp_in,
		"aud": "demo-app",
		"azp": "demo-app",
		"preferred_username": "alice",
		"realm_access": {"roles": ["user"]},
		"resource_access": {"demo-app": {"roles": ["editor"]}},
	})
}

pub fn sign_with(pem: &str, kid: &str, claims: &Value) -> String {
	let header = json!({"alg": "RS256", "typ": "JWT", "kid": kid});
	let signed = format!(
		"{}.{}",
		URL_SAFE_NO_PAD.encode(header.to_string()),
		URL_SAFE_NO_PAD.encode(claims.to_string())
	);
	let signature = SigningKey::<Sha256>::new(private_key(pem)).sign(signed.as_bytes());

	format!("{signed}.{}", URL_SAFE_NO_PAD.encode(signature.to_vec()))
}

/// Signs `claims` with the realm key published under [`KID`].
pub fn sign(claims: &Value) -> String {
	sign_with(REALM_KEY_PEM, KID, claims)
}

pub fn access_token(server: &MockServer, exp_in: i64) -> String {
	sign(&claims(server, "Bearer", exp_in))
}

pub fn refresh_token(server: &MockServer, exp_in: i64) -> String {
	sign(&claims(server, "Refresh", exp_in))
}

pub fn id_token(server: &MockServer, exp_in: i64) -> String {
	sign(&claims(server, "ID", exp_in))
}

pub fn token_response(access: &str, refresh: Option<&str>, id: Option<&str>) -> Value {
	let mut body = json!({
		"access_token": access,
		"token_type": "Bearer",
		"expires_in": 300,
		"session_state": "session-1",
		"scope": "openid profile",
	});

	if let Some(refresh) = refresh {
		body["refresh_token"] = json!(refresh);
		body["refresh_expires_in"] = json!(1800);
	}
	if let Some(id) = id {
		body["id_token"] = json!(id);
	}

	body
}

/// Full grant response with fresh access, refresh, and identity tokens.
pub fn fresh_token_response(server: &MockServer) -> Value {
	token_response(
		&access_token(server, 300),
		Some(&refresh_token(server, 1_800)),
		Some(&id_token(server, 300)),
	)
}

/// PEM encoding of the realm verification key, as configured for a static-key client.
pub fn realm_public_key_pem() -> String {
	private_key(REALM_KEY_PEM)
		.to_public_key()
		.to_public_key_pem(LineEnding::LF)
		.expect("Realm public key should encode.")
}

pub fn jwks_body() -> String {
	let public = private_key(REALM_KEY_PEM).to_public_key();

	json!({
		"keys": [
			{
				"kid": KID,
				"kty": "RSA",
				"alg": "RS256",
				"use": "sig",
				"n": URL_SAFE_NO_PAD.encode(public.n().to_bytes_be()),
				"e": URL_SAFE_NO_PAD.encode(public.e().to_bytes_be()),
			},
			{"kid": "enc-key", "kty": "EC", "use": "enc", "crv": "P-256"},
		]
	})
	.to_string()
}

pub async fn mock_certs(server: &MockServer) -> httpmock::Mock<'_> {
	server
		.mock_async(|when, then| {
			when.method(GET).path(CERTS_PATH);
			then.status(200).header("content-type", "application/json").body(jwks_body());
		})
		.await
}

pub async fn mock_token(server: &MockServer, status: u16, body: Value) -> httpmock::Mock<'_> {
	server
		.mock_async(move |when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(status).header("content-type", "application/json").body(body.to_string());
		})
		.await
}

/// Basic credential the manager sends for the fixture confidential client.
pub fn basic_credentials() -> String {
	use base64::engine::general_purpose::STANDARD;

	format!("Basic {}", STANDARD.encode(format!("{CLIENT_ID}:{CLIENT_SECRET}")))
}
