//! Demonstrates a bearer-only resource server: tokens presented by callers are validated
//! locally against the realm's published keys, then confirmed through introspection.
//!
//! The realm is simulated with `httpmock`; the access token is signed with the test fixture key
//! whose public half the mock publishes on the certs endpoint.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use color_eyre::Result;
use httpmock::prelude::*;
use rsa::{
	RsaPrivateKey,
	pkcs1v15::SigningKey,
	pkcs8::DecodePrivateKey,
	signature::{SignatureEncoding, Signer},
	traits::PublicKeyParts,
};
use serde_json::json;
use sha2::Sha256;
use time::OffsetDateTime;
// self
use oidc_grants::{IntrospectionOutcome, RealmConfig, ReqwestGrantManager, Token, url::Url};

const SIGNING_KEY_PEM: &str = include_str!("../tests/fixtures/realm_signing_key.pem");
const KID: &str = "demo-key";

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let signing_key = RsaPrivateKey::from_pkcs8_pem(SIGNING_KEY_PEM)?;
	let public = signing_key.to_public_key();
	let server = MockServer::start_async().await;
	let certs = server
		.mock_async(|when, then| {
			when.method(GET).path("/realms/demo/protocol/openid-connect/certs");
			then.status(200).header("content-type", "application/json").body(
				json!({"keys": [{
					"kid": KID,
					"kty": "RSA",
					"alg": "RS256",
					"use": "sig",
					"n": URL_SAFE_NO_PAD.encode(public.n().to_bytes_be()),
					"e": URL_SAFE_NO_PAD.encode(public.e().to_bytes_be()),
				}]})
				.to_string(),
			);
		})
		.await;
	let introspection = server
		.mock_async(|when, then| {
			when.method(POST).path("/realms/demo/protocol/openid-connect/token/introspect");
			then.status(200)
				.header("content-type", "application/json")
				.body(json!({"active": true}).to_string());
		})
		.await;
	let config = RealmConfig::builder(Url::parse(&server.url("/realms/demo"))?, "orders-api")
		.bearer_only(true)
		.build()?;
	let manager = ReqwestGrantManager::new(config)?;
	let now = OffsetDateTime::now_utc().unix_timestamp();
	let header = json!({"alg": "RS256", "typ": "JWT", "kid": KID});
	let claims = json!({
		"iss": server.url("/realms/demo"),
		"sub": "user-42",
		"typ": "Bearer",
		"iat": now,
		"exp": now + 300,
		"azp": "storefront",
		"realm_access": {"roles": ["customer"]},
		"resource_access": {"orders-api": {"roles": ["read-orders"]}},
	});
	let signed = format!(
		"{}.{}",
		URL_SAFE_NO_PAD.encode(header.to_string()),
		URL_SAFE_NO_PAD.encode(claims.to_string())
	);
	let signature = SigningKey::<Sha256>::new(signing_key).sign(signed.as_bytes());
	let presented = format!("{signed}.{}", URL_SAFE_NO_PAD.encode(signature.to_vec()));
	let token = Token::parse_for_client(presented.as_str(), "orders-api");
	let token = manager.validate_token(Some(&token)).await?;

	println!(
		"Validated token for {:?}: read-orders={}, realm:customer={}.",
		token.claims().sub,
		token.has_role("read-orders"),
		token.has_role("realm:customer"),
	);

	match manager.validate_access_token(token).await? {
		IntrospectionOutcome::Active(_) => println!("Realm reports the token active."),
		IntrospectionOutcome::Inactive => println!("Realm reports the token inactive."),
	}

	certs.assert_async().await;
	introspection.assert_async().await;

	Ok(())
}
