//! RS256 signature verification for realm-issued tokens.

// self
use crate::{
	_prelude::*,
	error::{TokenValidationError, TokenValidationKind},
	keyring::{KeyLookup, KeyringCache, VerificationKey},
	token::Token,
};

const SUPPORTED_ALGORITHM: &str = "RS256";

/// Verifies token signatures against a static realm key or the shared keyring.
#[derive(Debug)]
pub struct SignatureVerifier {
	static_key: Option<VerificationKey>,
	keyring: Arc<KeyringCache>,
}
impl SignatureVerifier {
	/// Creates a verifier; a static key, when present, takes precedence over the keyring.
	pub fn new(static_key: Option<VerificationKey>, keyring: Arc<KeyringCache>) -> Self {
		Self { static_key, keyring }
	}

	/// Keyring consulted when no static key is configured.
	pub fn keyring(&self) -> &Arc<KeyringCache> {
		&self.keyring
	}

	/// Verifies the token's signature over its exact signed span.
	///
	/// Fails with [`TokenValidationKind::Unsigned`] for tokens that did not parse,
	/// [`Error::KeyResolution`] when no key matches the header `kid`, and
	/// [`TokenValidationKind::BadSignature`] otherwise.
	pub async fn verify(&self, token: &Token) -> Result<()> {
		let Some(signed) = token.signed() else {
			return Err(TokenValidationError::new(TokenValidationKind::Unsigned, token).into());
		};

		if token.header().alg.as_deref().is_some_and(|alg| alg != SUPPORTED_ALGORITHM) {
			return Err(TokenValidationError::new(TokenValidationKind::BadSignature, token).into());
		}

		let verified = match &self.static_key {
			Some(key) => key.verify(signed.as_bytes(), token.signature()),
			None => self.resolve(token).await?.verify(signed.as_bytes(), token.signature()),
		};

		if verified {
			Ok(())
		} else {
			Err(TokenValidationError::new(TokenValidationKind::BadSignature, token).into())
		}
	}

	async fn resolve(&self, token: &Token) -> Result<VerificationKey> {
		let Some(kid) = token.header().kid.as_deref() else {
			return Err(Error::KeyResolution { kid: None });
		};

		match self.keyring.get_key(kid).await? {
			KeyLookup::Found(key) => Ok(key),
			KeyLookup::Unresolved => Err(Error::KeyResolution { kid: Some(kid.to_owned()) }),
		}
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
	use rsa::{
		RsaPrivateKey,
		pkcs1v15::SigningKey,
		pkcs8::DecodePrivateKey,
		signature::{SignatureEncoding, Signer},
		traits::PublicKeyParts,
	};
	use sha2::Sha256;
	// self
	use super::*;
	use crate::keyring::{Jwk, JwkSet, KeySetFuture, KeySetSource};

	const REALM_KEY_PEM: &str = include_str!("../tests/fixtures/realm_signing_key.pem");
	const ROGUE_KEY_PEM: &str = include_str!("../tests/fixtures/rogue_signing_key.pem");

	struct StaticSet(JwkSet);
	impl KeySetSource for StaticSet {
		fn fetch_key_set(&self) -> KeySetFuture<'_> {
			Box::pin(async move { Ok(self.0.clone()) })
		}
	}

	fn private_key(pem: &str) -> RsaPrivateKey {
		RsaPrivateKey::from_pkcs8_pem(pem).expect("Fixture key should decode.")
	}

	fn sign(pem: &str, header: serde_json::Value) -> Token {
		let header = URL_SAFE_NO_PAD.encode(header.to_string());
		let claims = URL_SAFE_NO_PAD.encode(br#"{"sub":"alice","exp":4102444800}"#);
		let signed = format!("{header}.{claims}");
		let signature = SigningKey::<Sha256>::new(private_key(pem)).sign(signed.as_bytes());

		Token::parse(format!("{signed}.{}", URL_SAFE_NO_PAD.encode(signature.to_vec())))
	}

	fn keyring_verifier() -> SignatureVerifier {
		let public = private_key(REALM_KEY_PEM).to_public_key();
		let jwk = Jwk {
			kid: Some("k1".into()),
			kty: "RSA".into(),
			n: Some(URL_SAFE_NO_PAD.encode(public.n().to_bytes_be())),
			e: Some(URL_SAFE_NO_PAD.encode(public.e().to_bytes_be())),
			..Default::default()
		};
		let keyring = KeyringCache::new(
			Arc::new(StaticSet(JwkSet { keys: vec![jwk] })),
			Duration::seconds(60),
		);

		SignatureVerifier::new(None, Arc::new(keyring))
	}

	#[tokio::test]
	async fn keyring_key_verifies_realm_signature() {
		let verifier = keyring_verifier();
		let token = sign(REALM_KEY_PEM, serde_json::json!({"alg": "RS256", "kid": "k1"}));

		assert!(verifier.verify(&token).await.is_ok());
	}

	#[tokio::test]
	async fn foreign_signature_is_rejected() {
		let verifier = keyring_verifier();
		let token = sign(ROGUE_KEY_PEM, serde_json::json!({"alg": "RS256", "kid": "k1"}));
		let err = verifier.verify(&token).await.expect_err("Rogue signature should fail.");

		assert_eq!(err.validation_kind(), Some(TokenValidationKind::BadSignature));
	}

	#[tokio::test]
	async fn unknown_or_missing_kid_fails_key_resolution() {
		let verifier = keyring_verifier();
		let unknown = sign(REALM_KEY_PEM, serde_json::json!({"alg": "RS256", "kid": "nope"}));
		let anonymous = sign(REALM_KEY_PEM, serde_json::json!({"alg": "RS256"}));

		assert!(matches!(
			verifier.verify(&unknown).await,
			Err(Error::KeyResolution { kid: Some(kid) }) if kid == "nope"
		));
		assert!(matches!(
			verifier.verify(&anonymous).await,
			Err(Error::KeyResolution { kid: None })
		));
	}

	#[tokio::test]
	async fn static_key_bypasses_keyring() {
		let static_key = VerificationKey::new(None, private_key(REALM_KEY_PEM).to_public_key());
		let keyring = Arc::new(KeyringCache::new(
			Arc::new(StaticSet(JwkSet::default())),
			Duration::seconds(60),
		));
		let verifier = SignatureVerifier::new(Some(static_key), keyring.clone());
		let token = sign(REALM_KEY_PEM, serde_json::json!({"alg": "RS256", "kid": "whatever"}));

		assert!(verifier.verify(&token).await.is_ok());
		assert_eq!(keyring.fetch_count(), 0);
	}

	#[tokio::test]
	async fn unsigned_and_foreign_algorithms_are_rejected() {
		let verifier = keyring_verifier();
		let unsigned = Token::parse("garbage");
		let hs256 = sign(REALM_KEY_PEM, serde_json::json!({"alg": "HS256", "kid": "k1"}));

		assert_eq!(
			verifier.verify(&unsigned).await.expect_err("Unsigned should fail.").validation_kind(),
			Some(TokenValidationKind::Unsigned)
		);
		assert_eq!(
			verifier.verify(&hs256).await.expect_err("HS256 should fail.").validation_kind(),
			Some(TokenValidationKind::BadSignature)
		);
	}
}
