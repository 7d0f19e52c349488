// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use rsa::{
	BigUint, RsaPublicKey,
	pkcs1::DecodeRsaPublicKey,
	pkcs1v15::{Signature, VerifyingKey},
	pkcs8::DecodePublicKey,
	signature::Verifier,
};
use sha2::Sha256;
// self
use crate::{_prelude::*, error::KeyMaterialError, token::BASE64_URL_LENIENT};

const RSA_KEY_TYPE: &str = "RSA";
const PKCS1_PEM_LABEL: &str = "RSA PUBLIC KEY";

/// Key-publication document served by the certs endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwkSet {
	/// Published keys.
	#[serde(default)]
	pub keys: Vec<Jwk>,
}

/// One published JSON Web Key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
	/// Key identifier.
	#[serde(default)]
	pub kid: Option<String>,
	/// Key type; only `RSA` is usable.
	#[serde(default)]
	pub kty: String,
	/// Intended algorithm.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub alg: Option<String>,
	/// Intended use (`sig` or `enc`).
	#[serde(default, rename = "use", skip_serializing_if = "Option::is_none")]
	pub key_use: Option<String>,
	/// RSA modulus, base64url.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub n: Option<String>,
	/// RSA public exponent, base64url.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub e: Option<String>,
}

/// RSA public key ready for RSA-SHA256 (RS256) verification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationKey {
	kid: Option<String>,
	key: RsaPublicKey,
}
impl VerificationKey {
	/// Wraps an RSA public key.
	pub fn new(kid: Option<String>, key: RsaPublicKey) -> Self {
		Self { kid, key }
	}

	/// Converts a published JWK.
	pub fn from_jwk(jwk: &Jwk) -> Result<Self, KeyMaterialError> {
		if jwk.kty != RSA_KEY_TYPE {
			return Err(KeyMaterialError::UnsupportedKeyType { kty: jwk.kty.clone() });
		}

		let n = decode_member("n", jwk.n.as_deref())?;
		let e = decode_member("e", jwk.e.as_deref())?;
		let key = RsaPublicKey::new(BigUint::from_bytes_be(&n), BigUint::from_bytes_be(&e))?;

		Ok(Self::new(jwk.kid.clone(), key))
	}

	/// Decodes a configured realm key, either PEM or bare base64 DER (SPKI or PKCS#1).
	pub fn from_public_key(encoded: &str) -> Result<Self, KeyMaterialError> {
		let encoded = encoded.trim();
		let key = if encoded.starts_with("-----BEGIN") {
			if encoded.contains(PKCS1_PEM_LABEL) {
				RsaPublicKey::from_pkcs1_pem(encoded).map_err(decode_error)?
			} else {
				RsaPublicKey::from_public_key_pem(encoded).map_err(decode_error)?
			}
		} else {
			let compact = encoded.split_whitespace().collect::<String>();
			let der = STANDARD.decode(compact).map_err(KeyMaterialError::PublicKeyEncoding)?;

			match RsaPublicKey::from_public_key_der(&der) {
				Ok(key) => key,
				Err(_) => RsaPublicKey::from_pkcs1_der(&der).map_err(decode_error)?,
			}
		};

		Ok(Self::new(None, key))
	}

	/// Key identifier, absent for a configured static key.
	pub fn kid(&self) -> Option<&str> {
		self.kid.as_deref()
	}

	/// Underlying RSA public key.
	pub fn public_key(&self) -> &RsaPublicKey {
		&self.key
	}

	/// Verifies an RSA-SHA256 PKCS#1 v1.5 signature over `message`.
	pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
		let Ok(signature) = Signature::try_from(signature) else {
			return false;
		};

		VerifyingKey::<Sha256>::new(self.key.clone()).verify(message, &signature).is_ok()
	}
}

fn decode_member(member: &'static str, value: Option<&str>) -> Result<Vec<u8>, KeyMaterialError> {
	let value = value.ok_or(KeyMaterialError::MissingMember { member })?;

	BASE64_URL_LENIENT.decode(value).map_err(|source| KeyMaterialError::Encoding { member, source })
}

fn decode_error(err: impl Display) -> KeyMaterialError {
	KeyMaterialError::PublicKeyDecode { message: err.to_string() }
}

#[cfg(test)]
mod tests {
	// crates.io
	use base64::engine::general_purpose::URL_SAFE_NO_PAD;
	use rsa::{
		RsaPrivateKey,
		pkcs1v15::SigningKey,
		pkcs8::{DecodePrivateKey, EncodePublicKey, LineEnding},
		signature::{SignatureEncoding, Signer},
		traits::PublicKeyParts,
	};
	// self
	use super::*;

	const SIGNING_KEY_PEM: &str = include_str!("../../tests/fixtures/realm_signing_key.pem");

	fn private_key() -> RsaPrivateKey {
		RsaPrivateKey::from_pkcs8_pem(SIGNING_KEY_PEM).expect("Fixture key should decode.")
	}

	fn jwk_for(key: &RsaPublicKey, kid: &str) -> Jwk {
		Jwk {
			kid: Some(kid.into()),
			kty: RSA_KEY_TYPE.into(),
			alg: Some("RS256".into()),
			key_use: Some("sig".into()),
			n: Some(URL_SAFE_NO_PAD.encode(key.n().to_bytes_be())),
			e: Some(URL_SAFE_NO_PAD.encode(key.e().to_bytes_be())),
		}
	}

	fn sign(message: &[u8]) -> Vec<u8> {
		SigningKey::<Sha256>::new(private_key()).sign(message).to_vec()
	}

	#[test]
	fn jwk_key_verifies_matching_signature() {
		let public = private_key().to_public_key();
		let key = VerificationKey::from_jwk(&jwk_for(&public, "k1")).expect("JWK should convert.");
		let signature = sign(b"header.claims");

		assert_eq!(key.kid(), Some("k1"));
		assert!(key.verify(b"header.claims", &signature));
		assert!(!key.verify(b"header.claimz", &signature));
		assert!(!key.verify(b"header.claims", b"short"));
	}

	#[test]
	fn jwk_conversion_rejects_unusable_keys() {
		let public = private_key().to_public_key();
		let mut ec = jwk_for(&public, "k1");

		ec.kty = "EC".into();

		let mut missing = jwk_for(&public, "k2");

		missing.n = None;

		let mut garbled = jwk_for(&public, "k3");

		garbled.e = Some("***".into());

		assert!(matches!(
			VerificationKey::from_jwk(&ec),
			Err(KeyMaterialError::UnsupportedKeyType { .. })
		));
		assert!(matches!(
			VerificationKey::from_jwk(&missing),
			Err(KeyMaterialError::MissingMember { member: "n" })
		));
		assert!(matches!(
			VerificationKey::from_jwk(&garbled),
			Err(KeyMaterialError::Encoding { member: "e", .. })
		));
	}

	#[test]
	fn static_key_accepts_pem_and_bare_der() {
		let public = private_key().to_public_key();
		let pem = public.to_public_key_pem(LineEnding::LF).expect("PEM should encode.");
		let bare = pem
			.lines()
			.filter(|line| !line.starts_with("-----"))
			.collect::<Vec<_>>()
			.join("\n");
		let signature = sign(b"payload");

		for encoded in [pem.as_str(), bare.as_str()] {
			let key = VerificationKey::from_public_key(encoded).expect("Static key should decode.");

			assert_eq!(key.public_key(), &public);
			assert_eq!(key.kid(), None);
			assert!(key.verify(b"payload", &signature));
		}
	}

	#[test]
	fn static_key_rejects_garbage() {
		assert!(matches!(
			VerificationKey::from_public_key("@@@"),
			Err(KeyMaterialError::PublicKeyEncoding(_))
		));
		assert!(matches!(
			VerificationKey::from_public_key("AAAA"),
			Err(KeyMaterialError::PublicKeyDecode { .. })
		));
	}
}
