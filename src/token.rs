//! Compact JWT codec: parsing, expiry, and claim inspection.
//!
//! [`Token::parse`] never fails. Malformed input yields a degraded token with default claims
//! (`exp == 0`) and no signed span, so every later check treats it as expired and unsigned.

pub mod access;
pub mod claims;

pub use claims::*;

// crates.io
use base64::{
	Engine as _, alphabet,
	engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
// self
use crate::_prelude::*;

/// Base64url engine that accepts segments with or without padding.
pub(crate) const BASE64_URL_LENIENT: GeneralPurpose = GeneralPurpose::new(
	&alphabet::URL_SAFE,
	GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const SEGMENT_SEPARATOR: char = '.';

/// A parsed compact token (access, refresh, or identity).
#[derive(Clone, Default, PartialEq)]
pub struct Token {
	raw: String,
	client_id: Option<String>,
	header: TokenHeader,
	claims: TokenClaims,
	signature: Vec<u8>,
	signed: Option<String>,
}
impl Token {
	/// Parses a compact `header.claims.signature` string.
	pub fn parse(compact: impl Into<String>) -> Self {
		let raw = compact.into();

		match decode_segments(&raw) {
			Some(Decoded { header, claims, signature, signed_len }) => {
				let signed = Some(raw[..signed_len].to_owned());

				Self { raw, client_id: None, header, claims, signature, signed }
			},
			None => Self { raw, ..Default::default() },
		}
	}

	/// Parses a token and records the client it was issued to, which unqualified role
	/// lookups resolve against.
	pub fn parse_for_client(compact: impl Into<String>, client_id: impl Into<String>) -> Self {
		let mut token = Self::parse(compact);

		token.client_id = Some(client_id.into());

		token
	}

	/// Returns the original compact string. Callers must avoid logging it.
	pub fn as_str(&self) -> &str {
		&self.raw
	}

	/// Client identifier recorded by [`Token::parse_for_client`].
	pub fn client_id(&self) -> Option<&str> {
		self.client_id.as_deref()
	}

	/// Decoded JOSE header.
	pub fn header(&self) -> &TokenHeader {
		&self.header
	}

	/// Decoded claim set.
	pub fn claims(&self) -> &TokenClaims {
		&self.claims
	}

	/// Raw signature bytes.
	pub fn signature(&self) -> &[u8] {
		&self.signature
	}

	/// Exact `header.claims` text the signature covers, or `None` when the token did not parse.
	pub fn signed(&self) -> Option<&str> {
		self.signed.as_deref()
	}

	/// Returns `true` if `exp` lies before `instant`.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		let now_ms = i64::try_from(instant.unix_timestamp_nanos() / 1_000_000).unwrap_or(i64::MAX);

		self.claims.exp.saturating_mul(1_000) < now_ms
	}

	/// Returns `true` if the token is expired relative to the current clock.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}
}
impl Debug for Token {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Token")
			.field("raw", &"<redacted>")
			.field("client_id", &self.client_id)
			.field("header", &self.header)
			.field("sub", &self.claims.sub)
			.field("iss", &self.claims.iss)
			.field("exp", &self.claims.exp)
			.field("signed", &self.signed.is_some())
			.finish()
	}
}

/// A token supplied either as its compact string or as an already parsed [`Token`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TokenRef<'a> {
	/// Compact string as received from a client.
	Raw(&'a str),
	/// Token parsed earlier.
	Parsed(&'a Token),
}
impl<'a> TokenRef<'a> {
	/// Compact string form sent to the authorization server.
	pub fn as_str(&self) -> &'a str {
		match self {
			Self::Raw(raw) => raw,
			Self::Parsed(token) => token.as_str(),
		}
	}
}
impl<'a> From<&'a str> for TokenRef<'a> {
	fn from(value: &'a str) -> Self {
		Self::Raw(value)
	}
}
impl<'a> From<&'a String> for TokenRef<'a> {
	fn from(value: &'a String) -> Self {
		Self::Raw(value)
	}
}
impl<'a> From<&'a Token> for TokenRef<'a> {
	fn from(value: &'a Token) -> Self {
		Self::Parsed(value)
	}
}

struct Decoded {
	header: TokenHeader,
	claims: TokenClaims,
	signature: Vec<u8>,
	signed_len: usize,
}

fn decode_segments(raw: &str) -> Option<Decoded> {
	let mut segments = raw.split(SEGMENT_SEPARATOR);
	let (header, claims, signature) = (segments.next()?, segments.next()?, segments.next()?);

	if segments.next().is_some() {
		return None;
	}

	let header = serde_json::from_slice(&BASE64_URL_LENIENT.decode(header).ok()?).ok()?;
	let signed_len = raw.len() - signature.len() - SEGMENT_SEPARATOR.len_utf8();
	let claims = serde_json::from_slice(&BASE64_URL_LENIENT.decode(claims).ok()?).ok()?;
	let signature = BASE64_URL_LENIENT.decode(signature).ok()?;

	Some(Decoded { header, claims, signature, signed_len })
}
