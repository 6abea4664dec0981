//! Compact `header.payload.signature` encoding for session tokens, HMAC-SHA256
//! over the first two segments.

use base64ct::{Base64UrlUnpadded, Encoding};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::crypto::hmac::{self, HmacAlgorithm};
use crate::error::{Error, Result};

const ALGORITHM: &str = "HS256";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct Header {
    alg: String,
    typ: String,
}

impl Header {
    fn hs256() -> Self {
        Self {
            alg: ALGORITHM.to_string(),
            typ: "JWT".to_string(),
        }
    }
}

/// Session token payload. Every field is optional on the wire so that each
/// missing field maps to its own rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub(crate) struct Payload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jtk: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jts: Option<String>,
}

fn b64e_json<T: Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_vec(value).map_err(|_| Error::Encryption)?;
    Ok(Base64UrlUnpadded::encode_string(&json))
}

fn b64d_json<T: for<'de> Deserialize<'de>>(segment: &str, what: &str) -> Result<T> {
    let bytes = Base64UrlUnpadded::decode_vec(segment)
        .map_err(|_| Error::invalid_token(format!("{what} is not base64url")))?;
    serde_json::from_slice(&bytes).map_err(|_| Error::invalid_token(format!("{what} is malformed")))
}

fn mac(key: &[u8], signing_input: &str) -> Result<Vec<u8>> {
    hmac::sign(HmacAlgorithm::Sha256, key, signing_input.as_bytes())
}

pub(crate) fn sign(payload: &Payload, key: &[u8]) -> Result<String> {
    let signing_input = format!("{}.{}", b64e_json(&Header::hs256())?, b64e_json(payload)?);
    let signature = Base64UrlUnpadded::encode_string(&mac(key, &signing_input)?);
    Ok(format!("{signing_input}.{signature}"))
}

/// Check the outer signature and return the payload.
///
/// Anything wrong with the signature segment is `InvalidSignature`; structural
/// problems elsewhere are `InvalidToken`.
pub(crate) fn verify(token: &str, key: &[u8]) -> Result<Payload> {
    let mut parts = token.trim().split('.');
    let (Some(header_b64), Some(payload_b64), Some(signature_b64), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(Error::invalid_token("token format is invalid"));
    };

    let header: Header = b64d_json(header_b64, "header")?;
    if header.alg != ALGORITHM {
        return Err(Error::invalid_token(format!(
            "unsupported algorithm: {}",
            header.alg
        )));
    }

    let signature =
        Base64UrlUnpadded::decode_vec(signature_b64).map_err(|_| Error::InvalidSignature)?;
    let expected = mac(key, &format!("{header_b64}.{payload_b64}"))?;
    if !bool::from(expected.ct_eq(&signature)) {
        return Err(Error::InvalidSignature);
    }

    b64d_json(payload_b64, "payload")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"session-signing-key";

    fn payload() -> Payload {
        Payload {
            iat: Some(1_700_000_000),
            jti: Some("sid".to_string()),
            uid: Some("u1".to_string()),
            jtk: Some("access".to_string()),
            jts: Some("sig".to_string()),
        }
    }

    #[test]
    fn sign_then_verify() {
        let token = sign(&payload(), KEY).unwrap();
        assert_eq!(token.split('.').count(), 3);
        assert_eq!(verify(&token, KEY).unwrap(), payload());
    }

    #[test]
    fn header_is_hs256_jwt() {
        let token = sign(&payload(), KEY).unwrap();
        let header = token.split('.').next().unwrap();
        let json = Base64UrlUnpadded::decode_vec(header).unwrap();
        assert_eq!(json, br#"{"alg":"HS256","typ":"JWT"}"#);
    }

    #[test]
    fn wrong_key_is_invalid_signature() {
        let token = sign(&payload(), KEY).unwrap();
        assert!(matches!(
            verify(&token, b"other-key"),
            Err(Error::InvalidSignature)
        ));
    }

    #[test]
    fn undecodable_signature_is_invalid_signature() {
        let token = sign(&payload(), KEY).unwrap();
        let (head, _) = token.rsplit_once('.').unwrap();
        assert!(matches!(
            verify(&format!("{head}.***"), KEY),
            Err(Error::InvalidSignature)
        ));
    }

    #[test]
    fn modified_payload_is_invalid_signature() {
        let token = sign(&payload(), KEY).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let mut other = payload();
        other.uid = Some("u2".to_string());
        let forged_payload = b64e_json(&other).unwrap();
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);
        assert!(matches!(verify(&forged, KEY), Err(Error::InvalidSignature)));
    }

    #[test]
    fn structural_failures_are_invalid_token() {
        for token in ["", "a.b", "a.b.c.d", "!!.e30.sig"] {
            assert!(
                matches!(verify(token, KEY), Err(Error::InvalidToken(_))),
                "{token:?}"
            );
        }
    }

    #[test]
    fn other_algorithms_are_rejected() {
        let header = b64e_json(&Header {
            alg: "none".to_string(),
            typ: "JWT".to_string(),
        })
        .unwrap();
        let body = b64e_json(&payload()).unwrap();
        assert!(matches!(
            verify(&format!("{header}.{body}."), KEY),
            Err(Error::InvalidToken(_))
        ));
    }

    #[test]
    fn absent_fields_are_omitted() {
        let token = sign(&Payload::default(), KEY).unwrap();
        let body = token.split('.').nth(1).unwrap();
        assert_eq!(Base64UrlUnpadded::decode_vec(body).unwrap(), b"{}");
    }
}
