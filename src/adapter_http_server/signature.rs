//! Webhook authentication.
//!
//! The sender signs the raw request body with a shared secret and sends the
//! hex encoded HMAC in `X-Hub-Signature-256` (`sha256=...`). The legacy
//! `X-Hub-Signature` (`sha1=...`) is only looked at when the former is absent.

use std::sync::Arc;

use axum::http::{HeaderMap, HeaderValue};
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;

use crate::domain::Error;

pub const SIGNATURE_256_HEADER: &str = "x-hub-signature-256";
pub const LEGACY_SIGNATURE_HEADER: &str = "x-hub-signature";

#[derive(Clone, Default)]
pub struct SignatureVerifier {
    secret: Option<Arc<[u8]>>,
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl SignatureVerifier {
    /// Without a secret every request is accepted.
    pub fn new(secret: Option<&str>) -> Self {
        Self {
            secret: secret
                .filter(|value| !value.is_empty())
                .map(|value| Arc::from(value.as_bytes())),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.secret.is_some()
    }

    pub fn verify(&self, headers: &HeaderMap, body: &[u8]) -> Result<(), Error> {
        let Some(secret) = self.secret.as_deref() else {
            return Ok(());
        };
        if let Some(value) = headers.get(SIGNATURE_256_HEADER) {
            return verify_with::<Hmac<Sha256>>(secret, "sha256=", value, body);
        }
        if let Some(value) = headers.get(LEGACY_SIGNATURE_HEADER) {
            return verify_with::<Hmac<Sha1>>(secret, "sha1=", value, body);
        }
        Err(Error::Signature("missing signature header"))
    }
}

fn verify_with<M>(secret: &[u8], prefix: &str, value: &HeaderValue, body: &[u8]) -> Result<(), Error>
where
    M: Mac + KeyInit,
{
    let value = value
        .to_str()
        .map_err(|_| Error::Signature("malformed signature header"))?;
    let digest = value
        .strip_prefix(prefix)
        .ok_or(Error::Signature("unsupported signature algorithm"))?;
    let expected =
        hex::decode(digest).map_err(|_| Error::Signature("signature is not hexadecimal"))?;

    let mut mac = <M as KeyInit>::new_from_slice(secret)
        .map_err(|_| Error::Signature("unusable secret"))?;
    Mac::update(&mut mac, body);
    // constant time comparison
    mac.verify_slice(&expected)
        .map_err(|_| Error::Signature("signature mismatch"))
}

#[cfg(test)]
pub(crate) mod tests {
    use axum::http::{HeaderMap, HeaderValue};
    use hmac::{Hmac, Mac};
    use sha1::Sha1;
    use sha2::Sha256;

    use super::{LEGACY_SIGNATURE_HEADER, SIGNATURE_256_HEADER, SignatureVerifier};
    use crate::domain::Error;

    const SECRET: &str = "It's a Secret to Everybody";
    const BODY: &[u8] = br#"{"action":"published","release":{"tag_name":"v1.0.0"}}"#;

    pub(crate) fn sign_sha256(secret: &str, body: &[u8]) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
    }

    fn sign_sha1(secret: &str, body: &[u8]) -> String {
        let mut mac = Hmac::<Sha1>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        format!("sha1={}", hex::encode(mac.finalize().into_bytes()))
    }

    fn headers(entries: &[(&'static str, &str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in entries {
            headers.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        headers
    }

    #[test]
    fn should_match_github_reference_signature() {
        // example published in the GitHub webhook documentation
        assert_eq!(
            sign_sha256(SECRET, b"Hello, World!"),
            "sha256=757107ea0eb2509fc211221cce984b8a37570b6d7586c22c46f4379c8b043e17"
        );
    }

    #[test]
    fn should_accept_valid_signature() {
        let verifier = SignatureVerifier::new(Some(SECRET));
        let headers = headers(&[(SIGNATURE_256_HEADER, &sign_sha256(SECRET, BODY))]);
        verifier.verify(&headers, BODY).unwrap();
    }

    #[test]
    fn should_accept_uppercase_hex_digest() {
        let verifier = SignatureVerifier::new(Some(SECRET));
        let signature = sign_sha256(SECRET, BODY);
        let (prefix, digest) = signature.split_at("sha256=".len());
        let signature = format!("{prefix}{}", digest.to_uppercase());
        verifier
            .verify(&headers(&[(SIGNATURE_256_HEADER, &signature)]), BODY)
            .unwrap();
    }

    #[test]
    fn should_reject_any_single_byte_body_mutation() {
        let verifier = SignatureVerifier::new(Some(SECRET));
        let headers = headers(&[(SIGNATURE_256_HEADER, &sign_sha256(SECRET, BODY))]);
        for index in 0..BODY.len() {
            let mut body = BODY.to_vec();
            body[index] ^= 0x01;
            let err = verifier.verify(&headers, &body).unwrap_err();
            assert!(matches!(err, Error::Signature(_)), "index {index}");
        }
    }

    #[test]
    fn should_reject_any_single_character_signature_mutation() {
        let verifier = SignatureVerifier::new(Some(SECRET));
        let signature = sign_sha256(SECRET, BODY);
        for index in 0..signature.len() {
            let mut mutated = signature.clone().into_bytes();
            mutated[index] = if mutated[index] == b'0' { b'1' } else { b'0' };
            let mutated = String::from_utf8(mutated).unwrap();
            let headers = headers(&[(SIGNATURE_256_HEADER, &mutated)]);
            let err = verifier.verify(&headers, BODY).unwrap_err();
            assert!(matches!(err, Error::Signature(_)), "index {index}");
        }
    }

    #[test]
    fn should_reject_wrong_secret() {
        let verifier = SignatureVerifier::new(Some(SECRET));
        let headers = headers(&[(SIGNATURE_256_HEADER, &sign_sha256("other", BODY))]);
        assert!(matches!(
            verifier.verify(&headers, BODY),
            Err(Error::Signature("signature mismatch"))
        ));
    }

    #[test]
    fn should_reject_missing_signature() {
        let verifier = SignatureVerifier::new(Some(SECRET));
        assert!(matches!(
            verifier.verify(&HeaderMap::new(), BODY),
            Err(Error::Signature("missing signature header"))
        ));
    }

    #[test]
    fn should_accept_legacy_signature_when_strong_one_is_absent() {
        let verifier = SignatureVerifier::new(Some(SECRET));
        let headers = headers(&[(LEGACY_SIGNATURE_HEADER, &sign_sha1(SECRET, BODY))]);
        verifier.verify(&headers, BODY).unwrap();
    }

    #[test]
    fn should_prefer_strong_signature_over_legacy_one() {
        let verifier = SignatureVerifier::new(Some(SECRET));
        let headers = headers(&[
            (SIGNATURE_256_HEADER, &sign_sha256("other", BODY)),
            (LEGACY_SIGNATURE_HEADER, &sign_sha1(SECRET, BODY)),
        ]);
        assert!(verifier.verify(&headers, BODY).is_err());
    }

    #[test]
    fn should_reject_algorithm_mismatch() {
        let verifier = SignatureVerifier::new(Some(SECRET));
        let signature = sign_sha1(SECRET, BODY);
        let headers = headers(&[(SIGNATURE_256_HEADER, &signature)]);
        assert!(matches!(
            verifier.verify(&headers, BODY),
            Err(Error::Signature("unsupported signature algorithm"))
        ));
    }

    #[test]
    fn should_skip_verification_without_secret() {
        for verifier in [SignatureVerifier::new(None), SignatureVerifier::new(Some(""))] {
            assert!(!verifier.is_enabled());
            verifier.verify(&HeaderMap::new(), BODY).unwrap();
        }
    }
}
