use std::path::Path;

use anyhow::Context;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use rsa::RsaPrivateKey;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::{SignatureEncoding, SignerMut};
use sha2::Sha256;

use super::entity::AppClaims;

const JWT_HEADER: &str = r#"{"alg":"RS256","typ":"JWT"}"#;
// clock drift allowance, github rejects tokens issued in the future
const ISSUED_AT_SKEW_SECS: i64 = 60;
// github caps the lifetime at 10 minutes
const LIFETIME_SECS: i64 = 9 * 60;

/// Private key of the GitHub App, used to sign RS256 application tokens.
#[derive(Clone)]
pub struct AppKey {
    app_id: u64,
    private_key: RsaPrivateKey,
}

impl std::fmt::Debug for AppKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppKey")
            .field("app_id", &self.app_id)
            .finish_non_exhaustive()
    }
}

impl AppKey {
    pub fn from_path(app_id: u64, path: &Path) -> anyhow::Result<Self> {
        let pem = std::fs::read_to_string(path)
            .with_context(|| format!("unable to read private key file {path:?}"))?;
        Self::from_pem(app_id, &pem)
    }

    /// Accepts PKCS#1 (as downloaded from GitHub) and PKCS#8 encodings.
    pub fn from_pem(app_id: u64, pem: &str) -> anyhow::Result<Self> {
        let private_key = RsaPrivateKey::from_pkcs1_pem(pem)
            .or_else(|_| RsaPrivateKey::from_pkcs8_pem(pem))
            .context("unable to parse RSA private key from PEM")?;
        Ok(Self {
            app_id,
            private_key,
        })
    }

    pub fn app_id(&self) -> u64 {
        self.app_id
    }

    pub fn encode_jwt(&self, now: DateTime<Utc>) -> anyhow::Result<String> {
        let claims = AppClaims {
            iat: now.timestamp() - ISSUED_AT_SKEW_SECS,
            exp: now.timestamp() + LIFETIME_SECS,
            iss: self.app_id.to_string(),
        };
        let claims = serde_json::to_vec(&claims).context("unable to serialize claims")?;

        let mut token = URL_SAFE_NO_PAD.encode(JWT_HEADER);
        token.push('.');
        token.push_str(&URL_SAFE_NO_PAD.encode(claims));

        let mut signing_key = SigningKey::<Sha256>::new(self.private_key.clone());
        let signature = signing_key
            .try_sign(token.as_bytes())
            .context("unable to sign application token")?;
        token.push('.');
        token.push_str(&URL_SAFE_NO_PAD.encode(signature.to_vec()));

        Ok(token)
    }
}
