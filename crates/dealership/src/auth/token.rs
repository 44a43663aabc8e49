//! Signed bearer tokens.
//!
//! Tokens are HS256 JWTs: `header.payload.signature`, each part base64url
//! without padding. Only the claims this service issues are understood.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::debug;

use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

const MAX_TOKEN_LEN: usize = 2048;

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// Claims carried by a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub id: i64,
    /// Issued at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

/// Issues and verifies tokens with one shared secret.
pub struct TokenSigner {
    secret: Vec<u8>,
    ttl: Duration,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenSigner {
    /// Create a signer for `secret` issuing tokens valid for `ttl`.
    #[must_use]
    pub fn new(secret: impl AsRef<[u8]>, ttl: Duration) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
            ttl,
        }
    }

    /// Issue a token for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the claims can't be encoded.
    pub fn sign(&self, user_id: i64) -> Result<String> {
        let iat = Utc::now().timestamp();
        self.sign_claims(&Claims {
            id: user_id,
            iat,
            exp: iat + self.ttl.num_seconds(),
        })
    }

    fn sign_claims(&self, claims: &Claims) -> Result<String> {
        let header = Header {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        };
        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?),
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?)
        );
        let mac = self.mac(signing_input.as_bytes())?;
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        Ok(format!("{signing_input}.{signature}"))
    }

    /// Verify a token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns the standard unauthorized error if the token is malformed,
    /// carries a bad signature, or has expired.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        if token.len() > MAX_TOKEN_LEN {
            return Err(Error::not_authorized());
        }
        let mut parts = token.split('.');
        let (Some(header), Some(payload), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            debug!("rejecting token: wrong number of segments");
            return Err(Error::not_authorized());
        };

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| Error::not_authorized())?;
        let mut mac = self.mac(header.as_bytes())?;
        mac.update(b".");
        mac.update(payload.as_bytes());
        if mac.verify_slice(&signature).is_err() {
            debug!("rejecting token: signature mismatch");
            return Err(Error::not_authorized());
        }

        let header: Header = decode_part(header)?;
        if header.alg != "HS256" {
            debug!(alg = %header.alg, "rejecting token: unsupported algorithm");
            return Err(Error::not_authorized());
        }
        let claims: Claims = decode_part(payload)?;
        if claims.exp <= Utc::now().timestamp() {
            debug!(user_id = claims.id, "rejecting token: expired");
            return Err(Error::not_authorized());
        }
        Ok(claims)
    }

    fn mac(&self, data: &[u8]) -> Result<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| Error::internal(format!("invalid signing key: {e}")))?;
        mac.update(data);
        Ok(mac)
    }
}

fn decode_part<T: for<'de> Deserialize<'de>>(part: &str) -> Result<T> {
    let bytes = URL_SAFE_NO_PAD
        .decode(part)
        .map_err(|_| Error::not_authorized())?;
    serde_json::from_slice(&bytes).map_err(|_| Error::not_authorized())
}
