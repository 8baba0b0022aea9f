//! Identity tokens
//!
//! The gateway validates a token before every resource access and hands back a
//! freshly issued one with each successful response. Verification is behind the
//! [`TokenVerifier`] trait so the core never depends on a particular scheme.

use crate::error::Unauthorized;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Context string for deriving the signing key from the configured secret
const TOKEN_KEY_CONTEXT: &str = "folio 2024-05 identity token signing key";

/// Authenticated editor identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub user: String,
}

impl Identity {
    pub fn new(id: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            user: user.into(),
        }
    }
}

/// Opaque bearer token
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    pub fn new(raw: impl Into<String>) -> Self {
        Token(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Tokens end up in logs through Debug impls of larger structs.
impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token(<{} chars>)", self.0.len())
    }
}

/// Token verification collaborator
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &Token) -> Result<Identity, Unauthorized>;
    fn issue(&self, identity: &Identity) -> Token;
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    id: String,
    user: String,
    exp: i64,
}

/// Keyed-BLAKE3 signed tokens: `hex(claims json).hex(mac)`
pub struct SignedTokenVerifier {
    key: [u8; 32],
    ttl_secs: i64,
}

impl SignedTokenVerifier {
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        Self {
            key: blake3::derive_key(TOKEN_KEY_CONTEXT, secret.as_bytes()),
            ttl_secs: i64::try_from(ttl_secs).unwrap_or(i64::MAX),
        }
    }

    fn issue_with_expiry(&self, identity: &Identity, exp: i64) -> Token {
        let claims = serde_json::json!({
            "id": identity.id,
            "user": identity.user,
            "exp": exp,
        })
        .to_string();
        let mac = blake3::keyed_hash(&self.key, claims.as_bytes());
        Token(format!("{}.{}", hex::encode(claims.as_bytes()), mac.to_hex()))
    }
}

impl TokenVerifier for SignedTokenVerifier {
    fn verify(&self, token: &Token) -> Result<Identity, Unauthorized> {
        if token.is_empty() {
            return Err(Unauthorized("missing token".to_string()));
        }

        let (claims_hex, mac_hex) = token
            .as_str()
            .split_once('.')
            .ok_or_else(|| Unauthorized("malformed token".to_string()))?;
        let claims_bytes =
            hex::decode(claims_hex).map_err(|_| Unauthorized("malformed token".to_string()))?;
        let presented = blake3::Hash::from_hex(mac_hex)
            .map_err(|_| Unauthorized("malformed token signature".to_string()))?;

        // blake3::Hash equality is constant time
        if blake3::keyed_hash(&self.key, &claims_bytes) != presented {
            return Err(Unauthorized("bad token signature".to_string()));
        }

        let claims: Claims = serde_json::from_slice(&claims_bytes)
            .map_err(|_| Unauthorized("malformed token claims".to_string()))?;
        if claims.exp <= Utc::now().timestamp() {
            return Err(Unauthorized("token expired".to_string()));
        }

        Ok(Identity {
            id: claims.id,
            user: claims.user,
        })
    }

    fn issue(&self, identity: &Identity) -> Token {
        let exp = Utc::now().timestamp().saturating_add(self.ttl_secs);
        self.issue_with_expiry(identity, exp)
    }
}
