//! Explicit caller identity passed into every remote operation.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::util::unix_timestamp_now;

const EXPIRY_SKEW_SECONDS: i64 = 60;

/// Current user identifier plus bearer credential.
///
/// Sourced from an external identity provider; the core never refreshes it.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionContext {
    user_id: String,
    credential: String,
    expires_at: Option<i64>,
}

impl SessionContext {
    /// `expires_at` is a Unix timestamp in seconds.
    pub fn new(
        user_id: impl Into<String>,
        credential: impl Into<String>,
        expires_at: Option<i64>,
    ) -> Self {
        Self {
            user_id: user_id.into().trim().to_string(),
            credential: clean_credential(&credential.into()),
            expires_at,
        }
    }

    /// Builds a session from a JWT id token, taking the expiry from its `exp` claim.
    pub fn from_id_token(user_id: impl Into<String>, token: impl Into<String>) -> Self {
        let credential = clean_credential(&token.into());
        let expires_at = jwt_expiry(&credential);
        Self {
            user_id: user_id.into().trim().to_string(),
            credential,
            expires_at,
        }
    }

    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    #[must_use]
    pub const fn expires_at(&self) -> Option<i64> {
        self.expires_at
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| expires_at <= unix_timestamp_now() + EXPIRY_SKEW_SECONDS)
    }

    /// Returns the credential, or `Error::Auth` when it is missing or expired.
    pub fn require_credential(&self) -> Result<&str> {
        if self.credential.is_empty() {
            return Err(Error::Auth("no credential available".to_string()));
        }
        if self.is_expired() {
            return Err(Error::Auth("credential has expired".to_string()));
        }
        Ok(&self.credential)
    }

    /// Returns the user identifier, or `Error::Validation` when it is empty.
    pub fn require_user(&self) -> Result<&str> {
        if self.user_id.is_empty() {
            return Err(Error::Validation(
                "no user identity is available for this session".to_string(),
            ));
        }
        Ok(&self.user_id)
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SessionContext")
            .field("user_id", &self.user_id)
            .field("credential", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Strip prefixes that end up in stored tokens by accident.
fn clean_credential(raw: &str) -> String {
    let mut value = raw.trim();
    for prefix in ["Bearer ", "bearer ", "access_token=", "id_token="] {
        if let Some(stripped) = value.strip_prefix(prefix) {
            value = stripped.trim();
        }
    }
    value.to_string()
}

#[derive(Debug, Deserialize)]
struct JwtClaims {
    exp: Option<i64>,
}

fn jwt_expiry(token: &str) -> Option<i64> {
    let payload = token.split('.').nth(1)?;
    let decoded = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    serde_json::from_slice::<JwtClaims>(&decoded).ok()?.exp
}
