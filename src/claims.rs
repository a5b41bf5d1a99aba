use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

/// Claims carried by every issued token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject the token was issued for
    pub sub: String,
    /// Issued-at time as Unix timestamp
    pub iat: i64,
    /// Expiration time as Unix timestamp
    pub exp: i64,
}

impl TokenClaims {
    /// Claims issued at `now` and valid for `ttl`
    pub fn issue(subject: impl Into<String>, now: i64, ttl: Duration) -> Self {
        let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        Self {
            sub: subject.into(),
            iat: now,
            exp: now.saturating_add(ttl),
        }
    }

    /// Whether the token is past its expiry at `now`
    pub fn is_expired_at(&self, now: i64) -> bool {
        now > self.exp
    }
}
