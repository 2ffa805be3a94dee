//! Access token types shared by all credential flows

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

/// A resolved OAuth2 bearer token
///
/// Lifetime is the process invocation; nothing is persisted.
#[derive(Debug, Clone)]
pub struct AccessToken {
    /// The bearer token value
    pub token: String,

    /// Expiry reported by the token endpoint, if any
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    /// Whether the token is still valid at `now`
    pub fn is_valid(&self) -> bool {
        match self.expires_at {
            Some(expires) => Utc::now() < expires,
            None => true,
        }
    }
}

/// Standard OAuth token endpoint response
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

impl TokenResponse {
    pub(crate) fn into_access_token(self) -> AccessToken {
        AccessToken {
            token: self.access_token,
            expires_at: self.expires_in.map(|s| Utc::now() + Duration::seconds(s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_without_expiry_is_valid() {
        let token = AccessToken {
            token: "t".to_string(),
            expires_at: None,
        };
        assert!(token.is_valid());
    }

    #[test]
    fn expired_token_is_invalid() {
        let token = AccessToken {
            token: "t".to_string(),
            expires_at: Some(Utc::now() - Duration::minutes(1)),
        };
        assert!(!token.is_valid());
    }

    #[test]
    fn response_expiry_lands_in_the_future() {
        let token = TokenResponse {
            access_token: "t".to_string(),
            expires_in: Some(3600),
        }
        .into_access_token();
        assert!(token.is_valid());
        assert!(token.expires_at.unwrap() > Utc::now());
    }
}
