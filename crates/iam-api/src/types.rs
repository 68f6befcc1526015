use serde::Deserialize;

/// Response of the IAM token exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct IamToken {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub token_type: String,
    /// Lifetime in seconds.
    pub expires_in: i64,
    /// Expiry as a unix timestamp.
    pub expiration: i64,
}

impl IamToken {
    /// A token is refreshed once 80% of its lifetime has elapsed.
    pub fn needs_refresh(&self, now: i64) -> bool {
        now >= self.expiration - self.expires_in / 5
    }
}
