use jsonwebtoken::{DecodingKey, Validation};
use serde::Deserialize;
use tracing::debug;

use crate::{Error, Result};

/// Account the client acts for, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountContext {
    account_id: String,
}

impl AccountContext {
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
        }
    }

    /// Read the account from a freshly issued IAM access token.
    ///
    /// The signature is not checked: the token comes straight from the token
    /// exchange and only the `account.bss` claim is read from it. Nothing
    /// decoded here may be used for authorization.
    pub fn from_access_token(token: &str) -> Result<Self> {
        let mut validation = Validation::default();
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let data = jsonwebtoken::decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(&[]),
            &validation,
        )
        .map_err(|e| {
            debug!(error = %e, "could not decode iam access token");
            Error::MissingAccountId
        })?;

        data.claims
            .account
            .and_then(|account| account.bss)
            .filter(|bss| !bss.is_empty())
            .map(Self::new)
            .ok_or(Error::MissingAccountId)
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }
}

#[derive(Deserialize)]
struct TokenClaims {
    #[serde(default)]
    account: Option<AccountClaim>,
}

#[derive(Deserialize)]
struct AccountClaim {
    #[serde(default)]
    bss: Option<String>,
}
