use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::error::ServiceError;
use crate::config::TokenConfig;
use crate::error::AppError;

/// Which signing secret a token belongs to. The two domains are not
/// substitutable: a token issued under one never verifies under the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustDomain {
    User,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (account ID)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Token pair returned to clients on sign-in
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    #[schema(example = 3600)]
    pub expires_in: i64,
}

/// Issues and verifies HS256 bearer tokens, one secret per trust domain
#[derive(Clone)]
pub struct TokenService {
    user_encoding: EncodingKey,
    user_decoding: DecodingKey,
    admin_encoding: EncodingKey,
    admin_decoding: DecodingKey,
    access_token_expiry_minutes: i64,
    refresh_token_expiry_days: i64,
}

impl TokenService {
    pub fn new(config: &TokenConfig) -> Result<Self, AppError> {
        if config.user_secret.is_empty() || config.admin_secret.is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "Token signing secrets must not be empty"
            )));
        }

        Ok(Self {
            user_encoding: EncodingKey::from_secret(config.user_secret.as_bytes()),
            user_decoding: DecodingKey::from_secret(config.user_secret.as_bytes()),
            admin_encoding: EncodingKey::from_secret(config.admin_secret.as_bytes()),
            admin_decoding: DecodingKey::from_secret(config.admin_secret.as_bytes()),
            access_token_expiry_minutes: config.access_token_expiry_minutes,
            refresh_token_expiry_days: config.refresh_token_expiry_days,
        })
    }

    /// Issue a token for an account under the given trust domain
    pub fn issue(
        &self,
        account_id: &str,
        domain: TrustDomain,
        kind: TokenKind,
    ) -> Result<String, ServiceError> {
        let now = Utc::now();
        let exp = match kind {
            TokenKind::Access => now + Duration::minutes(self.access_token_expiry_minutes),
            TokenKind::Refresh => now + Duration::days(self.refresh_token_expiry_days),
        };

        let claims = Claims {
            sub: account_id.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        let key = match domain {
            TrustDomain::User => &self.user_encoding,
            TrustDomain::Admin => &self.admin_encoding,
        };

        encode(&Header::new(Algorithm::HS256), &claims, key)
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Failed to encode token: {}", e)))
    }

    /// Issue an access + refresh pair under the given trust domain
    pub fn issue_pair(
        &self,
        account_id: &str,
        domain: TrustDomain,
    ) -> Result<TokenPair, ServiceError> {
        let access_token = self.issue(account_id, domain, TokenKind::Access)?;
        let refresh_token = self.issue(account_id, domain, TokenKind::Refresh)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry_seconds(),
        })
    }

    /// Verify a token against the given trust domain's secret. Expiry is
    /// reported distinctly from every other failure.
    pub fn verify(&self, token: &str, domain: TrustDomain) -> Result<Claims, ServiceError> {
        let key = match domain {
            TrustDomain::User => &self.user_decoding,
            TrustDomain::Admin => &self.admin_decoding,
        };

        let validation = Validation::new(Algorithm::HS256);
        match decode::<Claims>(token, key, &validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => Err(ServiceError::TokenExpired),
                _ => Err(ServiceError::InvalidToken),
            },
        }
    }

    /// Access token expiry in seconds (for client info)
    pub fn access_token_expiry_seconds(&self) -> i64 {
        self.access_token_expiry_minutes * 60
    }
}
