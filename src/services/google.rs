use axum::async_trait;
use serde::Deserialize;

use super::error::ServiceError;
use crate::config::GoogleConfig;

const TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// Identity extracted from a verified federated assertion.
#[derive(Debug, Clone)]
pub struct VerifiedIdentity {
    pub email: String,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn verify(&self, id_token: &str) -> Result<VerifiedIdentity, ServiceError>;
}

#[derive(Clone)]
pub struct GoogleIdentityProvider {
    client: reqwest::Client,
    client_id: String,
}

#[derive(Debug, Deserialize)]
struct TokenInfoResponse {
    aud: String,
    email: String,
    email_verified: Option<String>,
    given_name: Option<String>,
    family_name: Option<String>,
}

impl GoogleIdentityProvider {
    pub fn new(config: &GoogleConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            client_id: config.client_id.clone(),
        }
    }
}

#[async_trait]
impl IdentityProvider for GoogleIdentityProvider {
    async fn verify(&self, id_token: &str) -> Result<VerifiedIdentity, ServiceError> {
        let response = self
            .client
            .get(TOKENINFO_URL)
            .query(&[("id_token", id_token)])
            .send()
            .await
            .map_err(|e| {
                ServiceError::Internal(anyhow::anyhow!(
                    "Failed to reach token verification endpoint: {}",
                    e
                ))
            })?;

        if !response.status().is_success() {
            return Err(ServiceError::InvalidAssertion);
        }

        let info: TokenInfoResponse = response
            .json()
            .await
            .map_err(|_| ServiceError::InvalidAssertion)?;

        if info.aud != self.client_id {
            tracing::warn!(aud = %info.aud, "Identity assertion issued for another client");
            return Err(ServiceError::InvalidAssertion);
        }

        if info.email_verified.as_deref() != Some("true") {
            return Err(ServiceError::InvalidAssertion);
        }

        Ok(VerifiedIdentity {
            email: info.email.to_lowercase(),
            given_name: info.given_name,
            family_name: info.family_name,
        })
    }
}

/// Test double returning a fixed identity for any assertion.
#[derive(Clone)]
pub struct MockIdentityProvider {
    pub identity: VerifiedIdentity,
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn verify(&self, _id_token: &str) -> Result<VerifiedIdentity, ServiceError> {
        Ok(self.identity.clone())
    }
}
