//! Identity provider integration
//!
//! Bearer tokens are HS256 JWTs signed by the provider and verified locally.
//! Account provisioning goes through the provider's admin REST API.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::IdentityConfig;
use crate::error::{AppError, AppResult};

/// Claims carried by provider-issued tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Provider account id
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub iss: Option<String>,
}

/// Verify a bearer token's signature, expiry and (optionally) issuer
pub fn verify_token(token: &str, secret: &str, issuer: Option<&str>) -> Result<Claims, String> {
    let mut validation = Validation::new(Algorithm::HS256);
    if let Some(iss) = issuer {
        validation.set_issuer(&[iss]);
    }

    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| format!("Token inválido: {}", e))
}

/// Identity provider admin API client
#[derive(Clone)]
pub struct IdentityClient {
    client: Client,
    base_url: String,
    api_key: String,
    invite_redirect_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateAccountRequest<'a> {
    email: &'a str,
    password: &'a str,
    display_name: &'a str,
}

#[derive(Deserialize)]
struct CreateAccountResponse {
    uid: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResetLinkRequest<'a> {
    email: &'a str,
    continue_url: &'a str,
}

#[derive(Deserialize)]
struct ResetLinkResponse {
    link: String,
}

impl IdentityClient {
    pub fn new(config: &IdentityConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            invite_redirect_url: config.invite_redirect_url.clone(),
        }
    }

    /// Create a provider account and return its uid
    pub async fn create_account(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> AppResult<String> {
        let url = format!("{}/v1/accounts", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .json(&CreateAccountRequest {
                email,
                password,
                display_name,
            })
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Falha ao contatar provedor de identidade: {}", e)))?;

        if response.status() == StatusCode::CONFLICT {
            return Err(AppError::Conflict(
                "Email já cadastrado no provedor de identidade".to_string(),
            ));
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalService(format!(
                "Provedor de identidade respondeu {} - {}",
                status, body
            )));
        }

        let created: CreateAccountResponse = response.json().await.map_err(|e| {
            AppError::ExternalService(format!("Resposta inválida do provedor de identidade: {}", e))
        })?;
        Ok(created.uid)
    }

    /// Generate a password-reset link, used as the invite link for new staff
    pub async fn password_reset_link(&self, email: &str) -> AppResult<String> {
        let url = format!("{}/v1/accounts:resetLink", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .json(&ResetLinkRequest {
                email,
                continue_url: &self.invite_redirect_url,
            })
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Falha ao contatar provedor de identidade: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalService(format!(
                "Falha ao gerar link de convite: {} - {}",
                status, body
            )));
        }

        let link: ResetLinkResponse = response.json().await.map_err(|e| {
            AppError::ExternalService(format!("Resposta inválida do provedor de identidade: {}", e))
        })?;
        Ok(link.link)
    }
}
