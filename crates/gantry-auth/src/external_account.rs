//! Workload Identity Federation flow
//!
//! An external (non-Google) identity token is read from the configured
//! credential source and exchanged at the STS endpoint for a federated access
//! token. When the configuration names a service account to impersonate, the
//! federated token is then traded for a service-account token carrying the
//! requested scope.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::{AuthError, Result};
use crate::token::AccessToken;

const TOKEN_EXCHANGE_GRANT: &str = "urn:ietf:params:oauth:grant-type:token-exchange";
const ACCESS_TOKEN_TYPE: &str = "urn:ietf:params:oauth:token-type:access_token";

/// Scope used for the STS leg when a service account is impersonated; the
/// impersonation call then narrows to the caller's scope.
const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// An `external_account` credential configuration file
#[derive(Debug, Deserialize)]
pub struct ExternalAccountConfig {
    pub audience: String,
    pub subject_token_type: String,
    pub token_url: String,
    #[serde(default)]
    pub service_account_impersonation_url: Option<String>,
    pub credential_source: CredentialSource,
}

/// Where the external subject token comes from
#[derive(Debug, Deserialize)]
pub struct CredentialSource {
    #[serde(default)]
    pub file: Option<PathBuf>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub format: Option<SourceFormat>,
}

/// Optional structured format of the subject token payload
#[derive(Debug, Deserialize)]
pub struct SourceFormat {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub subject_token_field_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StsResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImpersonationResponse {
    access_token: String,
    expire_time: String,
}

impl ExternalAccountConfig {
    /// Read the external identity token from the credential source
    async fn subject_token(&self, client: &Client) -> Result<String> {
        let raw = if let Some(path) = &self.credential_source.file {
            std::fs::read_to_string(path).map_err(|e| {
                AuthError::InvalidCredentials(format!(
                    "Failed to read subject token file {}: {}",
                    path.display(),
                    e
                ))
            })?
        } else if let Some(url) = &self.credential_source.url {
            let mut request = client.get(url);
            for (name, value) in &self.credential_source.headers {
                request = request.header(name, value);
            }
            let response = request.send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(AuthError::TokenExchange {
                    status: status.as_u16(),
                    message: format!("Subject token request to {} failed", url),
                });
            }
            response.text().await?
        } else {
            return Err(AuthError::InvalidCredentials(
                "External account credential_source has neither file nor url".to_string(),
            ));
        };

        self.extract_subject_token(&raw)
    }

    /// Apply the declared source format to the raw payload
    fn extract_subject_token(&self, raw: &str) -> Result<String> {
        match &self.credential_source.format {
            Some(format) if format.kind == "json" => {
                let field = format.subject_token_field_name.as_deref().ok_or_else(|| {
                    AuthError::InvalidCredentials(
                        "JSON credential source is missing subject_token_field_name".to_string(),
                    )
                })?;
                let value: serde_json::Value = serde_json::from_str(raw)?;
                value
                    .get(field)
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string())
                    .ok_or_else(|| {
                        AuthError::InvalidCredentials(format!(
                            "Subject token field '{}' not found in credential source",
                            field
                        ))
                    })
            }
            _ => Ok(raw.trim().to_string()),
        }
    }

    /// Exchange the subject token at the STS endpoint, impersonating the
    /// configured service account when one is declared
    pub async fn access_token(&self, client: &Client, scope: &str) -> Result<AccessToken> {
        let subject_token = self.subject_token(client).await?;

        // Impersonation narrows the scope in the second leg; a direct
        // federated token carries the caller's scope itself.
        let sts_scope = if self.service_account_impersonation_url.is_some() {
            CLOUD_PLATFORM_SCOPE
        } else {
            scope
        };

        debug!("Exchanging subject token at {}", self.token_url);

        let response = client
            .post(&self.token_url)
            .form(&[
                ("grant_type", TOKEN_EXCHANGE_GRANT),
                ("audience", &self.audience),
                ("scope", sts_scope),
                ("requested_token_type", ACCESS_TOKEN_TYPE),
                ("subject_token", &subject_token),
                ("subject_token_type", &self.subject_token_type),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AuthError::TokenExchange {
                status: status.as_u16(),
                message,
            });
        }

        let sts: StsResponse = response.json().await?;
        let federated = AccessToken {
            token: sts.access_token,
            expires_at: sts
                .expires_in
                .map(|s| Utc::now() + chrono::Duration::seconds(s)),
        };

        match &self.service_account_impersonation_url {
            Some(url) => self.impersonate(client, url, &federated, scope).await,
            None => Ok(federated),
        }
    }

    /// Trade the federated token for a service-account token with `scope`
    async fn impersonate(
        &self,
        client: &Client,
        url: &str,
        federated: &AccessToken,
        scope: &str,
    ) -> Result<AccessToken> {
        debug!("Impersonating service account via {}", url);

        let response = client
            .post(url)
            .bearer_auth(&federated.token)
            .json(&serde_json::json!({ "scope": [scope] }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AuthError::TokenExchange {
                status: status.as_u16(),
                message,
            });
        }

        let body: ImpersonationResponse = response.json().await?;
        let expires_at = DateTime::parse_from_rfc3339(&body.expire_time)
            .map(|t| t.with_timezone(&Utc))
            .ok();

        Ok(AccessToken {
            token: body.access_token,
            expires_at,
        })
    }
}
