//! Ambient default credential discovery
//!
//! Mirrors Application Default Credentials: the gcloud well-known file first,
//! then the GCE metadata server.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::{AuthError, Result};
use crate::token::{AccessToken, TokenResponse};

const GCLOUD_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// A gcloud `authorized_user` entry from the well-known ADC file
#[derive(Debug, Deserialize)]
pub struct AuthorizedUser {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

impl AuthorizedUser {
    /// Refresh-token grant against the Google token endpoint
    pub async fn access_token(&self, client: &Client) -> Result<AccessToken> {
        debug!("Refreshing authorized_user credentials");

        let response = client
            .post(GCLOUD_TOKEN_URI)
            .form(&[
                ("grant_type", "refresh_token"),
                ("client_id", &self.client_id),
                ("client_secret", &self.client_secret),
                ("refresh_token", &self.refresh_token),
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

        let token: TokenResponse = response.json().await?;
        Ok(token.into_access_token())
    }
}

/// Path of the gcloud application-default credentials file, if the home
/// directory can be determined
pub fn well_known_file() -> Option<PathBuf> {
    let path = dirs::home_dir()?
        .join(".config")
        .join("gcloud")
        .join("application_default_credentials.json");
    path.exists().then_some(path)
}

/// Fetch a token for the given scope from the GCE metadata server
pub async fn metadata_token(client: &Client, scope: &str) -> Result<AccessToken> {
    debug!("Requesting token from metadata server");

    let response = client
        .get(METADATA_TOKEN_URL)
        .query(&[("scopes", scope)])
        .header("Metadata-Flavor", "Google")
        .timeout(Duration::from_secs(3))
        .send()
        .await
        .map_err(|e| {
            AuthError::NoAmbientCredentials(format!("Metadata server unreachable: {}", e))
        })?;

    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(AuthError::TokenExchange {
            status: status.as_u16(),
            message,
        });
    }

    let token: TokenResponse = response.json().await?;
    Ok(token.into_access_token())
}
