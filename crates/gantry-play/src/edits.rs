//! Edits transaction client
//!
//! Drives the linear publish workflow: open an edit, upload the bundle,
//! assign the new version to a track, commit. Each stage is a single API
//! call; the first failure ends the workflow with no further calls and no
//! explicit abandonment (open edits expire server-side).

use std::path::Path;

use gantry_auth::AccessToken;
use reqwest::Client;
use tracing::{debug, info};

use crate::error::{PlayError, Result};
use crate::types::{AppEdit, BundleInfo, PublishReceipt, TrackUpdate};

const API_BASE_URL: &str = "https://androidpublisher.googleapis.com/androidpublisher/v3";
const UPLOAD_BASE_URL: &str = "https://androidpublisher.googleapis.com/upload/androidpublisher/v3";

/// Google Play Developer API client for one package
pub struct EditsClient {
    package_name: String,
    client: Client,
    token: AccessToken,
    api_base_url: String,
    upload_base_url: String,
}

impl EditsClient {
    /// Create a client for `package_name` using a resolved access token
    ///
    /// Takes the HTTP client so the credential-resolution client is reused
    /// for the publish calls.
    pub fn new(package_name: impl Into<String>, client: Client, token: AccessToken) -> Self {
        Self {
            package_name: package_name.into(),
            client,
            token,
            api_base_url: API_BASE_URL.to_string(),
            upload_base_url: UPLOAD_BASE_URL.to_string(),
        }
    }

    /// Redirect both API surfaces at a local server
    #[cfg(test)]
    fn with_base_urls(mut self, api_base_url: &str, upload_base_url: &str) -> Self {
        self.api_base_url = api_base_url.to_string();
        self.upload_base_url = upload_base_url.to_string();
        self
    }

    /// Make an authenticated JSON API request
    async fn api_request<T: serde::de::DeserializeOwned>(
        &self,
        method: reqwest::Method,
        endpoint: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T> {
        let url = format!("{}{}", self.api_base_url, endpoint);

        let mut request = self
            .client
            .request(method.clone(), &url)
            .bearer_auth(&self.token.token)
            .header("Content-Type", "application/json");

        if let Some(body) = body {
            request = request.json(&body);
        }

        debug!("Making {} request to {}", method, url);

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PlayError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }

    /// Open a new edit transaction for the package
    pub async fn create_edit(&self) -> Result<AppEdit> {
        let endpoint = format!("/applications/{}/edits", self.package_name);
        self.api_request(reqwest::Method::POST, &endpoint, Some(serde_json::json!({})))
            .await
    }

    /// Upload the bundle into the open edit
    pub async fn upload_bundle(&self, edit_id: &str, path: &Path) -> Result<BundleInfo> {
        let url = format!(
            "{}/applications/{}/edits/{}/bundles",
            self.upload_base_url, self.package_name, edit_id
        );

        let file_content = tokio::fs::read(path).await?;

        debug!(
            "Uploading {} bytes from {} to edit {}",
            file_content.len(),
            path.display(),
            edit_id
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token.token)
            .header("Content-Type", "application/octet-stream")
            .body(file_content)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PlayError::UploadFailed(format!("{}: {}", status, message)));
        }

        Ok(response.json().await?)
    }

    /// Assign the uploaded version to a track on the open edit
    pub async fn update_track(&self, edit_id: &str, update: &TrackUpdate) -> Result<TrackUpdate> {
        let endpoint = format!(
            "/applications/{}/edits/{}/tracks/{}",
            self.package_name, edit_id, update.track
        );

        self.api_request(
            reqwest::Method::PUT,
            &endpoint,
            Some(serde_json::to_value(update)?),
        )
        .await
    }

    /// Commit the edit, making its changes live
    pub async fn commit_edit(&self, edit_id: &str) -> Result<AppEdit> {
        let endpoint = format!(
            "/applications/{}/edits/{}:commit",
            self.package_name, edit_id
        );

        self.api_request(reqwest::Method::POST, &endpoint, None).await
    }

    /// Run the full publish workflow for a local bundle
    ///
    /// Stops at the first failed stage; no later calls are made.
    pub async fn publish(&self, aab_path: &Path, track: &str) -> Result<PublishReceipt> {
        if !aab_path.exists() {
            return Err(PlayError::InvalidArtifact(format!(
                "Bundle not found: {}",
                aab_path.display()
            )));
        }

        info!("Creating edit transaction for {}", self.package_name);
        let edit = self.create_edit().await?;
        info!("Edit created: {}", edit.id);

        info!("Uploading {}", aab_path.display());
        let bundle = self.upload_bundle(&edit.id, aab_path).await?;
        info!("Bundle uploaded, version code {}", bundle.version_code);

        info!("Assigning version {} to track '{}'", bundle.version_code, track);
        let update = TrackUpdate::completed(track, bundle.version_code);
        let assigned = self.update_track(&edit.id, &update).await?;
        info!("Assigned to track: {}", assigned.track);

        info!("Committing edit {}", edit.id);
        let committed = self.commit_edit(&edit.id).await?;
        info!("Edit committed: {}", committed.id);

        Ok(PublishReceipt {
            edit_id: edit.id,
            version_code: bundle.version_code,
            track: assigned.track,
            commit_id: committed.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    use gantry_auth::AccessToken;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn token() -> AccessToken {
        AccessToken {
            token: "test-token".to_string(),
            expires_at: None,
        }
    }

    fn temp_bundle() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"fake aab bytes").unwrap();
        file
    }

    /// Minimal single-request-per-connection HTTP server recording the
    /// request line of every call it serves.
    struct StubServer {
        addr: std::net::SocketAddr,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl StubServer {
        async fn spawn(fail_upload: bool) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            let calls = Arc::new(Mutex::new(Vec::new()));
            let recorded = Arc::clone(&calls);

            tokio::spawn(async move {
                while let Ok((mut stream, _)) = listener.accept().await {
                    let recorded = Arc::clone(&recorded);
                    tokio::spawn(async move {
                        let mut buf = Vec::new();
                        let mut chunk = [0u8; 4096];

                        // Read headers, then the declared body length.
                        let header_end = loop {
                            match stream.read(&mut chunk).await {
                                Ok(0) | Err(_) => return,
                                Ok(n) => buf.extend_from_slice(&chunk[..n]),
                            }
                            if let Some(pos) = buf
                                .windows(4)
                                .position(|w| w == b"\r\n\r\n")
                            {
                                break pos;
                            }
                        };

                        let headers =
                            String::from_utf8_lossy(&buf[..header_end]).to_string();
                        let content_length = headers
                            .lines()
                            .find_map(|line| {
                                line.to_ascii_lowercase()
                                    .strip_prefix("content-length:")
                                    .and_then(|v| v.trim().parse::<usize>().ok())
                            })
                            .unwrap_or(0);

                        while buf.len() < header_end + 4 + content_length {
                            match stream.read(&mut chunk).await {
                                Ok(0) | Err(_) => return,
                                Ok(n) => buf.extend_from_slice(&chunk[..n]),
                            }
                        }

                        let request_line =
                            headers.lines().next().unwrap_or_default().to_string();
                        recorded.lock().unwrap().push(request_line.clone());

                        let (status, body) = Self::respond(&request_line, fail_upload);
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status,
                            body.len(),
                            body
                        );
                        let _ = stream.write_all(response.as_bytes()).await;
                        let _ = stream.shutdown().await;
                    });
                }
            });

            Self { addr, calls }
        }

        fn respond(request_line: &str, fail_upload: bool) -> (&'static str, &'static str) {
            if request_line.contains("/upload/") {
                return if fail_upload {
                    ("500 Internal Server Error", r#"{"error":"quota"}"#)
                } else {
                    ("200 OK", r#"{"versionCode": 42}"#)
                };
            }
            if request_line.contains(":commit") {
                return ("200 OK", r#"{"id":"C1"}"#);
            }
            if request_line.starts_with("PUT ") {
                return (
                    "200 OK",
                    r#"{"track":"internal","releases":[{"versionCodes":["42"],"status":"completed"}]}"#,
                );
            }
            // Edit creation
            ("200 OK", r#"{"id":"E1"}"#)
        }

        fn client(&self, package_name: &str) -> EditsClient {
            EditsClient::new(package_name, Client::new(), token()).with_base_urls(
                &format!("http://{}/api", self.addr),
                &format!("http://{}/upload", self.addr),
            )
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[tokio::test]
    async fn publish_runs_stages_in_order_and_reports_commit_id() {
        let server = StubServer::spawn(false).await;
        let bundle = temp_bundle();

        let receipt = server
            .client("com.example.app")
            .publish(bundle.path(), "internal")
            .await
            .unwrap();

        assert_eq!(receipt.edit_id, "E1");
        assert_eq!(receipt.version_code, 42);
        assert_eq!(receipt.track, "internal");
        // The confirmation id is the one the commit call returned.
        assert_eq!(receipt.commit_id, "C1");

        let calls = server.calls();
        assert_eq!(calls.len(), 4);
        assert!(calls[0].starts_with("POST /api/applications/com.example.app/edits "));
        assert!(calls[1].starts_with("POST /upload/applications/com.example.app/edits/E1/bundles "));
        assert!(calls[2].starts_with("PUT /api/applications/com.example.app/edits/E1/tracks/internal "));
        assert!(calls[3].starts_with("POST /api/applications/com.example.app/edits/E1:commit "));
    }

    #[tokio::test]
    async fn failed_upload_makes_no_further_calls() {
        let server = StubServer::spawn(true).await;
        let bundle = temp_bundle();

        let err = server
            .client("com.example.app")
            .publish(bundle.path(), "internal")
            .await
            .unwrap_err();
        assert!(matches!(err, PlayError::UploadFailed(_)));

        let calls = server.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[1].contains("/bundles"));
        assert!(!calls.iter().any(|c| c.contains("/tracks/") || c.contains(":commit")));
    }

    #[tokio::test]
    async fn publish_rejects_missing_bundle_before_any_call() {
        let server = StubServer::spawn(false).await;
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("app.aab");

        let err = server
            .client("com.example.app")
            .publish(&missing, "internal")
            .await
            .unwrap_err();
        assert!(matches!(err, PlayError::InvalidArtifact(_)));
        assert!(server.calls().is_empty());
    }

    #[test]
    fn client_is_scoped_to_one_package() {
        let c = EditsClient::new("com.example.app", Client::new(), token());
        assert_eq!(c.package_name, "com.example.app");
        assert_eq!(c.api_base_url, API_BASE_URL);
        assert_eq!(c.upload_base_url, UPLOAD_BASE_URL);
    }
}
