//! Wire types for the Play Developer API edits workflow

use serde::{Deserialize, Serialize};

/// An edit resource, returned by create and commit
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppEdit {
    /// Opaque server-assigned edit id
    pub id: String,

    /// When the open edit expires server-side
    #[serde(default)]
    pub expiry_time_seconds: Option<String>,
}

/// Response from a bundle upload
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleInfo {
    /// Server-assigned version code for the uploaded bundle
    pub version_code: i64,

    #[serde(default)]
    pub sha256: Option<String>,
}

/// Rollout status of a track release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReleaseStatus {
    Completed,
    Draft,
    Halted,
    InProgress,
}

/// A single release within a track
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackRelease {
    /// Version codes in this release, as decimal strings
    pub version_codes: Vec<String>,

    pub status: ReleaseStatus,
}

/// Track update request and response body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackUpdate {
    pub track: String,
    #[serde(default)]
    pub releases: Vec<TrackRelease>,
}

impl TrackUpdate {
    /// Full-rollout update declaring `version_code` as the sole release
    pub fn completed(track: &str, version_code: i64) -> Self {
        Self {
            track: track.to_string(),
            releases: vec![TrackRelease {
                version_codes: vec![version_code.to_string()],
                status: ReleaseStatus::Completed,
            }],
        }
    }
}

/// Outcome of a successful publish
#[derive(Debug, Clone, Serialize)]
pub struct PublishReceipt {
    /// Edit id the transaction ran under
    pub edit_id: String,

    /// Version code assigned to the uploaded bundle
    pub version_code: i64,

    /// Track the release was assigned to
    pub track: String,

    /// Confirmation id reported by the commit call
    pub commit_id: String,
}
