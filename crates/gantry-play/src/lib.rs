//! Google Play Developer API edits client for Gantry
//!
//! Implements the transactional publish workflow against androidpublisher v3:
//!
//! ```text
//! create edit -> upload bundle -> update track -> commit
//! ```
//!
//! ```ignore
//! use gantry_play::EditsClient;
//!
//! let client = EditsClient::new("com.example.app", http, token);
//! let receipt = client.publish(&aab_path, "internal").await?;
//! println!("committed as {}", receipt.commit_id);
//! ```

pub mod edits;
pub mod error;
pub mod types;

pub use edits::EditsClient;
pub use error::{PlayError, Result};
pub use types::{AppEdit, BundleInfo, PublishReceipt, ReleaseStatus, TrackRelease, TrackUpdate};
