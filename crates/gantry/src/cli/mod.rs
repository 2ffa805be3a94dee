//! CLI definition and command handling

pub mod output;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use console::style;

use gantry_auth::{Credentials, ANDROID_PUBLISHER_SCOPE};
use gantry_play::{EditsClient, PublishReceipt};

/// Gantry - publish Android App Bundles to Google Play
///
/// Authenticates with Workload Identity Federation, a service-account key,
/// or ambient default credentials, then runs the edits workflow: create an
/// edit, upload the bundle, assign it to a track, commit.
#[derive(Debug, Parser)]
#[command(name = "gantry")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the Android App Bundle (.aab)
    #[arg(long, value_name = "PATH")]
    pub aab: PathBuf,

    /// Android package name
    #[arg(long)]
    pub package_name: String,

    /// Release track (internal, alpha, beta, production)
    #[arg(long, default_value = "internal")]
    pub track: String,

    /// Suppress output except errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output
    Json,
}

impl Cli {
    /// Execute the publish workflow
    pub fn execute(&self) -> anyhow::Result<()> {
        // Fail fast on a missing bundle; nothing network-facing has run yet.
        if !self.aab.exists() {
            anyhow::bail!("AAB file not found: {}", self.aab.display());
        }

        if !self.quiet {
            println!(
                "{} {} to Google Play ({})",
                style("Uploading").cyan(),
                style(self.aab.display()).bold(),
                self.track
            );
            println!("{}", output::key_value("Package", &self.package_name));
        }

        let rt = tokio::runtime::Runtime::new()?;
        let receipt = rt.block_on(self.publish())?;

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&receipt)?);
            }
            OutputFormat::Text => {
                if !self.quiet {
                    output::success("Upload successful!");
                    println!("{}", output::key_value("Version Code", &receipt.version_code.to_string()));
                    println!("{}", output::key_value("Track", &receipt.track));
                    println!("{}", output::key_value("Commit ID", &receipt.commit_id));
                    println!(
                        "{}",
                        output::key_value(
                            "Console",
                            &format!(
                                "https://play.google.com/console/developers/app/{}/tracks",
                                self.package_name
                            )
                        )
                    );
                }
            }
        }

        Ok(())
    }

    /// Resolve credentials and run the edits workflow
    async fn publish(&self) -> anyhow::Result<PublishReceipt> {
        let http = reqwest::Client::new();

        let credentials = Credentials::from_env().context("Authentication failed")?;
        if !self.quiet {
            output::info(&format!("Authenticating ({})", credentials.flow()));
        }

        let token = credentials
            .access_token(&http, ANDROID_PUBLISHER_SCOPE)
            .await
            .context("Authentication failed")?;
        anyhow::ensure!(
            token.is_valid(),
            "Authentication failed: token already expired"
        );

        let client = EditsClient::new(&self.package_name, http, token);
        client
            .publish(&self.aab, &self.track)
            .await
            .context("Publish failed")
    }
}
