use std::path::PathBuf;

use anyhow::Result;

use crate::harvest::builder::DEFAULT_FETCH_CONCURRENCY;

/// Ambient harvest settings, resolved from the environment with defaults.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Directory that per-scan attachment directories are created under.
    pub output_root: PathBuf,
    /// Concurrent attachment transfers per message.
    pub fetch_concurrency: usize,
}

impl HarvestConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            output_root: std::env::var("MAILHARVEST_OUTPUT_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_output_root()),
            fetch_concurrency: std::env::var("MAILHARVEST_FETCH_CONCURRENCY")
                .unwrap_or_else(|_| DEFAULT_FETCH_CONCURRENCY.to_string())
                .parse()?,
        })
    }

    /// Destination directory for one named harvest under the output root.
    pub fn attachment_dir(&self, name: &str) -> PathBuf {
        self.output_root.join(name)
    }
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            output_root: default_output_root(),
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
        }
    }
}

/// Harvested files land under the user's documents folder, falling back to
/// the home directory, then the working directory.
fn default_output_root() -> PathBuf {
    dirs::document_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}
