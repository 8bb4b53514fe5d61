//! `fancycrets run`: the controller in the foreground.

use anyhow::{Context, Result};
use clap::Args;

use fancycrets_daemon::start_blocking;

use super::ClusterArgs;

/// Arguments for `fancycrets run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub cluster: ClusterArgs,

    /// Namespace to watch; repeat for several. Replaces the configured list.
    #[arg(short = 'n', long = "namespace")]
    pub namespaces: Vec<String>,

    /// Seconds between listings.
    #[arg(long)]
    pub poll_interval: Option<u64>,
}

impl RunArgs {
    pub fn run(self) -> Result<()> {
        let mut settings = self.cluster.settings()?;
        if !self.namespaces.is_empty() {
            settings.namespaces = self.namespaces;
        }
        if let Some(secs) = self.poll_interval {
            settings.poll_interval_secs = secs;
        }
        start_blocking(settings).context("controller exited with error")
    }
}
