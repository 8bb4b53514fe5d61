pub mod compose;
pub mod diff;
pub mod gate;
pub mod render;
pub mod run;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use fancycrets_daemon::paths::DEFAULT_NAMESPACE;
use fancycrets_daemon::{HttpSecretApi, Settings};

/// Connection flags shared by every command that talks to the cluster.
#[derive(Args, Debug, Clone)]
pub struct ClusterArgs {
    /// Settings file to use instead of `~/.fancycrets/config.yaml`.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Kubernetes API base URL; overrides the settings file.
    #[arg(long)]
    pub api_url: Option<String>,
}

impl ClusterArgs {
    pub fn settings(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::load_from(path)
                .with_context(|| format!("failed to load settings from {}", path.display()))?,
            None => {
                let home = dirs::home_dir().context("could not determine home directory")?;
                Settings::load_at(&home).context("failed to load settings")?
            }
        };
        if let Some(url) = &self.api_url {
            settings.api_url = url.clone();
        }
        Ok(settings)
    }

    pub fn client(&self) -> Result<HttpSecretApi> {
        let settings = self.settings()?;
        settings.validate()?;
        HttpSecretApi::from_settings(&settings).context("failed to build API client")
    }
}

/// Namespace flag for single-secret commands.
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Secret to operate on.
    pub name: String,

    /// Namespace of the secret and of its sources.
    #[arg(short, long, default_value = DEFAULT_NAMESPACE)]
    pub namespace: String,
}

impl TargetArgs {
    pub fn object_ref(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}
