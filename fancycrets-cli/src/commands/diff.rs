//! `fancycrets diff <secret>`: redacted unified diff of a composition.

use anyhow::{Context, Result};
use clap::Args;

use fancycrets_core::SecretApi;
use fancycrets_reconcile::preview;

use super::{ClusterArgs, TargetArgs};

/// Arguments for `fancycrets diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    #[command(flatten)]
    pub cluster: ClusterArgs,
}

impl DiffArgs {
    pub fn run(self) -> Result<()> {
        let api = self.cluster.client()?;
        let object = self.target.object_ref();
        let body = api
            .read_secret(&self.target.name, &self.target.namespace)
            .with_context(|| format!("failed to read secret '{object}'"))?;

        let preview =
            preview(&api, &body).with_context(|| format!("diff failed for '{object}'"))?;
        let diff = preview.unified_diff();
        if diff.is_empty() {
            println!("No differences for '{object}'.");
            return Ok(());
        }
        print!("{diff}");
        if !diff.ends_with('\n') {
            println!();
        }
        Ok(())
    }
}
