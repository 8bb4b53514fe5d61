//! `fancycrets compose <secret>`: one-shot reconcile against the cluster.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use fancycrets_core::SecretApi;
use fancycrets_daemon::init_tracing;
use fancycrets_reconcile::{pipeline, preview, ApplyOutcome};

use super::{ClusterArgs, TargetArgs};

/// Arguments for `fancycrets compose`.
#[derive(Args, Debug)]
pub struct ComposeArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    #[command(flatten)]
    pub cluster: ClusterArgs,

    /// Report what would change without patching.
    #[arg(long)]
    pub dry_run: bool,
}

impl ComposeArgs {
    pub fn run(self) -> Result<()> {
        init_tracing();
        let api = self.cluster.client()?;
        let object = self.target.object_ref();
        let body = api
            .read_secret(&self.target.name, &self.target.namespace)
            .with_context(|| format!("failed to read secret '{object}'"))?;

        if self.dry_run {
            let preview = preview(&api, &body)
                .with_context(|| format!("composition failed for '{object}'"))?;
            if preview.changes.is_empty() {
                println!("{object}: no fancycrets.secretFormat annotations");
                return Ok(());
            }
            for change in &preview.changes {
                println!("{:<9} {}", format!("{:?}", change.kind).to_lowercase(), change.key);
            }
            return Ok(());
        }

        match pipeline::reconcile(&api, &body)
            .with_context(|| format!("composition failed for '{object}'"))?
        {
            ApplyOutcome::Patched { keys } => {
                println!("{} {object}: {}", "patched".green().bold(), keys.join(", "));
            }
            ApplyOutcome::Unchanged => {
                println!("{} {object}", "unchanged".bright_black());
            }
        }
        Ok(())
    }
}
