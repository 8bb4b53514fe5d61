//! `fancycrets gate <diff.json>`: evaluate a recorded update diff.
//!
//! The file holds a JSON array of diff records, either as objects
//! (`{"op", "path", "removed", "added"}`) or positional tuples.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use fancycrets_core::DiffRecord;
use fancycrets_reconcile::gate::{evaluate, touched_annotations};
use fancycrets_reconcile::GateDecision;

/// Arguments for `fancycrets gate`.
#[derive(Args, Debug)]
pub struct GateArgs {
    /// Path to the diff JSON file.
    pub diff: PathBuf,

    /// Also list the annotation keys each record touches.
    #[arg(short, long)]
    pub verbose: bool,
}

impl GateArgs {
    pub fn run(self) -> Result<()> {
        let text = std::fs::read_to_string(&self.diff)
            .with_context(|| format!("failed to read {}", self.diff.display()))?;
        let diff: Vec<DiffRecord> = serde_json::from_str(&text)
            .with_context(|| format!("{} is not a list of diff records", self.diff.display()))?;

        let decision = evaluate(&diff);
        println!(
            "{}",
            match decision {
                GateDecision::Trigger => "trigger",
                GateDecision::Skip => "skip",
            }
        );
        if self.verbose {
            for record in &diff {
                let keys = touched_annotations(record);
                if !keys.is_empty() {
                    println!("  {}: {}", record.path.join("."), keys.join(", "));
                }
            }
        }
        Ok(())
    }
}
