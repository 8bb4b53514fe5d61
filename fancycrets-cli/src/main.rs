//! fancycrets: compose Kubernetes secrets from annotated templates.
//!
//! # Usage
//!
//! ```text
//! fancycrets run [--config <file>] [--api-url <url>] [-n <namespace>]... [--poll-interval <secs>]
//! fancycrets compose <secret> [-n <namespace>] [--dry-run]
//! fancycrets diff <secret> [-n <namespace>]
//! fancycrets render <secret> --secrets <file.yaml> [-n <namespace>] [--show-values] [--json]
//! fancycrets gate <diff.json>
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    compose::ComposeArgs, diff::DiffArgs, gate::GateArgs, render::RenderArgs, run::RunArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "fancycrets",
    version,
    about = "Compose secret entries from other secrets via annotations",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Watch the configured namespaces and compose annotated secrets.
    Run(RunArgs),

    /// Compose one secret against the cluster now.
    Compose(ComposeArgs),

    /// Show a redacted diff of what composing a secret would write.
    Diff(DiffArgs),

    /// Compose a secret offline against secrets loaded from a YAML file.
    Render(RenderArgs),

    /// Decide whether a recorded update diff would trigger composition.
    Gate(GateArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => args.run(),
        Commands::Compose(args) => args.run(),
        Commands::Diff(args) => args.run(),
        Commands::Render(args) => args.run(),
        Commands::Gate(args) => args.run(),
    }
}
