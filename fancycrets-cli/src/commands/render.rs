//! `fancycrets render <secret> --secrets <file.yaml>`: offline composition.
//!
//! Secrets are loaded from a manifest into an in-memory store, so templates
//! can be checked without a cluster. Values are shown as digests unless
//! `--show-values` is given.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use fancycrets_core::{annotations, MemorySecretApi, SecretApi};
use fancycrets_reconcile::{pipeline, preview, ChangeKind};
use fancycrets_renderer::{codec, Template};

use super::TargetArgs;

/// Arguments for `fancycrets render`.
#[derive(Args, Debug)]
pub struct RenderArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// YAML file with the target and its source secrets.
    #[arg(long)]
    pub secrets: PathBuf,

    /// Print decoded values instead of digests.
    #[arg(long)]
    pub show_values: bool,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct RenderedEntry {
    status: &'static str,
    /// Source keys the template reads.
    requires: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,
    digest: String,
}

#[derive(Tabled)]
struct RenderRow {
    #[tabled(rename = "key")]
    key: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "value")]
    value: String,
}

impl RenderArgs {
    pub fn run(self) -> Result<()> {
        let api = MemorySecretApi::from_manifest(&self.secrets, &self.target.namespace)
            .with_context(|| format!("failed to load secrets from {}", self.secrets.display()))?;
        let object = self.target.object_ref();
        let body = api
            .read_secret(&self.target.name, &self.target.namespace)
            .with_context(|| format!("secret '{object}' is not in {}", self.secrets.display()))?;

        let preview =
            preview(&api, &body).with_context(|| format!("render failed for '{object}'"))?;
        let values = if self.show_values {
            let patch = pipeline::plan(&api, &body)
                .with_context(|| format!("render failed for '{object}'"))?;
            patch
                .iter()
                .map(|(key, encoded)| Ok((key.clone(), codec::decode(&object, key, encoded)?)))
                .collect::<Result<BTreeMap<_, _>>>()?
        } else {
            BTreeMap::new()
        };

        let formats = annotations::parse(&body.metadata.annotations).formats;
        let entries: BTreeMap<String, RenderedEntry> = preview
            .changes
            .into_iter()
            .map(|change| {
                let entry = RenderedEntry {
                    status: status_label(change.kind),
                    requires: formats
                        .get(&change.key)
                        .map(|template| required_keys(template))
                        .unwrap_or_default(),
                    value: values.get(&change.key).cloned(),
                    digest: change.after,
                };
                (change.key, entry)
            })
            .collect();

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&entries).context("failed to serialize render JSON")?
            );
            return Ok(());
        }

        if entries.is_empty() {
            println!("{object}: nothing to compose");
            return Ok(());
        }
        println!("{}", object.bold());
        let rows: Vec<RenderRow> = entries
            .into_iter()
            .map(|(key, entry)| RenderRow {
                key,
                status: entry.status.to_string(),
                value: entry
                    .value
                    .unwrap_or_else(|| format!("sha256:{}", entry.digest)),
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    }
}

fn required_keys(template: &str) -> Vec<String> {
    Template::parse(template)
        .map(|parsed| parsed.placeholders().into_iter().map(str::to_owned).collect())
        .unwrap_or_default()
}

fn status_label(kind: ChangeKind) -> &'static str {
    match kind {
        ChangeKind::Added => "added",
        ChangeKind::Changed => "changed",
        ChangeKind::Unchanged => "unchanged",
    }
}
