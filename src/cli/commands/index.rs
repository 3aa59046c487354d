//! Implementation of the `ragguard index` command.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::cli::output::{create_spinner, output, CommandOutput, ProgressBarExt};
use crate::domain::models::Config;
use crate::services::IndexReport;

use super::open_services;

#[derive(Args, Debug)]
pub struct IndexArgs {
    /// Folder containing the documents to index
    pub folder: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct IndexOutput {
    pub folder: String,
    pub index_path: String,
    /// Top-level entries of the folder, directories marked with a trailing `/`.
    pub entries: Vec<String>,
    /// Passages per indexed file.
    pub files: BTreeMap<String, usize>,
    pub documents: usize,
    pub passages: usize,
    pub generation: u64,
}

impl IndexOutput {
    fn new(report: IndexReport, entries: Vec<String>) -> Self {
        Self {
            folder: report.folder.display().to_string(),
            index_path: report.index_path.display().to_string(),
            documents: report.file_count(),
            passages: report.passages,
            generation: report.generation,
            files: report.files,
            entries,
        }
    }
}

impl CommandOutput for IndexOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![format!(
            "Indexed {} document(s) into {} passage(s) from {}",
            self.documents, self.passages, self.folder
        )];
        lines.push(format!("Index: {} (generation {})", self.index_path, self.generation));

        if !self.entries.is_empty() {
            lines.push("\nEntries:".to_string());
            for entry in &self.entries {
                lines.push(format!("  {entry}"));
            }
        }
        if !self.files.is_empty() {
            lines.push("\nPassages per file:".to_string());
            for (file, passages) in &self.files {
                lines.push(format!("  {passages:>5}  {file}"));
            }
        }
        lines.join("\n")
    }
}

pub async fn execute(args: IndexArgs, config: &Config, json_mode: bool) -> Result<()> {
    let services = open_services(config).await?;

    let spinner = create_spinner(format!("Indexing {}", args.folder.display()), json_mode);
    let report = match services.indexing.build_from_folder(&args.folder).await {
        Ok(report) => {
            spinner.finish_success(format!("{} passage(s) indexed", report.passages));
            report
        }
        Err(e) => {
            spinner.finish_error("indexing failed");
            return Err(e).with_context(|| format!("Failed to index {}", args.folder.display()));
        }
    };

    let entries = list_entries(&args.folder)
        .await
        .with_context(|| format!("Failed to list {}", args.folder.display()))?;

    output(&IndexOutput::new(report, entries), json_mode);
    Ok(())
}

async fn list_entries(folder: &Path) -> std::io::Result<Vec<String>> {
    let mut entries = Vec::new();
    let mut dir = tokio::fs::read_dir(folder).await?;
    while let Some(entry) = dir.next_entry().await? {
        let mut name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type().await?.is_dir() {
            name.push('/');
        }
        entries.push(name);
    }
    entries.sort();
    Ok(entries)
}
