//! Anonymize command implementation
//!
//! This module implements the `anonymize` command, which redacts a batch of
//! documents and writes the tagged text and entity maps next to them.

use crate::anonymization::{AnonymizationEngine, Mode};
use crate::config::{load_config_or_default, RedaktConfig};
use crate::core::batch::{collect_documents, BatchProcessor};
use crate::core::output::OutputWriter;
use crate::core::summary::BatchSummary;
use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;

/// Arguments for the anonymize command
#[derive(Args, Debug)]
pub struct AnonymizeArgs {
    /// Documents or directories of `*.txt` documents
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Operating mode (test or production)
    #[arg(long)]
    pub mode: Option<Mode>,

    /// Write outputs into this directory instead of next to the inputs
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Given-name dictionary (JSON)
    #[arg(long)]
    pub dictionary: Option<PathBuf>,

    /// Run the full pipeline without writing any output
    #[arg(long)]
    pub dry_run: bool,

    /// Replace existing output files
    #[arg(long)]
    pub overwrite: bool,

    /// Maximum number of documents processed in parallel
    #[arg(long)]
    pub max_parallel: Option<usize>,

    /// Also write the batch report as JSON to this file
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,
}

impl AnonymizeArgs {
    /// Execute the anonymize command
    pub async fn execute(
        &self,
        config_path: Option<&Path>,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!(inputs = self.paths.len(), "Starting anonymize command");

        let mut config = match load_config_or_default(config_path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("❌ {e}");
                return Ok(2);
            }
        };

        self.apply_overrides(&mut config);

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(2);
        }

        let dry_run = config.application.dry_run;
        if dry_run {
            tracing::info!("Dry run mode enabled - no output will be written");
            println!("🔍 DRY RUN MODE - No output will be written");
            println!();
        }

        let engine = match AnonymizationEngine::new(config.anonymization.clone()) {
            Ok(engine) => Arc::new(engine),
            Err(e) => {
                tracing::error!(error = %e, "Failed to initialize redaction engine");
                eprintln!("Failed to initialize redaction engine: {e}");
                return Ok(e.exit_code());
            }
        };

        let writer = OutputWriter::new(config.output.clone());
        let documents = match collect_documents(&self.paths, &writer) {
            Ok(documents) => documents,
            Err(e) => {
                tracing::error!(error = %e, "Failed to collect input documents");
                eprintln!("❌ {e}");
                return Ok(1);
            }
        };
        if documents.is_empty() {
            tracing::warn!("No input documents found");
            println!("⚠️  No documents found");
            return Ok(1);
        }

        println!(
            "🚀 Redacting {} document(s) in {} mode...",
            documents.len(),
            engine.mode()
        );
        println!();

        let processor = BatchProcessor::new(engine, writer, config.batch.clone(), dry_run);
        let summary = processor.run(documents, shutdown_signal).await;

        self.print_summary(&summary);

        if let Some(path) = &self.report {
            if let Err(e) = summary.report.write_to_file(path) {
                tracing::error!(error = %e, path = %path.display(), "Failed to write report");
                eprintln!("⚠️  Failed to write report to {}: {e}", path.display());
            }
        }

        Ok(summary.exit_code())
    }

    fn apply_overrides(&self, config: &mut RedaktConfig) {
        if let Some(mode) = self.mode {
            tracing::info!(mode = %mode, "Overriding mode from CLI");
            config.anonymization.mode = mode;
        }
        if let Some(dir) = &self.output_dir {
            config.output.directory = Some(dir.clone());
        }
        if let Some(dictionary) = &self.dictionary {
            config.anonymization.dictionary = Some(dictionary.clone());
        }
        if self.dry_run {
            config.application.dry_run = true;
        }
        if self.overwrite {
            config.output.overwrite = true;
        }
        if let Some(max_parallel) = self.max_parallel {
            config.batch.max_parallel = max_parallel;
        }
    }

    fn print_summary(&self, summary: &BatchSummary) {
        println!("{}", summary.report.format_console());

        if summary.is_successful() {
            println!(
                "✅ {} of {} document(s) redacted in {:.2}s",
                summary.successful,
                summary.total_documents,
                summary.duration.as_secs_f64()
            );
        } else {
            println!(
                "⚠️  {} succeeded, {} failed, {} skipped",
                summary.successful, summary.failed, summary.skipped
            );
            for failure in &summary.failures {
                println!("   ❌ {} ({:?}): {}", failure.document, failure.kind, failure.message);
            }
        }
        if summary.interrupted {
            println!("⚠️  Run was interrupted; skipped documents were not processed");
        }
        if summary.has_inconsistency() {
            println!("🚨 Token/map inconsistency detected - investigate before using any output");
        }

        for outputs in &summary.outputs {
            tracing::debug!(
                document = %outputs.document,
                anon = %outputs.anon.display(),
                map = %outputs.map_json.display(),
                "Document outputs"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> AnonymizeArgs {
        AnonymizeArgs {
            paths: vec![PathBuf::from("a.txt")],
            mode: None,
            output_dir: None,
            dictionary: None,
            dry_run: false,
            overwrite: false,
            max_parallel: None,
            report: None,
        }
    }

    #[test]
    fn test_overrides_leave_config_untouched_by_default() {
        let mut config = RedaktConfig::default();
        args().apply_overrides(&mut config);
        assert_eq!(config.anonymization.mode, Mode::Test);
        assert!(config.output.directory.is_none());
        assert!(!config.application.dry_run);
    }

    #[test]
    fn test_overrides_apply_cli_values() {
        let mut config = RedaktConfig::default();
        let args = AnonymizeArgs {
            mode: Some(Mode::Production),
            output_dir: Some(PathBuf::from("out")),
            dictionary: Some(PathBuf::from("names.json")),
            dry_run: true,
            overwrite: true,
            max_parallel: Some(2),
            ..args()
        };
        args.apply_overrides(&mut config);
        assert_eq!(config.anonymization.mode, Mode::Production);
        assert_eq!(config.output.directory, Some(PathBuf::from("out")));
        assert_eq!(config.anonymization.dictionary, Some(PathBuf::from("names.json")));
        assert!(config.application.dry_run);
        assert!(config.output.overwrite);
        assert_eq!(config.batch.max_parallel, 2);
    }
}
