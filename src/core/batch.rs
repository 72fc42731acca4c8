//! Parallel batch processing
//!
//! Each document runs the full pipeline on a blocking worker thread. At most
//! `max_parallel` documents are in flight; a shutdown signal stops scheduling
//! while in-flight documents finish within the grace period.

use crate::anonymization::models::AnonymizedDocument;
use crate::anonymization::AnonymizationEngine;
use crate::config::BatchConfig;
use crate::core::output::{read_document, OutputWriter};
use crate::core::summary::{BatchSummary, DocumentFailure, DocumentOutputs};
use crate::domain::{RedaktError, Result};
use crate::{log_batch_progress, log_error_with_context};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;

/// Expand `paths` into the list of documents to process.
///
/// Directories contribute their `*.txt` files (not recursively), skipping
/// outputs of an earlier run that sit next to their input. The result is sorted and
/// free of duplicates.
pub fn collect_documents(paths: &[PathBuf], writer: &OutputWriter) -> Result<Vec<PathBuf>> {
    let mut documents = Vec::new();
    for path in paths {
        if path.is_dir() {
            let entries = std::fs::read_dir(path).map_err(|e| {
                RedaktError::Io(format!("Failed to list {}: {e}", path.display()))
            })?;
            for entry in entries {
                let entry = entry.map_err(|e| RedaktError::Io(e.to_string()))?;
                let candidate = entry.path();
                if !candidate.is_file() || !candidate.extension().is_some_and(|ext| ext == "txt") {
                    continue;
                }
                if writer.is_output_file(&candidate) {
                    tracing::debug!(path = %candidate.display(), "Skipping output of an earlier run");
                    continue;
                }
                documents.push(candidate);
            }
        } else if path.is_file() {
            documents.push(path.clone());
        } else {
            return Err(RedaktError::Io(format!("{} does not exist", path.display())));
        }
    }
    documents.sort();
    documents.dedup();
    Ok(documents)
}

/// Outcome of one document
struct DocumentOutcome {
    document: String,
    result: Result<(AnonymizedDocument, Option<DocumentOutputs>)>,
}

/// Runs documents through the engine in parallel
pub struct BatchProcessor {
    engine: Arc<AnonymizationEngine>,
    writer: Arc<OutputWriter>,
    config: BatchConfig,
    dry_run: bool,
}

impl BatchProcessor {
    pub fn new(
        engine: Arc<AnonymizationEngine>,
        writer: OutputWriter,
        config: BatchConfig,
        dry_run: bool,
    ) -> Self {
        Self {
            engine,
            writer: Arc::new(writer),
            config,
            dry_run,
        }
    }

    /// Process every document in `inputs`.
    ///
    /// Per-document failures are recorded in the summary and never stop the
    /// batch.
    pub async fn run(
        &self,
        inputs: Vec<PathBuf>,
        shutdown: watch::Receiver<bool>,
    ) -> BatchSummary {
        let start = Instant::now();
        let total = inputs.len();
        let mut summary = BatchSummary::new(total);

        tracing::info!(
            documents = total,
            max_parallel = self.config.max_parallel,
            dry_run = self.dry_run,
            "Starting batch"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.max_parallel.max(1)));
        let mut tasks: JoinSet<DocumentOutcome> = JoinSet::new();
        let mut completed = 0usize;

        for (index, path) in inputs.into_iter().enumerate() {
            if *shutdown.borrow() {
                summary.interrupted = true;
                summary.skipped = total - index;
                break;
            }

            // collect finished documents while waiting for a free slot
            while semaphore.available_permits() == 0 {
                match tasks.join_next().await {
                    Some(joined) => {
                        completed += 1;
                        self.record(&mut summary, joined);
                        log_batch_progress!(completed, total);
                    }
                    None => break,
                }
            }
            if *shutdown.borrow() {
                summary.interrupted = true;
                summary.skipped = total - index;
                break;
            }

            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            let engine = Arc::clone(&self.engine);
            let writer = Arc::clone(&self.writer);
            let dry_run = self.dry_run;
            tasks.spawn_blocking(move || {
                let _permit = permit;
                process_document(&engine, &writer, &path, dry_run)
            });
        }

        if summary.interrupted {
            tracing::warn!(
                skipped = summary.skipped,
                in_flight = tasks.len(),
                "Shutdown requested, waiting for in-flight documents"
            );
            let grace = Duration::from_secs(self.config.shutdown_timeout_secs);
            let drained = tokio::time::timeout(grace, async {
                while let Some(joined) = tasks.join_next().await {
                    self.record(&mut summary, joined);
                }
            })
            .await;
            if drained.is_err() {
                let abandoned = tasks.len();
                tracing::error!(abandoned, "In-flight documents did not finish within the grace period");
                for _ in 0..abandoned {
                    summary.add_failure(DocumentFailure::new(
                        "<in flight>",
                        &RedaktError::Other("interrupted before completion".into()),
                    ));
                }
                tasks.detach_all();
            }
        } else {
            while let Some(joined) = tasks.join_next().await {
                completed += 1;
                self.record(&mut summary, joined);
                log_batch_progress!(completed, total);
            }
        }

        let summary = summary.with_duration(start.elapsed());
        summary.log_summary();
        summary
    }

    fn record(
        &self,
        summary: &mut BatchSummary,
        joined: std::result::Result<DocumentOutcome, tokio::task::JoinError>,
    ) {
        match joined {
            Ok(DocumentOutcome {
                result: Ok((document, outputs)),
                ..
            }) => {
                summary.successful += 1;
                summary.report.add_document(&document);
                if let Some(outputs) = outputs {
                    summary.outputs.push(outputs);
                }
            }
            Ok(DocumentOutcome {
                document,
                result: Err(error),
            }) => {
                log_error_with_context!(&error, document.as_str());
                summary.add_failure(DocumentFailure::new(document, &error));
            }
            Err(join_error) => {
                let error = RedaktError::Other(format!("worker failed: {join_error}"));
                log_error_with_context!(&error, "batch worker");
                summary.add_failure(DocumentFailure::new("<unknown>", &error));
            }
        }
    }
}

fn process_document(
    engine: &AnonymizationEngine,
    writer: &OutputWriter,
    path: &Path,
    dry_run: bool,
) -> DocumentOutcome {
    let document = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let result = read_document(path)
        .and_then(|text| engine.anonymize(&document, &text))
        .and_then(|anonymized| {
            let outputs = if dry_run {
                None
            } else {
                Some(writer.write(path, &anonymized)?)
            };
            Ok((anonymized, outputs))
        });

    DocumentOutcome { document, result }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputConfig;
    use tempfile::tempdir;

    #[test]
    fn test_collect_documents() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), "b").unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();
        std::fs::write(dir.path().join("a_anon.txt"), "x").unwrap();
        std::fs::write(dir.path().join("a_map.txt"), "x").unwrap();
        std::fs::write(dir.path().join("notes.md"), "x").unwrap();

        let writer = OutputWriter::new(OutputConfig::default());
        let explicit = dir.path().join("a.txt");
        let documents =
            collect_documents(&[dir.path().to_path_buf(), explicit.clone()], &writer).unwrap();
        assert_eq!(documents, vec![explicit, dir.path().join("b.txt")]);
    }

    #[test]
    fn test_collect_keeps_inputs_named_like_outputs() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("road_map.txt"), "x").unwrap();
        std::fs::write(dir.path().join("plan_anon.txt"), "x").unwrap();

        let writer = OutputWriter::new(OutputConfig::default());
        let documents = collect_documents(&[dir.path().to_path_buf()], &writer).unwrap();
        assert_eq!(
            documents,
            vec![dir.path().join("plan_anon.txt"), dir.path().join("road_map.txt")]
        );
    }

    #[test]
    fn test_collect_missing_path() {
        let writer = OutputWriter::new(OutputConfig::default());
        let result = collect_documents(&[PathBuf::from("/nonexistent/x.txt")], &writer);
        assert!(matches!(result, Err(RedaktError::Io(_))));
    }
}
