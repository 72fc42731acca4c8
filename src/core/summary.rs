//! Batch summary and reporting

use crate::anonymization::report::RedactionReport;
use crate::domain::RedaktError;
use std::path::PathBuf;
use std::time::Duration;

/// Category of a per-document failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Input rejected before processing (already tagged, not UTF-8)
    InvalidInput,
    /// Token/map bijection violated; requires investigation
    Inconsistency,
    /// Reading the input or writing outputs failed
    Io,
    /// A detector failed
    Detection,
    /// Anything else, including worker panics
    Other,
}

impl From<&RedaktError> for FailureKind {
    fn from(error: &RedaktError) -> Self {
        match error {
            RedaktError::InvalidInput(_) => FailureKind::InvalidInput,
            RedaktError::Inconsistency { .. } => FailureKind::Inconsistency,
            RedaktError::Io(_) => FailureKind::Io,
            RedaktError::Detection(_) => FailureKind::Detection,
            _ => FailureKind::Other,
        }
    }
}

/// A document that produced no output
#[derive(Debug, Clone)]
pub struct DocumentFailure {
    pub document: String,
    pub kind: FailureKind,
    pub message: String,
}

impl DocumentFailure {
    pub fn new(document: impl Into<String>, error: &RedaktError) -> Self {
        Self {
            document: document.into(),
            kind: FailureKind::from(error),
            message: error.to_string(),
        }
    }
}

/// Outputs written for one document
#[derive(Debug, Clone)]
pub struct DocumentOutputs {
    pub document: String,
    pub anon: PathBuf,
    pub map_json: PathBuf,
    pub map_text: Option<PathBuf>,
}

/// Summary of a batch run
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    /// Documents handed to the batch
    pub total_documents: usize,

    /// Documents finalized (and written, unless dry run)
    pub successful: usize,

    pub failed: usize,

    /// Documents never started because of a shutdown signal
    pub skipped: usize,

    /// Whether a shutdown signal stopped scheduling
    pub interrupted: bool,

    pub duration: Duration,

    pub failures: Vec<DocumentFailure>,

    pub outputs: Vec<DocumentOutputs>,

    /// Aggregated counts of the successful documents
    pub report: RedactionReport,
}

impl BatchSummary {
    pub fn new(total_documents: usize) -> Self {
        Self {
            total_documents,
            ..Self::default()
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn add_failure(&mut self, failure: DocumentFailure) {
        self.failed += 1;
        self.report
            .add_warning(format!("{}: {}", failure.document, failure.message));
        self.failures.push(failure);
    }

    /// Whether every document was processed
    pub fn is_successful(&self) -> bool {
        self.failed == 0 && self.skipped == 0
    }

    pub fn has_inconsistency(&self) -> bool {
        self.failures
            .iter()
            .any(|f| f.kind == FailureKind::Inconsistency)
    }

    /// Process exit code: 3 on any inconsistency, 1 on other failures or
    /// skipped documents, 0 otherwise
    pub fn exit_code(&self) -> i32 {
        if self.has_inconsistency() {
            3
        } else if !self.is_successful() {
            1
        } else {
            0
        }
    }

    /// Get success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.total_documents == 0 {
            return 100.0;
        }
        (self.successful as f64 / self.total_documents as f64) * 100.0
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            total = self.total_documents,
            successful = self.successful,
            failed = self.failed,
            skipped = self.skipped,
            entities = self.report.total_entities,
            duration_ms = self.duration.as_millis() as u64,
            success_rate = format!("{:.2}%", self.success_rate()),
            "Batch completed"
        );

        for failure in &self.failures {
            tracing::warn!(
                document = %failure.document,
                kind = ?failure.kind,
                message = %failure.message,
                "Document failed"
            );
        }
    }
}
