//! Logging and observability
//!
//! Structured logging through `tracing`:
//! - console output for interactive runs
//! - JSON-formatted rolling log files
//! - configurable log levels
//!
//! Log records carry document ids, tags and counts. Original values never
//! appear in logs.
//!
//! # Example
//!
//! ```no_run
//! use redakt::logging::init_logging;
//! use redakt::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log the start of a document
///
/// # Example
///
/// ```no_run
/// use redakt::log_document_start;
///
/// log_document_start!("smlouva1.txt", 5120);
/// ```
#[macro_export]
macro_rules! log_document_start {
    ($document_id:expr, $bytes:expr) => {
        tracing::info!(
            document = %$document_id,
            bytes = $bytes,
            "Processing document"
        );
    };
}

/// Log the completion of a document
///
/// # Example
///
/// ```no_run
/// use redakt::log_document_complete;
///
/// log_document_complete!("smlouva1.txt", 12, 31);
/// ```
#[macro_export]
macro_rules! log_document_complete {
    ($document_id:expr, $entities:expr, $duration_ms:expr) => {
        tracing::info!(
            document = %$document_id,
            entities = $entities,
            duration_ms = $duration_ms,
            "Document redacted"
        );
    };
}

/// Log the outcome of one pipeline stage
///
/// # Example
///
/// ```no_run
/// use redakt::log_stage;
///
/// log_stage!("smlouva1.txt", "RESOLVED", 40);
/// ```
#[macro_export]
macro_rules! log_stage {
    ($document_id:expr, $stage:expr, $count:expr) => {
        tracing::debug!(
            document = %$document_id,
            stage = %$stage,
            count = $count,
            "Stage complete"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use redakt::log_error_with_context;
/// use redakt::domain::RedaktError;
///
/// let error = RedaktError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}

/// Log batch progress
///
/// # Example
///
/// ```no_run
/// use redakt::log_batch_progress;
///
/// log_batch_progress!(3, 10);
/// ```
#[macro_export]
macro_rules! log_batch_progress {
    ($current:expr, $total:expr) => {
        tracing::debug!(
            current = $current,
            total = $total,
            progress_pct = ($current as f64 / ($total as f64).max(1.0) * 100.0),
            "Batch progress"
        );
    };
}

#[cfg(test)]
mod tests {
    use crate::domain::RedaktError;

    #[test]
    fn test_macros_expand_without_subscriber() {
        let error = RedaktError::Io("disk full".into());
        log_document_start!("doc.txt", 10);
        log_stage!("doc.txt", "SCANNED", 3);
        log_document_complete!("doc.txt", 2, 5u64);
        log_error_with_context!(&error, "writing output");
        log_batch_progress!(1, 0);
    }
}
