//! Batch orchestration around the engine.
//!
//! # Modules
//!
//! - [`batch`] - parallel document processing with graceful shutdown
//! - [`output`] - input reading and atomic output writing
//! - [`summary`] - batch outcome and exit codes
//!
//! # Example
//!
//! ```rust,no_run
//! use redakt::anonymization::AnonymizationEngine;
//! use redakt::config::load_config;
//! use redakt::core::batch::{collect_documents, BatchProcessor};
//! use redakt::core::output::OutputWriter;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("redakt.toml")?;
//! let engine = Arc::new(AnonymizationEngine::new(config.anonymization.clone())?);
//! let writer = OutputWriter::new(config.output.clone());
//! let documents = collect_documents(&["./smlouvy".into()], &writer)?;
//!
//! let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//! let processor = BatchProcessor::new(engine, writer, config.batch.clone(), false);
//! let summary = processor.run(documents, shutdown_rx).await;
//!
//! println!("Redacted: {}", summary.successful);
//! println!("Failed: {}", summary.failed);
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod output;
pub mod summary;
