// Redakt - Czech legal document PII redaction
// Copyright (c) 2025 Redakt Contributors
// Licensed under the MIT License

//! # Redakt - PII redaction for Czech legal documents
//!
//! Redakt replaces personal data in Czech legal text (contracts, court
//! filings, powers of attorney) with typed tags such as `[[PERSON_1]]` or
//! `[[BIRTH_ID_2]]` and writes an entity map binding every tag to the value
//! it stands for.
//!
//! ## Overview
//!
//! Each document runs through a fixed pipeline:
//!
//! - **Detection**: a rule table of typed patterns plus a person recognizer
//!   backed by a given-name dictionary produce candidate spans
//! - **Precedence**: overlapping candidates are resolved by rule priority,
//!   context, length and position
//! - **Canonicalization**: declined name forms (`Jana Nováka`, `Janu Novákovou`)
//!   are merged into one person and share a tag
//! - **Tagging**: tags are allocated per type in order of first appearance
//! - **Consistency**: an end-scan catches leaked variants, unused tags are
//!   dropped and the token/map bijection is verified before anything is
//!   written
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Batch processing and output files
//! - [`anonymization`] - Detection, resolution, tagging and enforcement
//! - [`domain`] - Error and result types
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use redakt::anonymization::{AnonymizationConfig, AnonymizationEngine};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = AnonymizationEngine::new(AnonymizationConfig::default())?;
//! let document = engine.anonymize(
//!     "smlouva.txt",
//!     "Pan Jan Novák, r.č. 850101/1234, tel. 777 123 456.",
//! )?;
//!
//! println!("{}", document.text);
//! println!("{}", document.map.to_json()?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modes
//!
//! In **test** mode every original value is kept in the map, so a tagged
//! document can be restored exactly. In **production** mode secrets
//! (passwords, API keys, CVV codes) are never stored and payment
//! identifiers keep only their last four characters.
//!
//! ## Error Handling
//!
//! Engine operations return [`domain::Result`]. A violated token/map
//! bijection surfaces as [`domain::RedaktError::Inconsistency`] and is never
//! corrected silently:
//!
//! ```rust,no_run
//! use redakt::domain::RedaktError;
//!
//! fn exit_code_for(error: &RedaktError) -> i32 {
//!     error.exit_code()
//! }
//! ```

pub mod anonymization;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
