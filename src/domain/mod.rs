//! Domain error and result types for Redakt.
//!
//! # Error Handling
//!
//! All fallible engine operations return [`Result<T, RedaktError>`]:
//!
//! ```rust
//! use redakt::domain::{RedaktError, Result};
//!
//! fn example() -> Result<()> {
//!     let config = redakt::config::load_config("redakt.toml")?;
//!     println!("mode: {}", config.anonymization.mode);
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod result;

pub use errors::RedaktError;
pub use result::Result;
