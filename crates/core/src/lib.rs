//! Core utilities for droidsign
//!
//! This crate provides shared functionality used by the Android resolver and the CLI:
//!
//! - **Error handling**: errors with codes, context, and recovery suggestions
//! - **Properties**: Java-style `.properties` parsing and writing
//! - **Configuration**: TOML-based tool configuration with defaults
//! - **Process execution**: running external build tools with captured output
//!
//! # Example
//!
//! ```rust
//! use droidsign_core::properties::Properties;
//!
//! let props = Properties::parse("keyAlias=upload\nstorePassword : hunter2\n").unwrap();
//! assert_eq!(props.get("keyAlias"), Some("upload"));
//! assert_eq!(props.get("storePassword"), Some("hunter2"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod process;
pub mod properties;

pub use error::{Error, ErrorCode, Result, ResultExt};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{Config, ConfigSchema};
    pub use crate::error::{exit_codes, Error, ErrorCode, Result, ResultExt};
    pub use crate::properties::Properties;
}
