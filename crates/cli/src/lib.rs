//! Terminal utilities for droidsign
//!
//! Provides shared CLI functionality:
//! - Status messages
//! - Value formatting
//! - Progress spinner for long-running Gradle tasks

#![warn(missing_docs)]

pub mod output;
pub mod progress;
