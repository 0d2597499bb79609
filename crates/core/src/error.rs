//! Error handling with codes, context and recovery suggestions
//!
//! Every failure the resolver can report carries:
//! - An error code for programmatic handling and exit-code mapping
//! - An optional context line (which file, which variable)
//! - An optional recovery suggestion
//! - A serializable report form for `--json` output
//!
//! Messages never include signing secrets.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // General errors (1xxx)
    /// Bug or unexpected serialization failure
    Internal = 1001,

    // IO errors (2xxx)
    /// Other filesystem failure
    IoError = 2000,
    /// A required file does not exist
    FileNotFound = 2001,
    /// A file exists but cannot be read or written
    PermissionDenied = 2002,

    // Configuration errors (3xxx)
    /// Configuration is unusable
    ConfigError = 3000,
    /// An explicitly named config file does not exist
    ConfigNotFound = 3001,
    /// The config file is not valid TOML for the schema
    ConfigParseError = 3002,
    /// A `.properties` file is malformed
    PropertiesParseError = 3003,

    // Signing errors (4xxx)
    /// `KEYSTORE_BASE64` is not valid base64
    KeystoreDecodeError = 4001,
    /// `storeFile` points at a missing file
    KeystoreNotFound = 4002,
    /// Release signing lacks one of the four fields
    IncompleteSigningConfig = 4003,

    // Process errors (5xxx)
    /// An external command could not be started
    ProcessError = 5000,
    /// An external command is not installed
    CommandNotFound = 5001,

    // Validation errors (6xxx)
    /// Input failed validation
    ValidationError = 6000,
    /// Build flags contradict each other
    ConstraintViolation = 6002,

    // Platform-specific errors (8xxx)
    /// A Gradle task ran and failed
    GradleError = 8001,
}

impl ErrorCode {
    /// Get the numeric code
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// Get a human-readable category
    pub fn category(&self) -> &'static str {
        match self.code() / 1000 {
            1 => "General",
            2 => "IO",
            3 => "Configuration",
            4 => "Signing",
            5 => "Process",
            6 => "Validation",
            8 => "Platform",
            _ => "Unknown",
        }
    }

    /// Process exit code the CLI reports for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorCode::ConfigError
            | ErrorCode::ConfigNotFound
            | ErrorCode::ConfigParseError
            | ErrorCode::PropertiesParseError
            | ErrorCode::KeystoreDecodeError => exit_codes::CONFIG_ERROR,
            ErrorCode::ValidationError
            | ErrorCode::ConstraintViolation
            | ErrorCode::KeystoreNotFound
            | ErrorCode::IncompleteSigningConfig => exit_codes::VALIDATION_ERROR,
            ErrorCode::CommandNotFound => exit_codes::COMMAND_NOT_FOUND,
            _ => exit_codes::FAILURE,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

/// Main error type with rich context
#[derive(Error, Debug)]
pub struct Error {
    /// Error code for programmatic handling
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Additional context
    pub context: Option<String>,
    /// Recovery suggestion
    pub suggestion: Option<String>,
    /// Source error
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ctx) = &self.context {
            write!(f, "\n  Context: {}", ctx)?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, "\n  Suggestion: {}", suggestion)?;
        }
        Ok(())
    }
}

impl Error {
    /// Create a new error
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
            suggestion: None,
            source: None,
        }
    }

    /// Add context to the error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Add a recovery suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add a source error
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Convert to a serializable report
    pub fn to_report(&self) -> ErrorReport {
        ErrorReport {
            code: self.code,
            code_str: self.code.to_string(),
            category: self.code.category().to_string(),
            message: self.message.clone(),
            context: self.context.clone(),
            suggestion: self.suggestion.clone(),
            source: self.source.as_ref().map(|e| e.to_string()),
        }
    }

    // Convenience constructors

    /// Unusable configuration
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// Explicit config path that does not exist
    pub fn config_not_found(path: impl AsRef<std::path::Path>) -> Self {
        Self::new(
            ErrorCode::ConfigNotFound,
            format!("Configuration file not found: {}", path.as_ref().display()),
        )
        .with_suggestion("Create a .droidsign.toml file or use --config to specify a path")
    }

    /// Malformed `.properties` content
    pub fn properties(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PropertiesParseError, message)
    }

    /// Keystore secret that is not base64
    pub fn keystore_decode(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::KeystoreDecodeError, message).with_suggestion(
            "Re-encode the keystore with `base64 < release.jks` and update the KEYSTORE_BASE64 secret",
        )
    }

    /// `storeFile` that does not exist
    pub fn keystore_not_found(path: impl AsRef<std::path::Path>) -> Self {
        Self::new(
            ErrorCode::KeystoreNotFound,
            format!("Keystore not found: {}", path.as_ref().display()),
        )
        .with_suggestion("Fix storeFile in key.properties or provide KEYSTORE_BASE64")
    }

    /// Release signing missing the named fields
    pub fn incomplete_signing(missing: &[&str]) -> Self {
        Self::new(
            ErrorCode::IncompleteSigningConfig,
            format!("Release signing is missing: {}", missing.join(", ")),
        )
        .with_suggestion("Set every field in key.properties, or KEY_ALIAS, KEY_PASSWORD and STORE_PASSWORD")
    }

    /// Gradle task that exited unsuccessfully
    pub fn gradle(task: &str, exit_code: i32) -> Self {
        Self::new(
            ErrorCode::GradleError,
            format!("Gradle task {} failed with exit code {}", task, exit_code),
        )
        .with_suggestion("Re-run with -v or run the task through ./gradlew --stacktrace")
    }

    /// External command could not be started
    pub fn process(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ProcessError, message)
    }

    /// External command not installed
    pub fn command_not_found(cmd: &str) -> Self {
        Self::new(
            ErrorCode::CommandNotFound,
            format!("Command not found: {}", cmd),
        )
        .with_suggestion(format!("Install {} and ensure it's in your PATH", cmd))
    }

    /// Failed validation
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        self.code.exit_code()
    }
}

/// Serializable error report for logging and `--json` output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Error code
    pub code: ErrorCode,
    /// Code rendered as `E####`
    pub code_str: String,
    /// Code category
    pub category: String,
    /// Human-readable message
    pub message: String,
    /// Additional context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Recovery suggestion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Rendered source error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Exit codes for CLI commands
pub mod exit_codes {
    /// Command completed
    pub const SUCCESS: i32 = 0;
    /// Runtime or build failure
    pub const FAILURE: i32 = 1;
    /// Inputs were read but are not usable
    pub const VALIDATION_ERROR: i32 = 2;
    /// Configuration, properties or keystore secret could not be read
    pub const CONFIG_ERROR: i32 = 3;
    /// A required tool is not installed
    pub const COMMAND_NOT_FOUND: i32 = 127;
}

// Implement From for common error types

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        let code = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::FileNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorCode::PermissionDenied,
            _ => ErrorCode::IoError,
        };
        Error::new(code, err.to_string()).with_source(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::new(ErrorCode::Internal, format!("JSON error: {}", err)).with_source(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::new(ErrorCode::ConfigParseError, format!("TOML parse error: {}", err))
            .with_source(err)
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Attach context to the error
    fn context(self, context: impl Into<String>) -> Result<T>;
    /// Attach a recovery suggestion to the error
    fn with_suggestion(self, suggestion: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_suggestion(self, suggestion: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_suggestion(suggestion))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::FileNotFound.to_string(), "E2001");
        assert_eq!(ErrorCode::KeystoreDecodeError.to_string(), "E4001");
    }

    #[test]
    fn test_error_code_category() {
        assert_eq!(ErrorCode::IoError.category(), "IO");
        assert_eq!(ErrorCode::PropertiesParseError.category(), "Configuration");
        assert_eq!(ErrorCode::KeystoreNotFound.category(), "Signing");
    }

    #[test]
    fn test_exit_code_mapping() {
        assert_eq!(ErrorCode::KeystoreDecodeError.exit_code(), exit_codes::CONFIG_ERROR);
        assert_eq!(ErrorCode::PropertiesParseError.exit_code(), exit_codes::CONFIG_ERROR);
        assert_eq!(ErrorCode::ConstraintViolation.exit_code(), exit_codes::VALIDATION_ERROR);
        assert_eq!(ErrorCode::CommandNotFound.exit_code(), exit_codes::COMMAND_NOT_FOUND);
        assert_eq!(ErrorCode::GradleError.exit_code(), exit_codes::FAILURE);
    }

    #[test]
    fn test_signing_errors_name_fields_only() {
        let err = Error::incomplete_signing(&["keyPassword", "storePassword"]);
        assert_eq!(err.code, ErrorCode::IncompleteSigningConfig);
        assert!(err.message.contains("keyPassword, storePassword"));

        let err = Error::gradle("bundleRelease", 1);
        assert_eq!(err.code.to_string(), "E8001");
        assert_eq!(err.exit_code(), exit_codes::FAILURE);
    }

    #[test]
    fn test_error_with_context() {
        let err = Error::keystore_not_found("/path/to/upload.jks")
            .with_context("While resolving release signing");

        assert_eq!(err.code, ErrorCode::KeystoreNotFound);
        assert_eq!(err.exit_code(), exit_codes::VALIDATION_ERROR);
        assert!(err.context.is_some());
        assert!(err.suggestion.is_some());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: Error = io.into();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
        assert!(err.source.is_some());
    }

    #[test]
    fn test_error_report_serialization() {
        let err = Error::keystore_decode("Invalid symbol 45, offset 3")
            .with_context("KEYSTORE_BASE64");

        let report = err.to_report();
        let json = serde_json::to_string(&report).unwrap();

        assert!(json.contains("E4001"));
        assert!(json.contains("Signing"));
        assert!(json.contains("KEYSTORE_BASE64"));
    }
}
