//! Signing readiness checks
//!
//! Reports whether a resolved configuration would produce a signed release
//! build, without invoking Gradle.

use crate::layout::ProjectLayout;
use crate::signing::{KeystoreSource, ResolvedConfig, SigningSelection};
use serde::Serialize;

/// Check status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    /// Check passed
    Ok,
    /// Build will work but probably not as intended
    Warning,
    /// Release build will fail
    Failed,
}

/// Individual check result
#[derive(Debug, Clone, Serialize)]
pub struct Check {
    /// Name of the check
    pub name: String,
    /// Status of the check
    pub status: CheckStatus,
    /// Details
    pub message: String,
}

impl Check {
    fn ok(name: &str, message: impl Into<String>) -> Self {
        Self { name: name.to_string(), status: CheckStatus::Ok, message: message.into() }
    }

    fn warning(name: &str, message: impl Into<String>) -> Self {
        Self { name: name.to_string(), status: CheckStatus::Warning, message: message.into() }
    }

    fn failed(name: &str, message: impl Into<String>) -> Self {
        Self { name: name.to_string(), status: CheckStatus::Failed, message: message.into() }
    }
}

/// All check results for one project
#[derive(Debug, Clone, Serialize)]
pub struct DoctorReport {
    /// Signing config the release build will use
    pub signing: &'static str,
    /// Individual results
    pub checks: Vec<Check>,
}

impl DoctorReport {
    /// Whether any check failed
    pub fn has_failures(&self) -> bool {
        self.checks.iter().any(|c| c.status == CheckStatus::Failed)
    }
}

/// Inspect a resolved configuration
pub fn diagnose(layout: &ProjectLayout, resolved: &ResolvedConfig) -> DoctorReport {
    let mut checks = Vec::new();

    if layout.is_gradle_project() {
        checks.push(Check::ok("project", format!("Gradle project at {}", layout.root.display())));
    } else {
        checks.push(Check::warning(
            "project",
            format!("No settings.gradle(.kts) in {}", layout.root.display()),
        ));
    }

    let selection = SigningSelection::select(resolved);
    match &resolved.source {
        KeystoreSource::PropertiesFile { path } => {
            checks.push(Check::ok("source", format!("Properties file {}", path.display())));
        }
        KeystoreSource::Environment { written_to } => {
            checks.push(Check::ok(
                "source",
                format!("KEYSTORE_BASE64, written to {}", written_to.display()),
            ));
        }
        KeystoreSource::Absent => {
            checks.push(Check::warning(
                "source",
                "No key.properties or KEYSTORE_BASE64; release builds use debug signing",
            ));
        }
    }

    if let SigningSelection::Release(keystore) = &selection {
        let missing = keystore.missing_fields();
        if missing.is_empty() {
            checks.push(Check::ok("fields", "All signing fields present"));
        } else {
            checks.push(Check::failed("fields", format!("Missing: {}", missing.join(", "))));
        }

        match &keystore.store_file {
            Some(path) if path.is_file() => {
                checks.push(Check::ok("keystore", format!("{} exists", path.display())));
            }
            Some(path) => {
                checks.push(Check::failed("keystore", format!("{} not found", path.display())));
            }
            None => {}
        }
    }

    DoctorReport {
        signing: selection.name(),
        checks,
    }
}
