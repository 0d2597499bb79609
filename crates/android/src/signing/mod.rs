//! Release signing resolution
//!
//! Inputs, by precedence:
//! 1. `key.properties` next to the Android root project
//! 2. `KEYSTORE_BASE64` plus `KEY_ALIAS`, `KEY_PASSWORD`, `STORE_PASSWORD`
//! 3. nothing, in which case the release build falls back to debug signing

pub mod env;
pub mod keystore;
pub mod resolver;

pub use env::Env;
pub use keystore::KeystoreConfig;
pub use resolver::{resolve_keystore, KeystoreSource, ResolvedConfig, Resolver};

use serde::Serialize;

/// Which signing identity the release build type uses
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "identity", content = "keystore", rename_all = "snake_case")]
pub enum SigningSelection {
    /// Sign with the resolved release keystore
    Release(KeystoreConfig),
    /// Sign with the toolchain's debug key
    Debug,
}

impl SigningSelection {
    /// Select release signing whenever a signing input was found.
    ///
    /// Never fails: missing fields are logged and left for the build tool
    /// to report.
    pub fn select(resolved: &ResolvedConfig) -> Self {
        if !resolved.source.is_present() {
            tracing::info!("No release signing input found, using debug signing");
            return SigningSelection::Debug;
        }

        for field in resolved.keystore.missing_fields() {
            tracing::warn!(field, "Release signing config is missing a field");
        }
        SigningSelection::Release(resolved.keystore.clone())
    }

    /// Whether release signing was selected
    pub fn is_release(&self) -> bool {
        matches!(self, SigningSelection::Release(_))
    }

    /// Signing config name as known to the Android plugin
    pub fn name(&self) -> &'static str {
        match self {
            SigningSelection::Release(_) => "release",
            SigningSelection::Debug => "debug",
        }
    }

    /// Copy safe to print
    pub fn redacted(&self) -> Self {
        match self {
            SigningSelection::Release(keystore) => SigningSelection::Release(keystore.redacted()),
            SigningSelection::Debug => SigningSelection::Debug,
        }
    }
}
