//! Build configuration resolver
//!
//! Picks the signing source by precedence: `key.properties` when present,
//! else a base64 keystore from `KEYSTORE_BASE64`, else nothing.

use super::env::{self, Env};
use super::keystore::{self, keys, KeystoreConfig};
use crate::flags::BuildFlags;
use crate::layout::ProjectLayout;
use droidsign_core::config::ConfigSchema;
use droidsign_core::error::{Result, ResultExt};
use droidsign_core::properties::Properties;
use serde::Serialize;
use std::path::PathBuf;

/// Where the signing credentials came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KeystoreSource {
    /// Read from a local properties file
    PropertiesFile {
        /// The file that was read
        path: PathBuf,
    },
    /// Decoded from CI environment variables
    Environment {
        /// Where the decoded keystore was written
        written_to: PathBuf,
    },
    /// No signing input present
    Absent,
}

impl KeystoreSource {
    /// Whether a release signing input was found
    pub fn is_present(&self) -> bool {
        !matches!(self, KeystoreSource::Absent)
    }
}

/// Everything the build tool needs for the release build type
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    /// Signing credentials, possibly empty
    pub keystore: KeystoreConfig,
    /// Where the credentials came from
    pub source: KeystoreSource,
    /// Packaging and SDK flags
    pub flags: BuildFlags,
}

/// Resolves signing and build flags for one project
pub struct Resolver<'a> {
    layout: &'a ProjectLayout,
    schema: &'a ConfigSchema,
}

impl<'a> Resolver<'a> {
    /// Create a resolver for a layout and configuration
    pub fn new(layout: &'a ProjectLayout, schema: &'a ConfigSchema) -> Self {
        Self { layout, schema }
    }

    /// Resolve flags and signing once for this invocation.
    ///
    /// Flags are resolved first so a configuration error never leaves a
    /// freshly decoded keystore behind.
    pub fn resolve(&self, env: &Env) -> Result<ResolvedConfig> {
        let local = Properties::load_optional(&self.layout.local_properties)?;
        let flags = BuildFlags::resolve(self.schema, local.as_ref())?;
        let (keystore, source) = resolve_keystore(self.layout, env)?;

        tracing::info!(
            application_id = %flags.application_id,
            version_code = flags.version_code,
            source = ?source,
            "Resolved build configuration"
        );

        Ok(ResolvedConfig {
            keystore,
            source,
            flags,
        })
    }
}

/// Resolve signing credentials from the properties file or the environment
pub fn resolve_keystore(
    layout: &ProjectLayout,
    env: &Env,
) -> Result<(KeystoreConfig, KeystoreSource)> {
    if layout.key_properties.exists() {
        let keystore = from_properties_file(layout)?;
        if env.is_set(env::KEYSTORE_BASE64) {
            tracing::debug!(
                path = %layout.key_properties.display(),
                "Properties file present, ignoring signing environment"
            );
        }
        return Ok((
            keystore,
            KeystoreSource::PropertiesFile {
                path: layout.key_properties.clone(),
            },
        ));
    }

    match env.get(env::KEYSTORE_BASE64) {
        Some(encoded) if encoded.trim().is_empty() => {
            tracing::warn!("KEYSTORE_BASE64 is set but empty, ignoring it");
            Ok((KeystoreConfig::default(), KeystoreSource::Absent))
        }
        Some(encoded) => {
            let keystore = from_environment(layout, encoded, env)?;
            Ok((
                keystore,
                KeystoreSource::Environment {
                    written_to: layout.ci_keystore.clone(),
                },
            ))
        }
        None => {
            tracing::debug!("No signing properties or environment found");
            Ok((KeystoreConfig::default(), KeystoreSource::Absent))
        }
    }
}

fn from_properties_file(layout: &ProjectLayout) -> Result<KeystoreConfig> {
    let props = Properties::load(&layout.key_properties)
        .context("While resolving release signing")?;

    tracing::info!(
        path = %layout.key_properties.display(),
        entries = props.len(),
        "Using signing properties file"
    );

    Ok(KeystoreConfig {
        key_alias: props.get(keys::KEY_ALIAS).map(String::from),
        key_password: props.get(keys::KEY_PASSWORD).map(String::from),
        store_file: props
            .get_non_blank(keys::STORE_FILE)
            .map(|raw| layout.resolve_store_file(raw)),
        store_password: props.get(keys::STORE_PASSWORD).map(String::from),
    })
}

fn from_environment(layout: &ProjectLayout, encoded: &str, env: &Env) -> Result<KeystoreConfig> {
    let bytes = keystore::decode_keystore(encoded)?;
    keystore::write_keystore(&layout.ci_keystore, &bytes)?;

    tracing::info!(
        path = %layout.ci_keystore.display(),
        bytes = bytes.len(),
        sha256 = %keystore::fingerprint(&bytes),
        "Wrote keystore from KEYSTORE_BASE64"
    );

    Ok(KeystoreConfig {
        key_alias: env.get(env::KEY_ALIAS).map(String::from),
        key_password: env.get(env::KEY_PASSWORD).map(String::from),
        store_file: Some(layout.ci_keystore.clone()),
        store_password: env.get(env::STORE_PASSWORD).map(String::from),
    })
}
