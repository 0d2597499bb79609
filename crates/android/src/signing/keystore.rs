//! Keystore credentials and CI keystore materialization

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use droidsign_core::error::{Error, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Standard alphabet; `=` padding optional and stray trailing bits ignored on input
const KEYSTORE_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

const REDACTED: &str = "********";

/// Property names used in `key.properties`
pub mod keys {
    /// Alias of the signing key
    pub const KEY_ALIAS: &str = "keyAlias";
    /// Password of the signing key
    pub const KEY_PASSWORD: &str = "keyPassword";
    /// Path of the keystore file
    pub const STORE_FILE: &str = "storeFile";
    /// Password of the keystore
    pub const STORE_PASSWORD: &str = "storePassword";
}

/// Signing credentials handed to the release signing config.
///
/// Any field may be absent; the build tool reports incomplete configs.
#[derive(Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeystoreConfig {
    /// Alias of the signing key inside the keystore
    pub key_alias: Option<String>,
    /// Password of the signing key
    pub key_password: Option<String>,
    /// Keystore location, already resolved against the app module
    pub store_file: Option<PathBuf>,
    /// Password of the keystore
    pub store_password: Option<String>,
}

impl KeystoreConfig {
    /// Whether no field is set
    pub fn is_empty(&self) -> bool {
        self.missing_fields().len() == 4
    }

    /// Names of the absent fields, as spelled in `key.properties`
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.key_alias.is_none() {
            missing.push(keys::KEY_ALIAS);
        }
        if self.key_password.is_none() {
            missing.push(keys::KEY_PASSWORD);
        }
        if self.store_file.is_none() {
            missing.push(keys::STORE_FILE);
        }
        if self.store_password.is_none() {
            missing.push(keys::STORE_PASSWORD);
        }
        missing
    }

    /// Check that a release build can sign with these credentials.
    ///
    /// Every field must be present and `store_file` must exist.
    pub fn ensure_usable(&self) -> Result<()> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(Error::incomplete_signing(&missing));
        }
        match &self.store_file {
            Some(path) if !path.is_file() => Err(Error::keystore_not_found(path)),
            _ => Ok(()),
        }
    }

    /// Copy with both passwords masked
    pub fn redacted(&self) -> Self {
        let mask = |p: &Option<String>| p.as_ref().map(|_| REDACTED.to_string());
        Self {
            key_alias: self.key_alias.clone(),
            key_password: mask(&self.key_password),
            store_file: self.store_file.clone(),
            store_password: mask(&self.store_password),
        }
    }
}

impl std::fmt::Debug for KeystoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redacted = self.redacted();
        f.debug_struct("KeystoreConfig")
            .field("key_alias", &redacted.key_alias)
            .field("key_password", &redacted.key_password)
            .field("store_file", &redacted.store_file)
            .field("store_password", &redacted.store_password)
            .finish()
    }
}

/// Decode a base64 keystore secret.
///
/// ASCII whitespace is ignored so line-wrapped `base64` output works.
pub fn decode_keystore(encoded: &str) -> Result<Vec<u8>> {
    let compact: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    KEYSTORE_ENGINE.decode(compact.as_bytes()).map_err(|e| {
        Error::keystore_decode(format!("KEYSTORE_BASE64 is not valid base64: {}", e))
            .with_source(e)
    })
}

/// Write keystore bytes to `path`, replacing any previous file.
///
/// Bytes go to a temp file in the same directory which is then renamed, so
/// readers never see a partial keystore. The temp file is created owner-only.
pub fn write_keystore(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| {
        Error::from(e.error).with_context(format!("Writing keystore to {}", path.display()))
    })?;

    Ok(())
}

/// SHA-256 of the keystore bytes, lowercase hex
pub fn fingerprint(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
