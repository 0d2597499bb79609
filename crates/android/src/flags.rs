//! Release build flags
//!
//! SDK levels default to the app framework's values, version information
//! comes from the framework's entries in `local.properties`, and anything
//! can be pinned in configuration.

use droidsign_core::config::ConfigSchema;
use droidsign_core::error::{Error, ErrorCode, Result};
use droidsign_core::properties::Properties;
use serde::Serialize;

/// `local.properties` key holding the framework's version code
pub const VERSION_CODE_KEY: &str = "flutter.versionCode";
/// `local.properties` key holding the framework's version name
pub const VERSION_NAME_KEY: &str = "flutter.versionName";

/// SDK levels supplied by the app framework's Gradle plugin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FrameworkSdk {
    /// Lowest supported API level
    pub min_sdk: u32,
    /// API level the app is tested against
    pub target_sdk: u32,
    /// API level the app compiles against
    pub compile_sdk: u32,
}

impl FrameworkSdk {
    /// Levels shipped by the current framework release
    pub const DEFAULT: FrameworkSdk = FrameworkSdk {
        min_sdk: 21,
        target_sdk: 35,
        compile_sdk: 35,
    };
}

impl Default for FrameworkSdk {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Flags handed to the Android plugin for the release build type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildFlags {
    /// Package name published to the store
    pub application_id: String,
    /// Namespace for generated `R` and `BuildConfig` classes
    pub namespace: String,
    /// Lowest supported API level
    pub min_sdk: u32,
    /// API level the app is tested against
    pub target_sdk: u32,
    /// API level the app compiles against
    pub compile_sdk: u32,
    /// Pinned NDK, if any
    pub ndk_version: Option<String>,
    /// Monotonic store version, at least 1
    pub version_code: u32,
    /// User-visible version
    pub version_name: String,
    /// Java source and target compatibility
    pub java_version: u8,
    /// Code shrinking and obfuscation
    pub minify_enabled: bool,
    /// Unused resource removal; requires `minify_enabled`
    pub shrink_resources: bool,
}

impl BuildFlags {
    /// Merge framework defaults, `local.properties` and configuration, then validate
    pub fn resolve(schema: &ConfigSchema, local: Option<&Properties>) -> Result<Self> {
        let sdk = FrameworkSdk::DEFAULT;

        let version_code = match schema.app.version_code {
            Some(code) => code,
            None => local_version_code(local)?.unwrap_or(1),
        };
        let version_name = schema
            .app
            .version_name
            .clone()
            .or_else(|| local.and_then(|p| p.get_non_blank(VERSION_NAME_KEY)).map(String::from))
            .unwrap_or_else(|| "1.0".to_string());

        let flags = Self {
            application_id: schema.app.application_id.clone(),
            namespace: schema
                .app
                .namespace
                .clone()
                .unwrap_or_else(|| schema.app.application_id.clone()),
            min_sdk: schema.sdk.min_sdk.unwrap_or(sdk.min_sdk),
            target_sdk: schema.sdk.target_sdk.unwrap_or(sdk.target_sdk),
            compile_sdk: schema.sdk.compile_sdk.unwrap_or(sdk.compile_sdk),
            ndk_version: schema.app.ndk_version.clone(),
            version_code,
            version_name,
            java_version: schema.app.java_version,
            minify_enabled: schema.packaging.minify_enabled,
            shrink_resources: schema.packaging.shrink_resources,
        };

        flags.validate()?;
        Ok(flags)
    }

    /// Reject combinations the Android plugin would refuse
    pub fn validate(&self) -> Result<()> {
        if self.application_id.trim().is_empty() {
            return Err(Error::validation("Application ID must not be empty"));
        }
        if self.min_sdk > self.target_sdk {
            return Err(Error::new(
                ErrorCode::ConstraintViolation,
                format!(
                    "minSdk ({}) is greater than targetSdk ({})",
                    self.min_sdk, self.target_sdk
                ),
            ));
        }
        if self.target_sdk > self.compile_sdk {
            return Err(Error::new(
                ErrorCode::ConstraintViolation,
                format!(
                    "targetSdk ({}) is greater than compileSdk ({})",
                    self.target_sdk, self.compile_sdk
                ),
            ));
        }
        if self.version_code == 0 {
            return Err(Error::validation("versionCode must be a positive integer"));
        }
        if self.shrink_resources && !self.minify_enabled {
            return Err(Error::new(
                ErrorCode::ConstraintViolation,
                "shrinkResources requires minifyEnabled",
            )
            .with_suggestion("Set packaging.minify_enabled = true or disable shrink_resources"));
        }
        Ok(())
    }
}

fn local_version_code(local: Option<&Properties>) -> Result<Option<u32>> {
    let Some(raw) = local.and_then(|p| p.get_non_blank(VERSION_CODE_KEY)) else {
        return Ok(None);
    };
    raw.trim().parse::<u32>().map(Some).map_err(|e| {
        Error::properties(format!("{} is not an integer: {:?}", VERSION_CODE_KEY, raw))
            .with_context("Reading local.properties")
            .with_source(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local(text: &str) -> Properties {
        Properties::parse(text).unwrap()
    }

    #[test]
    fn test_defaults() {
        let flags = BuildFlags::resolve(&ConfigSchema::default(), None).unwrap();
        assert_eq!(flags.application_id, "com.protocentral.move");
        assert_eq!(flags.namespace, "com.protocentral.move");
        assert_eq!(flags.min_sdk, 21);
        assert_eq!(flags.target_sdk, 35);
        assert_eq!(flags.compile_sdk, 35);
        assert_eq!(flags.ndk_version.as_deref(), Some("27.0.12077973"));
        assert_eq!(flags.version_code, 1);
        assert_eq!(flags.version_name, "1.0");
        assert_eq!(flags.java_version, 11);
        assert!(!flags.minify_enabled);
        assert!(!flags.shrink_resources);
    }

    #[test]
    fn test_local_properties_versions() {
        let props = local("flutter.sdk=/opt/flutter\nflutter.versionName=3.1.0\nflutter.versionCode=31\n");
        let flags = BuildFlags::resolve(&ConfigSchema::default(), Some(&props)).unwrap();
        assert_eq!(flags.version_code, 31);
        assert_eq!(flags.version_name, "3.1.0");
    }

    #[test]
    fn test_config_overrides_local_properties() {
        let mut schema = ConfigSchema::default();
        schema.app.version_code = Some(100);
        schema.app.version_name = Some("10.0.0".to_string());
        schema.app.namespace = Some("com.protocentral.move.app".to_string());
        schema.sdk.min_sdk = Some(26);

        let props = local("flutter.versionName=3.1.0\nflutter.versionCode=31\n");
        let flags = BuildFlags::resolve(&schema, Some(&props)).unwrap();
        assert_eq!(flags.version_code, 100);
        assert_eq!(flags.version_name, "10.0.0");
        assert_eq!(flags.namespace, "com.protocentral.move.app");
        assert_eq!(flags.min_sdk, 26);
    }

    #[test]
    fn test_non_numeric_version_code() {
        let props = local("flutter.versionCode=1.2\n");
        let err = BuildFlags::resolve(&ConfigSchema::default(), Some(&props)).unwrap_err();
        assert_eq!(err.code, ErrorCode::PropertiesParseError);
    }

    #[test]
    fn test_rejects_shrink_without_minify() {
        let mut schema = ConfigSchema::default();
        schema.packaging.shrink_resources = true;
        let err = BuildFlags::resolve(&schema, None).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConstraintViolation);

        schema.packaging.minify_enabled = true;
        assert!(BuildFlags::resolve(&schema, None).is_ok());
    }

    #[test]
    fn test_rejects_sdk_ordering() {
        let mut schema = ConfigSchema::default();
        schema.sdk.min_sdk = Some(36);
        assert_eq!(
            BuildFlags::resolve(&schema, None).unwrap_err().code,
            ErrorCode::ConstraintViolation
        );

        let mut schema = ConfigSchema::default();
        schema.sdk.target_sdk = Some(36);
        assert_eq!(
            BuildFlags::resolve(&schema, None).unwrap_err().code,
            ErrorCode::ConstraintViolation
        );
    }

    #[test]
    fn test_rejects_empty_application_id_and_zero_version() {
        let mut schema = ConfigSchema::default();
        schema.app.application_id = "  ".to_string();
        assert_eq!(
            BuildFlags::resolve(&schema, None).unwrap_err().code,
            ErrorCode::ValidationError
        );

        let mut schema = ConfigSchema::default();
        schema.app.version_code = Some(0);
        assert_eq!(
            BuildFlags::resolve(&schema, None).unwrap_err().code,
            ErrorCode::ValidationError
        );
    }
}
