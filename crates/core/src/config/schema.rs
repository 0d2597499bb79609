//! Configuration schema definitions
//!
//! Every field has a default so an empty or missing file yields the settings
//! of the reference app module.

use serde::{Deserialize, Serialize};

/// Root configuration schema
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigSchema {
    #[serde(default)]
    pub project: ProjectConfig,

    #[serde(default)]
    pub app: AppConfig,

    #[serde(default)]
    pub sdk: SdkConfig,

    #[serde(default)]
    pub packaging: PackagingConfig,
}

/// Where the Android project and its inputs live
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Android root project directory (contains `settings.gradle(.kts)`)
    #[serde(default)]
    pub android_root: Option<String>,

    /// App module directory, relative to the Android root
    #[serde(default = "default_app_dir")]
    pub app_dir: String,

    /// Signing properties file, relative to the Android root
    #[serde(default = "default_key_properties")]
    pub key_properties: String,

    /// Framework-written local properties, relative to the Android root
    #[serde(default = "default_local_properties")]
    pub local_properties: String,

    /// Where a keystore decoded from the environment is written, relative to the Android root
    #[serde(default = "default_ci_keystore")]
    pub ci_keystore: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            android_root: None,
            app_dir: default_app_dir(),
            key_properties: default_key_properties(),
            local_properties: default_local_properties(),
            ci_keystore: default_ci_keystore(),
        }
    }
}

fn default_app_dir() -> String {
    "app".to_string()
}

fn default_key_properties() -> String {
    "key.properties".to_string()
}

fn default_local_properties() -> String {
    "local.properties".to_string()
}

fn default_ci_keystore() -> String {
    "ci_keystore.jks".to_string()
}

/// Application identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application ID
    #[serde(default = "default_application_id")]
    pub application_id: String,

    /// Kotlin/Java namespace, defaults to the application ID
    #[serde(default)]
    pub namespace: Option<String>,

    /// Pinned NDK version
    #[serde(default = "default_ndk_version")]
    pub ndk_version: Option<String>,

    /// Java source/target compatibility
    #[serde(default = "default_java_version")]
    pub java_version: u8,

    /// Overrides the framework's version code
    #[serde(default)]
    pub version_code: Option<u32>,

    /// Overrides the framework's version name
    #[serde(default)]
    pub version_name: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            application_id: default_application_id(),
            namespace: None,
            ndk_version: default_ndk_version(),
            java_version: default_java_version(),
            version_code: None,
            version_name: None,
        }
    }
}

fn default_application_id() -> String {
    "com.protocentral.move".to_string()
}

fn default_ndk_version() -> Option<String> {
    Some("27.0.12077973".to_string())
}

fn default_java_version() -> u8 {
    11
}

/// SDK level overrides; unset levels come from the framework defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SdkConfig {
    #[serde(default)]
    pub min_sdk: Option<u32>,

    #[serde(default)]
    pub target_sdk: Option<u32>,

    #[serde(default)]
    pub compile_sdk: Option<u32>,
}

/// Release packaging flags
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PackagingConfig {
    /// Run R8 code shrinking
    #[serde(default)]
    pub minify_enabled: bool,

    /// Strip unused resources (requires `minify_enabled`)
    #[serde(default)]
    pub shrink_resources: bool,
}
