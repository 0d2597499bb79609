//! Android project layout
//!
//! Resolves where the signing inputs and outputs live relative to the
//! Android root project.

use droidsign_core::config::{expand_path, ProjectConfig};
use std::path::{Path, PathBuf};

/// Directory conventionally holding the Android project inside an app repo
const ANDROID_SUBDIR: &str = "android";

/// Paths the resolver reads and writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    /// Android root project directory
    pub root: PathBuf,
    /// App module directory; relative `storeFile` entries resolve against it
    pub app_dir: PathBuf,
    /// Signing properties file
    pub key_properties: PathBuf,
    /// Framework-written local properties
    pub local_properties: PathBuf,
    /// Output path for a keystore decoded from the environment
    pub ci_keystore: PathBuf,
}

impl ProjectLayout {
    /// Default layout rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_config(root.into(), &ProjectConfig::default())
    }

    /// Build the layout from configuration.
    ///
    /// The root is, in order: `project_dir`, the configured `android_root`,
    /// `./android` when it exists, then the current directory. Relative roots
    /// are made absolute against the current directory, so every derived path
    /// stays valid when Gradle runs inside the root.
    pub fn from_config(project_dir: Option<&Path>, config: &ProjectConfig) -> Self {
        let root = match (project_dir, config.android_root.as_deref()) {
            (Some(dir), _) => dir.to_path_buf(),
            (None, Some(configured)) => expand_path(configured),
            (None, None) if Path::new(ANDROID_SUBDIR).is_dir() => PathBuf::from(ANDROID_SUBDIR),
            (None, None) => PathBuf::from("."),
        };
        Self::with_config(root, config)
    }

    fn with_config(root: PathBuf, config: &ProjectConfig) -> Self {
        let root = std::path::absolute(&root).unwrap_or(root);
        let under_root = |raw: &str| {
            let path = expand_path(raw);
            if path.is_absolute() {
                path
            } else {
                root.join(path)
            }
        };

        Self {
            app_dir: under_root(&config.app_dir),
            key_properties: under_root(&config.key_properties),
            local_properties: under_root(&config.local_properties),
            ci_keystore: under_root(&config.ci_keystore),
            root,
        }
    }

    /// Whether the root looks like a Gradle project
    pub fn is_gradle_project(&self) -> bool {
        ["settings.gradle.kts", "settings.gradle"]
            .iter()
            .any(|name| self.root.join(name).is_file())
    }

    /// Resolve a `storeFile` value the way the app module's `file(...)` does.
    ///
    /// The value is taken literally; `~` and `$VAR` are not expanded.
    pub fn resolve_store_file(&self, raw: &str) -> PathBuf {
        let path = Path::new(raw);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.app_dir.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let layout = ProjectLayout::new("/work/move/android");
        assert_eq!(layout.app_dir, PathBuf::from("/work/move/android/app"));
        assert_eq!(layout.key_properties, PathBuf::from("/work/move/android/key.properties"));
        assert_eq!(layout.local_properties, PathBuf::from("/work/move/android/local.properties"));
        assert_eq!(layout.ci_keystore, PathBuf::from("/work/move/android/ci_keystore.jks"));
    }

    #[test]
    fn test_project_dir_overrides_config() {
        let config = ProjectConfig {
            android_root: Some("/elsewhere".to_string()),
            ..ProjectConfig::default()
        };
        let layout = ProjectLayout::from_config(Some(Path::new("/explicit")), &config);
        assert_eq!(layout.root, PathBuf::from("/explicit"));
    }

    #[test]
    fn test_configured_root_and_absolute_outputs() {
        let config = ProjectConfig {
            android_root: Some("/repo/android".to_string()),
            ci_keystore: "/tmp/ci/upload.jks".to_string(),
            ..ProjectConfig::default()
        };
        let layout = ProjectLayout::from_config(None, &config);
        assert_eq!(layout.root, PathBuf::from("/repo/android"));
        assert_eq!(layout.ci_keystore, PathBuf::from("/tmp/ci/upload.jks"));
    }

    #[test]
    fn test_store_file_relative_to_app_module() {
        let layout = ProjectLayout::new("/repo/android");
        assert_eq!(
            layout.resolve_store_file("upload-keystore.jks"),
            PathBuf::from("/repo/android/app/upload-keystore.jks")
        );
        assert_eq!(
            layout.resolve_store_file("/keys/upload.jks"),
            PathBuf::from("/keys/upload.jks")
        );
    }

    #[test]
    fn test_store_file_is_not_expanded() {
        let layout = ProjectLayout::new("/repo/android");
        assert_eq!(
            layout.resolve_store_file("$HOME/keys/~upload.jks"),
            PathBuf::from("/repo/android/app/$HOME/keys/~upload.jks")
        );
        assert_eq!(
            layout.resolve_store_file("~/upload.jks"),
            PathBuf::from("/repo/android/app/~/upload.jks")
        );
    }

    #[test]
    fn test_relative_root_is_made_absolute() {
        let cwd = std::env::current_dir().unwrap();
        let layout =
            ProjectLayout::from_config(Some(Path::new("mobile/android")), &ProjectConfig::default());

        assert!(layout.root.is_absolute());
        assert_eq!(layout.root, cwd.join("mobile/android"));
        assert_eq!(layout.ci_keystore, cwd.join("mobile/android/ci_keystore.jks"));
        assert_eq!(
            layout.resolve_store_file("upload.jks"),
            cwd.join("mobile/android/app/upload.jks")
        );
    }

    #[test]
    fn test_is_gradle_project() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ProjectLayout::new(dir.path());
        assert!(!layout.is_gradle_project());

        std::fs::write(dir.path().join("settings.gradle.kts"), "include(\":app\")\n").unwrap();
        assert!(layout.is_gradle_project());
    }
}
