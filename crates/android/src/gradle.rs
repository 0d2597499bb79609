//! Gradle build system integration
//!
//! Runs release tasks with signing injected through the Android plugin's
//! `android.injected.signing.*` properties, so the module's own signing
//! config does not need to know where credentials came from.

use crate::signing::KeystoreConfig;
use droidsign_core::error::{Error, Result};
use droidsign_core::process::{run_command_in_dir, which_command, CommandResult};
use std::ffi::OsString;
use std::path::Path;

const INJECTED_STORE_FILE: &str = "android.injected.signing.store.file";
const INJECTED_STORE_PASSWORD: &str = "android.injected.signing.store.password";
const INJECTED_KEY_ALIAS: &str = "android.injected.signing.key.alias";
const INJECTED_KEY_PASSWORD: &str = "android.injected.signing.key.password";

const MASK: &str = "********";

/// Release task to run
pub fn release_task(bundle: bool) -> &'static str {
    if bundle {
        "bundleRelease"
    } else {
        "assembleRelease"
    }
}

/// `-P` arguments for the fields present in `keystore`
pub fn injected_signing_args(keystore: &KeystoreConfig) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(store_file) = &keystore.store_file {
        args.push(format!("-P{}={}", INJECTED_STORE_FILE, store_file.display()));
    }
    if let Some(password) = &keystore.store_password {
        args.push(format!("-P{}={}", INJECTED_STORE_PASSWORD, password));
    }
    if let Some(alias) = &keystore.key_alias {
        args.push(format!("-P{}={}", INJECTED_KEY_ALIAS, alias));
    }
    if let Some(password) = &keystore.key_password {
        args.push(format!("-P{}={}", INJECTED_KEY_PASSWORD, password));
    }
    args
}

/// Copy of `args` with password values masked, for display
pub fn mask_secrets(args: &[String]) -> Vec<String> {
    let secret_prefixes = [
        format!("-P{}=", INJECTED_STORE_PASSWORD),
        format!("-P{}=", INJECTED_KEY_PASSWORD),
    ];
    args.iter()
        .map(|arg| {
            secret_prefixes
                .iter()
                .find(|prefix| arg.starts_with(prefix.as_str()))
                .map(|prefix| format!("{}{}", prefix, MASK))
                .unwrap_or_else(|| arg.clone())
        })
        .collect()
}

/// Locate the Gradle launcher: the project wrapper, else `gradle` on PATH
pub fn gradle_command(project_dir: &Path) -> Result<OsString> {
    let wrapper = if cfg!(windows) {
        "gradlew.bat"
    } else {
        "gradlew"
    };

    if project_dir.join(wrapper).is_file() {
        let invocation = if cfg!(windows) {
            wrapper.to_string()
        } else {
            format!("./{}", wrapper)
        };
        return Ok(OsString::from(invocation));
    }

    which_command("gradle")
        .map(OsString::from)
        .ok_or_else(|| Error::command_not_found("gradle").with_context(format!(
            "No {} in {}",
            wrapper,
            project_dir.display()
        )))
}

/// Run a Gradle task with extra arguments
pub fn run_task(project_dir: &Path, task: &str, extra_args: &[String]) -> Result<CommandResult> {
    let gradle = gradle_command(project_dir)?;

    let mut args = Vec::with_capacity(extra_args.len() + 1);
    args.push(task.to_string());
    args.extend(extra_args.iter().cloned());

    tracing::info!(task, dir = %project_dir.display(), "Running Gradle");
    run_command_in_dir(gradle, &args[..], project_dir)
}

/// Build the release artifact, injecting signing when a keystore is given
pub fn build_release(
    project_dir: &Path,
    bundle: bool,
    keystore: Option<&KeystoreConfig>,
) -> Result<CommandResult> {
    let extra = keystore.map(injected_signing_args).unwrap_or_default();
    run_task(project_dir, release_task(bundle), &extra)
}
