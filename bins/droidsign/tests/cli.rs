use assert_cmd::Command;
use base64::Engine;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

const KEYSTORE_BYTES: &[u8] = &[0xfe, 0xed, 0xfe, 0xed, 0x00, 0x00, 0x00, 0x02, 0x11, 0x22];

/// A droidsign invocation run from `cwd`, isolated from the caller's environment and config
fn droidsign_in(cwd: &Path) -> Command {
    let mut cmd = Command::cargo_bin("droidsign").unwrap();
    cmd.current_dir(cwd)
        .env("XDG_CONFIG_HOME", cwd.join(".xdg"))
        .env_remove("RUST_LOG")
        .env_remove("DROIDSIGN_PROJECT_DIR")
        .env_remove("KEYSTORE_BASE64")
        .env_remove("KEY_ALIAS")
        .env_remove("KEY_PASSWORD")
        .env_remove("STORE_PASSWORD")
        .arg("--no-color");
    cmd
}

/// Same as [`droidsign_in`], with `project` as the explicit Android root
fn droidsign(project: &Path) -> Command {
    let mut cmd = droidsign_in(project);
    cmd.arg("--project-dir").arg(project);
    cmd
}

/// Gradle wrapper stand-in that fails unless every injected store file exists,
/// then records its working directory and arguments in `gradle-args.txt`
#[cfg(unix)]
const CHECKING_GRADLEW: &str = r#"#!/bin/sh
for arg in "$@"; do
  case "$arg" in
    -Pandroid.injected.signing.store.file=*)
      store="${arg#*=}"
      if [ ! -f "$store" ]; then
        echo "keystore $store does not exist from $PWD" >&2
        exit 7
      fi
      ;;
  esac
done
printf '%s\n' "$PWD" "$@" > gradle-args.txt
"#;

#[cfg(unix)]
fn gradlew_stub(dir: &Path, script: &str) {
    use std::os::unix::fs::PermissionsExt;

    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join("gradlew");
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

fn with_ci_env(cmd: &mut Command) -> &mut Command {
    cmd.env(
        "KEYSTORE_BASE64",
        base64::engine::general_purpose::STANDARD.encode(KEYSTORE_BYTES),
    )
    .env("KEY_ALIAS", "ci-alias")
    .env("KEY_PASSWORD", "ci-key-pass")
    .env("STORE_PASSWORD", "ci-store-pass")
}

fn json_stdout(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.output().unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_help() {
    Command::cargo_bin("droidsign")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("resolve"))
        .stdout(predicate::str::contains("doctor"));
}

#[test]
fn test_resolve_from_environment_writes_keystore() {
    let project = TempDir::new().unwrap();
    let mut cmd = droidsign(project.path());
    with_ci_env(&mut cmd).args(["resolve", "--format", "json"]);

    let json = json_stdout(&mut cmd);
    let keystore_path = project.path().join("ci_keystore.jks");

    assert_eq!(json["source"]["kind"], "environment");
    assert_eq!(json["signing"]["identity"], "release");
    assert_eq!(json["signing"]["keystore"]["keyAlias"], "ci-alias");
    assert_eq!(json["signing"]["keystore"]["keyPassword"], "********");
    assert_eq!(
        json["signing"]["keystore"]["storeFile"],
        keystore_path.display().to_string()
    );
    assert_eq!(std::fs::read(&keystore_path).unwrap(), KEYSTORE_BYTES);
}

#[test]
fn test_resolve_show_secrets() {
    let project = TempDir::new().unwrap();
    let mut cmd = droidsign(project.path());
    with_ci_env(&mut cmd).args(["resolve", "--format", "json", "--show-secrets"]);

    let json = json_stdout(&mut cmd);
    assert_eq!(json["signing"]["keystore"]["keyPassword"], "ci-key-pass");
    assert_eq!(json["signing"]["keystore"]["storePassword"], "ci-store-pass");
}

#[test]
fn test_resolve_without_inputs_uses_debug() {
    let project = TempDir::new().unwrap();
    let json = json_stdout(droidsign(project.path()).args(["resolve", "--format", "json"]));

    assert_eq!(json["source"]["kind"], "absent");
    assert_eq!(json["signing"]["identity"], "debug");
    assert_eq!(json["flags"]["applicationId"], "com.protocentral.move");
    assert!(!project.path().join("ci_keystore.jks").exists());
}

#[test]
fn test_properties_file_wins_over_environment() {
    let project = TempDir::new().unwrap();
    std::fs::write(
        project.path().join("key.properties"),
        "keyAlias=file-alias\nkeyPassword=fk\nstorePassword=fs\nstoreFile=/keys/upload.jks\n",
    )
    .unwrap();

    let mut cmd = droidsign(project.path());
    with_ci_env(&mut cmd).args(["resolve", "--format", "properties", "--show-secrets"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("keyAlias=file-alias"))
        .stdout(predicate::str::contains("storeFile=/keys/upload.jks"))
        .stdout(predicate::str::contains("ci-alias").not());
    assert!(!project.path().join("ci_keystore.jks").exists());
}

#[test]
fn test_invalid_base64_exits_with_config_error() {
    let project = TempDir::new().unwrap();
    droidsign(project.path())
        .env("KEYSTORE_BASE64", "!!not base64!!")
        .arg("resolve")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("E4001"));

    assert!(!project.path().join("ci_keystore.jks").exists());
}

#[test]
fn test_malformed_properties_exits_with_config_error() {
    let project = TempDir::new().unwrap();
    std::fs::write(project.path().join("key.properties"), "keyAlias=\\uXYZW\n").unwrap();

    droidsign(project.path())
        .arg("resolve")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("E3003"));
}

#[test]
fn test_flags_from_local_properties() {
    let project = TempDir::new().unwrap();
    std::fs::write(
        project.path().join("local.properties"),
        "flutter.versionName=1.4.2\nflutter.versionCode=14\n",
    )
    .unwrap();

    let json = json_stdout(droidsign(project.path()).args(["flags", "--json"]));
    assert_eq!(json["versionCode"], 14);
    assert_eq!(json["versionName"], "1.4.2");
    assert_eq!(json["minifyEnabled"], false);
    assert_eq!(json["ndkVersion"], "27.0.12077973");
}

#[test]
fn test_flags_rejects_shrink_without_minify() {
    let project = TempDir::new().unwrap();
    let config = project.path().join("droidsign.toml");
    std::fs::write(&config, "[packaging]\nshrink_resources = true\n").unwrap();

    droidsign(project.path())
        .arg("--config")
        .arg(&config)
        .arg("flags")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("shrinkResources requires minifyEnabled"));
}

#[test]
fn test_missing_config_file() {
    let project = TempDir::new().unwrap();
    droidsign(project.path())
        .args(["--config", "does-not-exist.toml", "flags"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Configuration file not found"));
}

#[test]
fn test_doctor_fails_on_missing_keystore() {
    let project = TempDir::new().unwrap();
    std::fs::write(
        project.path().join("key.properties"),
        "keyAlias=upload\nkeyPassword=a\nstorePassword=b\nstoreFile=gone.jks\n",
    )
    .unwrap();

    droidsign(project.path())
        .arg("doctor")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_doctor_passes_for_ci_keystore() {
    let project = TempDir::new().unwrap();
    let mut cmd = droidsign(project.path());
    with_ci_env(&mut cmd).args(["doctor", "--json"]);

    let json = json_stdout(&mut cmd);
    assert_eq!(json["signing"], "release");
}

#[test]
fn test_build_dry_run_masks_passwords() {
    let project = TempDir::new().unwrap();
    std::fs::write(project.path().join("gradlew"), "#!/bin/sh\nexit 0\n").unwrap();
    std::fs::write(project.path().join("gradlew.bat"), "@exit 0\r\n").unwrap();

    let mut cmd = droidsign(project.path());
    with_ci_env(&mut cmd).args(["build", "--bundle", "--dry-run"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("bundleRelease"))
        .stdout(predicate::str::contains("android.injected.signing.key.alias=ci-alias"))
        .stdout(predicate::str::contains("android.injected.signing.key.password=********"))
        .stdout(predicate::str::contains("ci-key-pass").not());
}

#[cfg(unix)]
#[test]
fn test_build_from_repo_root_uses_android_dir() {
    let repo = TempDir::new().unwrap();
    let android = repo.path().join("android");
    gradlew_stub(&android, CHECKING_GRADLEW);

    let mut cmd = droidsign_in(repo.path());
    with_ci_env(&mut cmd).arg("build");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Building assembleRelease with release signing"));

    assert_eq!(std::fs::read(android.join("ci_keystore.jks")).unwrap(), KEYSTORE_BYTES);
    assert!(!repo.path().join("ci_keystore.jks").exists());

    let recorded = std::fs::read_to_string(android.join("gradle-args.txt")).unwrap();
    let mut lines = recorded.lines();
    assert!(lines.next().unwrap().ends_with("android"));
    assert_eq!(lines.next(), Some("assembleRelease"));
    let store_file = lines
        .find_map(|l| l.strip_prefix("-Pandroid.injected.signing.store.file="))
        .unwrap();
    assert!(Path::new(store_file).is_absolute());
    assert!(store_file.ends_with("android/ci_keystore.jks"));
}

#[cfg(unix)]
#[test]
fn test_build_with_relative_project_dir() {
    let repo = TempDir::new().unwrap();
    let android = repo.path().join("mobile").join("android");
    gradlew_stub(&android, CHECKING_GRADLEW);

    let mut cmd = droidsign_in(repo.path());
    with_ci_env(&mut cmd).args(["--project-dir", "mobile/android", "build", "--bundle"]);

    cmd.assert().success();
    assert!(android.join("ci_keystore.jks").is_file());
    let recorded = std::fs::read_to_string(android.join("gradle-args.txt")).unwrap();
    assert!(recorded.lines().any(|l| l == "bundleRelease"));
}

#[test]
fn test_resolve_relative_store_file_is_absolute() {
    let repo = TempDir::new().unwrap();
    let android = repo.path().join("android");
    std::fs::create_dir_all(android.join("app")).unwrap();
    std::fs::write(
        android.join("key.properties"),
        "keyAlias=upload\nkeyPassword=a\nstorePassword=b\nstoreFile=upload.jks\n",
    )
    .unwrap();

    let json = json_stdout(droidsign_in(repo.path()).args(["resolve", "--format", "json"]));

    assert_eq!(json["source"]["kind"], "properties_file");
    let store_file = json["signing"]["keystore"]["storeFile"].as_str().unwrap();
    assert!(Path::new(store_file).is_absolute());
    assert!(store_file.ends_with("android/app/upload.jks"));
}

#[cfg(unix)]
#[test]
fn test_build_failure_reports_gradle_error() {
    let project = TempDir::new().unwrap();
    gradlew_stub(
        project.path(),
        "#!/bin/sh\necho 'FAILURE: Build failed with an exception.' >&2\nexit 1\n",
    );

    let mut cmd = droidsign(project.path());
    with_ci_env(&mut cmd).arg("build");

    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("FAILURE: Build failed with an exception."))
        .stderr(predicate::str::contains("E8001"))
        .stderr(predicate::str::contains("ci-key-pass").not());
}

#[cfg(unix)]
#[test]
fn test_build_rejects_missing_keystore_before_gradle() {
    let project = TempDir::new().unwrap();
    gradlew_stub(project.path(), CHECKING_GRADLEW);
    std::fs::write(
        project.path().join("key.properties"),
        "keyAlias=upload\nkeyPassword=a\nstorePassword=b\nstoreFile=gone.jks\n",
    )
    .unwrap();

    droidsign(project.path())
        .arg("build")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("E4002"));

    assert!(!project.path().join("gradle-args.txt").exists());
}

#[test]
fn test_build_rejects_incomplete_signing() {
    let project = TempDir::new().unwrap();
    std::fs::write(project.path().join("key.properties"), "keyAlias=upload\n").unwrap();

    droidsign(project.path())
        .args(["build", "--dry-run"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("E4003"))
        .stderr(predicate::str::contains("keyPassword"));
}
