//! droidsign CLI
//!
//! Resolves Android release signing and packaging configuration for local
//! and CI builds.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use droidsign_android::doctor::{self, CheckStatus};
use droidsign_android::signing::keystore::keys;
use droidsign_android::{
    gradle, BuildFlags, Env, KeystoreConfig, KeystoreSource, ProjectLayout, ResolvedConfig,
    Resolver, SigningSelection,
};
use droidsign_cli::output::{format_count, format_duration, format_size, or_dash, Status};
use droidsign_cli::progress;
use droidsign_core::config::Config;
use droidsign_core::error::{exit_codes, Error};
use droidsign_core::properties::Properties;
use droidsign_telemetry::TelemetryConfig;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "droidsign")]
#[command(about = "Resolve Android release signing and packaging configuration")]
#[command(version)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Android root project directory
    #[arg(short, long, global = true, env = "DROIDSIGN_PROJECT_DIR")]
    project_dir: Option<PathBuf>,

    /// Increase output verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Write the log file as JSON lines
    #[arg(long, global = true, requires = "log_file")]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve release signing credentials
    Resolve {
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
        /// Print passwords instead of masking them
        #[arg(long)]
        show_secrets: bool,
    },

    /// Print the release build flags
    Flags {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that release signing is ready
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the release Gradle task with the resolved signing
    Build {
        /// Build bundle (AAB) instead of APK
        #[arg(long)]
        bundle: bool,
        /// Print the Gradle command without running it
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Human-readable summary
    Text,
    /// JSON document
    Json,
    /// `key.properties` text
    Properties,
}

/// Inputs shared by every command
struct Context {
    config: Config,
    layout: ProjectLayout,
    quiet: bool,
}

impl Context {
    fn info(&self, message: &str) {
        if !self.quiet {
            Status::info(message);
        }
    }

    fn resolve(&self) -> droidsign_core::Result<ResolvedConfig> {
        Resolver::new(&self.layout, &self.config.schema).resolve(&Env::capture())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResolveReport<'a> {
    source: &'a KeystoreSource,
    signing: SigningSelection,
    flags: &'a BuildFlags,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        owo_colors::set_override(false);
    }

    let mut telemetry = TelemetryConfig::for_verbosity(cli.verbose, cli.quiet);
    telemetry.log_file = cli.log_file.clone();
    telemetry.json_file = cli.log_json;
    let guard = droidsign_telemetry::init_with_config(telemetry)?;

    let exit_code = run(cli);

    // process::exit skips destructors; flush the log file first
    drop(guard);
    std::process::exit(exit_code);
}

fn run(cli: Cli) -> i32 {
    let json = matches!(
        cli.command,
        Commands::Resolve { format: Format::Json, .. }
            | Commands::Flags { json: true }
            | Commands::Doctor { json: true }
    );

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => return report_error(&e, json),
    };
    let layout = ProjectLayout::from_config(cli.project_dir.as_deref(), &config.schema.project);
    tracing::debug!(root = %layout.root.display(), "Using Android project");

    let ctx = Context {
        config,
        layout,
        quiet: cli.quiet,
    };

    let result = match cli.command {
        Commands::Resolve { format, show_secrets } => run_resolve(&ctx, format, show_secrets),
        Commands::Flags { json } => run_flags(&ctx, json),
        Commands::Doctor { json } => run_doctor(&ctx, json),
        Commands::Build { bundle, dry_run } => run_build(&ctx, bundle, dry_run),
    };

    match result {
        Ok(code) => code,
        Err(e) => report_error(&e, json),
    }
}

fn report_error(err: &Error, json: bool) -> i32 {
    tracing::debug!(code = %err.code, "Command failed");
    if json {
        match serde_json::to_string_pretty(&err.to_report()) {
            Ok(text) => println!("{}", text),
            Err(e) => tracing::warn!(error = %e, "Failed to render error report"),
        }
    }
    Status::error(&err.to_string());
    err.exit_code()
}

fn run_resolve(ctx: &Context, format: Format, show_secrets: bool) -> droidsign_core::Result<i32> {
    let resolved = ctx.resolve()?;
    let selection = SigningSelection::select(&resolved);
    let shown = if show_secrets {
        selection.clone()
    } else {
        selection.redacted()
    };

    match format {
        Format::Json => {
            let report = ResolveReport {
                source: &resolved.source,
                signing: shown,
                flags: &resolved.flags,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Format::Properties => match &shown {
            SigningSelection::Release(keystore) => {
                print!("{}", keystore_properties(keystore).to_properties_string());
            }
            SigningSelection::Debug => {
                Status::warning("No release signing input found; nothing to write");
            }
        },
        Format::Text => print_resolution(ctx, &resolved, &shown),
    }

    Ok(exit_codes::SUCCESS)
}

fn keystore_properties(keystore: &KeystoreConfig) -> Properties {
    let mut props = Properties::new();
    let fields = [
        (keys::KEY_ALIAS, keystore.key_alias.clone()),
        (keys::KEY_PASSWORD, keystore.key_password.clone()),
        (
            keys::STORE_FILE,
            keystore.store_file.as_ref().map(|p| p.display().to_string()),
        ),
        (keys::STORE_PASSWORD, keystore.store_password.clone()),
    ];
    for (key, value) in fields {
        if let Some(value) = value {
            props.insert(key, value);
        }
    }
    props
}

fn print_resolution(ctx: &Context, resolved: &ResolvedConfig, shown: &SigningSelection) {
    if ctx.quiet {
        return;
    }

    Status::header("Release signing");
    let source = match &resolved.source {
        KeystoreSource::PropertiesFile { path } => path.display().to_string(),
        KeystoreSource::Environment { .. } => "KEYSTORE_BASE64".to_string(),
        KeystoreSource::Absent => "none".to_string(),
    };
    Status::field("source", &source);
    Status::field("signing", shown.name());

    if let SigningSelection::Release(keystore) = shown {
        Status::field(keys::KEY_ALIAS, &or_dash(keystore.key_alias.as_deref()));
        Status::field(keys::KEY_PASSWORD, &or_dash(keystore.key_password.as_deref()));
        let store_file = keystore.store_file.as_ref().map(|p| p.display().to_string());
        Status::field(keys::STORE_FILE, &or_dash(store_file.as_deref()));
        Status::field(keys::STORE_PASSWORD, &or_dash(keystore.store_password.as_deref()));

        if let KeystoreSource::Environment { written_to } = &resolved.source {
            if let Ok(meta) = std::fs::metadata(written_to) {
                Status::field("keystore size", &format_size(meta.len()));
            }
        }

        let missing = keystore.missing_fields();
        if !missing.is_empty() {
            Status::warning(&format!("Missing signing fields: {}", missing.join(", ")));
        }
    } else {
        ctx.info("Release builds will be signed with the debug key");
    }
}

fn run_flags(ctx: &Context, json: bool) -> droidsign_core::Result<i32> {
    let local = Properties::load_optional(&ctx.layout.local_properties)?;
    let flags = BuildFlags::resolve(&ctx.config.schema, local.as_ref())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&flags)?);
        return Ok(exit_codes::SUCCESS);
    }

    if !ctx.quiet {
        Status::header("Release build flags");
        Status::field("applicationId", &flags.application_id);
        Status::field("namespace", &flags.namespace);
        Status::field("minSdk", &flags.min_sdk.to_string());
        Status::field("targetSdk", &flags.target_sdk.to_string());
        Status::field("compileSdk", &flags.compile_sdk.to_string());
        Status::field("ndkVersion", &or_dash(flags.ndk_version.as_deref()));
        Status::field("versionCode", &flags.version_code.to_string());
        Status::field("versionName", &flags.version_name);
        Status::field("javaVersion", &flags.java_version.to_string());
        Status::field("minifyEnabled", &flags.minify_enabled.to_string());
        Status::field("shrinkResources", &flags.shrink_resources.to_string());
    }

    Ok(exit_codes::SUCCESS)
}

fn run_doctor(ctx: &Context, json: bool) -> droidsign_core::Result<i32> {
    let resolved = ctx.resolve()?;
    let report = doctor::diagnose(&ctx.layout, &resolved);
    let exit_code = if report.has_failures() {
        exit_codes::VALIDATION_ERROR
    } else {
        exit_codes::SUCCESS
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(exit_code);
    }

    if !ctx.quiet {
        Status::header("Signing readiness");
    }
    for check in &report.checks {
        let line = format!("{}: {}", check.name, check.message);
        match check.status {
            CheckStatus::Ok if !ctx.quiet => Status::success(&line),
            CheckStatus::Ok => {}
            CheckStatus::Warning => Status::warning(&line),
            CheckStatus::Failed => Status::error(&line),
        }
    }

    let failed = report
        .checks
        .iter()
        .filter(|c| c.status == CheckStatus::Failed)
        .count();
    if failed > 0 {
        Status::error(&format!(
            "{} failed; release signing ({}) is not ready",
            format_count(failed, "check", "checks"),
            report.signing
        ));
    } else if !ctx.quiet {
        Status::success(&format!("Release builds use {} signing", report.signing));
    }

    Ok(exit_code)
}

fn run_build(ctx: &Context, bundle: bool, dry_run: bool) -> droidsign_core::Result<i32> {
    let resolved = ctx.resolve()?;
    let selection = SigningSelection::select(&resolved);
    let task = gradle::release_task(bundle);

    let keystore = match &selection {
        SigningSelection::Release(keystore) => Some(keystore),
        SigningSelection::Debug => {
            Status::warning("No release signing input; building with debug signing");
            None
        }
    };
    if let Some(keystore) = keystore {
        keystore.ensure_usable()?;
    }

    if dry_run {
        let gradle = gradle::gradle_command(&ctx.layout.root)?;
        let args = keystore.map(gradle::injected_signing_args).unwrap_or_default();
        println!(
            "{} {} {}",
            gradle.to_string_lossy(),
            task,
            gradle::mask_secrets(&args).join(" ")
        );
        return Ok(exit_codes::SUCCESS);
    }

    ctx.info(&format!("Building {} with {} signing...", task, selection.name()));
    let spinner = progress::spinner(&format!("Running {}", task));
    let started = Instant::now();

    let result = match gradle::build_release(&ctx.layout.root, bundle, keystore) {
        Ok(result) => result,
        Err(e) => {
            progress::finish_error(&spinner, "Gradle could not be started");
            return Err(e);
        }
    };

    let elapsed = format_duration(started.elapsed());
    if result.success {
        progress::finish_success(&spinner, &format!("{} finished in {}", task, elapsed));
        Ok(exit_codes::SUCCESS)
    } else {
        progress::finish_error(&spinner, &format!("{} failed after {}", task, elapsed));
        eprintln!("{}", result.combined_output());
        Err(Error::gradle(task, result.exit_code))
    }
}
