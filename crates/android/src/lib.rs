//! Android release-signing and packaging configuration
//!
//! This crate decides, once per build, what the Android Gradle Plugin is
//! handed for the release build type:
//! - Project layout (Android root, app module, signing inputs)
//! - Keystore resolution from `key.properties` or CI environment variables
//! - Release vs debug signing selection
//! - Build flags (SDK levels, version, packaging)
//! - Gradle invocation with injected signing properties
//! - Signing readiness checks
//!
//! # Example
//!
//! ```rust,no_run
//! use droidsign_android::{Env, ProjectLayout, Resolver, SigningSelection};
//! use droidsign_core::config::Config;
//!
//! let config = Config::defaults();
//! let layout = ProjectLayout::from_config(None, &config.schema.project);
//! let resolved = Resolver::new(&layout, &config.schema).resolve(&Env::capture())?;
//!
//! match SigningSelection::select(&resolved) {
//!     SigningSelection::Release(keystore) => println!("release: {:?}", keystore),
//!     SigningSelection::Debug => println!("debug signing"),
//! }
//! # Ok::<(), droidsign_core::Error>(())
//! ```

#![warn(missing_docs)]

pub mod doctor;
pub mod flags;
pub mod gradle;
pub mod layout;
pub mod signing;

pub use flags::{BuildFlags, FrameworkSdk};
pub use layout::ProjectLayout;
pub use signing::{
    Env, KeystoreConfig, KeystoreSource, ResolvedConfig, Resolver, SigningSelection,
};
