//! Environment snapshot for CI signing variables

use std::collections::HashMap;

/// Base64-encoded keystore provided as a CI secret
pub const KEYSTORE_BASE64: &str = "KEYSTORE_BASE64";
/// Key alias inside the keystore
pub const KEY_ALIAS: &str = "KEY_ALIAS";
/// Password of the signing key
pub const KEY_PASSWORD: &str = "KEY_PASSWORD";
/// Password of the keystore
pub const STORE_PASSWORD: &str = "STORE_PASSWORD";

/// All variables the resolver reads
pub const SIGNING_VARS: [&str; 4] = [KEYSTORE_BASE64, KEY_ALIAS, KEY_PASSWORD, STORE_PASSWORD];

/// Immutable view of the signing-related environment.
///
/// Captured once per invocation so resolution never races with the process
/// environment and tests can supply their own values.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Env {
    vars: HashMap<String, String>,
}

impl Env {
    /// Capture the signing variables from the process environment.
    ///
    /// Values that are not valid Unicode are kept lossily; a mangled
    /// `KEYSTORE_BASE64` then fails to decode instead of being ignored.
    pub fn capture() -> Self {
        let vars = SIGNING_VARS
            .iter()
            .filter_map(|name| {
                std::env::var_os(name).map(|value| {
                    let value = value
                        .into_string()
                        .unwrap_or_else(|os| os.to_string_lossy().into_owned());
                    ((*name).to_string(), value)
                })
            })
            .collect();
        Self { vars }
    }

    /// An environment with no variables set
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from explicit pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Look up a variable
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Whether a variable is set, even to an empty value
    pub fn is_set(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }
}

// Values are secrets; only names are printed.
impl std::fmt::Debug for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.vars.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("Env").field("set", &names).finish()
    }
}
