//! Environment variable naming for the TrackPro configuration.
//!
//! Plain settings are read by the `config` crate from `TRACKPRO__SECTION__KEY`.
//! Secrets are written as the marker string `"secret_from_env"` in the config files
//! and resolved here from `TRACKPRO_SECRET_SECTION_KEY`, with a fallback to the
//! legacy `SECTION_KEY` names the hosting platform used (`STRIPE_SECRET_KEY`, ...).

use serde_json::Value;
use std::env;
use tracing::warn;

/// The default prefix for configuration environment variables
pub const DEFAULT_PREFIX: &str = "TRACKPRO";

/// The prefix for secret environment variables
pub const SECRET_PREFIX: &str = "TRACKPRO_SECRET";

/// The separator for configuration environment variables
pub const CONFIG_SEPARATOR: &str = "__";

/// The separator for secret environment variables
pub const SECRET_SEPARATOR: &str = "_";

/// Marker value replaced by [`inject_env_vars`].
pub const SECRET_MARKER: &str = "secret_from_env";

/// Prefix for configuration environment variables, overridable through `PREFIX`.
pub fn get_config_prefix() -> String {
    env::var("PREFIX").unwrap_or_else(|_| DEFAULT_PREFIX.to_string())
}

/// `"stripe.secret_key"` -> `"TRACKPRO_SECRET_STRIPE_SECRET_KEY"`
pub fn secret_path_to_env_var(path: &str) -> String {
    let path = path.replace('.', SECRET_SEPARATOR);
    format!("{}{}{}", SECRET_PREFIX, SECRET_SEPARATOR, path).to_uppercase()
}

/// `"stripe.webhook_secret"` -> `"STRIPE_WEBHOOK_SECRET"`
pub fn legacy_secret_path_to_env_var(path: &str) -> String {
    path.replace('.', SECRET_SEPARATOR).to_uppercase()
}

/// Resolve a secret path against the process environment, new name first.
pub fn get_secret_env_var(path: &str) -> Option<String> {
    env::var(secret_path_to_env_var(path))
        .or_else(|_| env::var(legacy_secret_path_to_env_var(path)))
        .ok()
}

/// Replace every `"secret_from_env"` marker in `value` from the process environment.
///
/// Returns the dotted paths that could not be resolved.
pub fn inject_env_vars(value: &mut Value) -> Vec<String> {
    inject_env_vars_with(value, get_secret_env_var)
}

/// Same as [`inject_env_vars`] with an explicit lookup, used by tests.
pub fn inject_env_vars_with<F>(value: &mut Value, lookup: F) -> Vec<String>
where
    F: Fn(&str) -> Option<String>,
{
    fn walk<F: Fn(&str) -> Option<String>>(
        path: &mut Vec<String>,
        obj: &mut Value,
        lookup: &F,
        missing: &mut Vec<String>,
    ) {
        match obj {
            Value::Object(map) => {
                for (k, v) in map.iter_mut() {
                    path.push(k.clone());
                    walk(path, v, lookup, missing);
                    path.pop();
                }
            }
            Value::String(s) if s == SECRET_MARKER => {
                let dotted = path.join(".");
                match lookup(&dotted) {
                    Some(secret) => *s = secret,
                    None => {
                        warn!(
                            "No environment value for {} (tried {} and {})",
                            dotted,
                            secret_path_to_env_var(&dotted),
                            legacy_secret_path_to_env_var(&dotted)
                        );
                        missing.push(dotted);
                    }
                }
            }
            _ => {}
        }
    }

    let mut missing = Vec::new();
    walk(&mut Vec::new(), value, &lookup, &mut missing);
    missing
}
