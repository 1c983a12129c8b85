//! Configuration for the TrackPro backend.
//!
//! Sources are layered in this order, later ones winning:
//! `config/default.*`, `config/{RUN_ENV}.*`, then `TRACKPRO__SECTION__KEY` variables.
//! `"secret_from_env"` markers are resolved afterwards, see [`env_vars`].

pub mod env_vars;
pub mod models;

pub use config::ConfigError;
pub use models::*;

use config::{Config, Environment, File};
use once_cell::sync::OnceCell;
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};

static INIT_DOTENV: OnceCell<String> = OnceCell::new();

/// Loads the `.env` file once per process and returns the path that was tried.
///
/// `DOTENV_OVERRIDE` wins over a first CLI argument starting with `.env`,
/// which wins over the plain `.env` default.
pub fn ensure_dotenv_loaded() -> &'static str {
    INIT_DOTENV.get_or_init(|| {
        let dotenv_path = env::var("DOTENV_OVERRIDE")
            .ok()
            .or_else(|| env::args().nth(1).filter(|s| s.starts_with(".env")))
            .unwrap_or_else(|| ".env".to_string());
        dotenv::from_filename(&dotenv_path).ok();
        dotenv_path
    })
}

fn config_dir() -> PathBuf {
    PathBuf::from(env::var("TRACKPRO_CONFIG_DIR").unwrap_or_else(|_| "config".to_string()))
}

/// Loads the application configuration from files and environment.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    ensure_dotenv_loaded();

    let run_env = env::var("RUN_ENV").unwrap_or_else(|_| "debug".to_string());
    let prefix = env_vars::get_config_prefix();
    let dir = config_dir();

    let raw: serde_json::Value = Config::builder()
        .add_source(File::with_name(&dir.join("default").to_string_lossy()).required(false))
        .add_source(File::with_name(&dir.join(&run_env).to_string_lossy()).required(false))
        .add_source(
            Environment::with_prefix(&prefix)
                .separator(env_vars::CONFIG_SEPARATOR)
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()?;

    let config = resolve_secrets(raw)?;
    info!(
        "Configuration loaded (RUN_ENV={}, dir={}, stripe={}, firestore={})",
        run_env,
        dir.display(),
        config.use_stripe,
        config.use_firestore
    );
    Ok(config)
}

/// Resolves `"secret_from_env"` markers and deserializes the final [`AppConfig`].
///
/// A section with an unresolved secret is dropped, which disables the feature it
/// configures instead of running it with the marker as its key.
pub fn resolve_secrets(raw: serde_json::Value) -> Result<AppConfig, ConfigError> {
    resolve_secrets_with(raw, env_vars::get_secret_env_var)
}

/// Same as [`resolve_secrets`] with an explicit secret lookup.
pub fn resolve_secrets_with<F>(
    mut raw: serde_json::Value,
    lookup: F,
) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let missing = env_vars::inject_env_vars_with(&mut raw, lookup);
    drop_unresolved_sections(&mut raw, &missing);
    serde_json::from_value(raw)
        .map_err(|err| ConfigError::Message(format!("invalid configuration: {err}")))
}

fn drop_unresolved_sections(raw: &mut serde_json::Value, missing: &[String]) {
    let Some(root) = raw.as_object_mut() else {
        return;
    };
    for path in missing {
        let section = path.split('.').next().unwrap_or(path);
        if root.remove(section).is_some() {
            warn!("Disabling [{}]: secret {} is not set", section, path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_secrets_builds_app_config() {
        let raw = json!({
            "server": { "host": "0.0.0.0", "port": 9000 },
            "use_firestore": true,
            "firebase": { "project_id": "testgps-prod" }
        });
        let config = resolve_secrets(raw).unwrap();
        assert_eq!(config.server.port, 9000);
        assert!(config.use_firestore);
        assert_eq!(config.firebase.unwrap().project_id, "testgps-prod");
    }

    #[test]
    fn test_unresolved_webhook_secret_disables_stripe() {
        let raw = json!({
            "use_stripe": true,
            "stripe": { "secret_key": "sk_x", "webhook_secret": "secret_from_env" },
            "firebase": { "project_id": "testgps" }
        });
        let config = resolve_secrets_with(raw, |_| None).unwrap();
        assert!(config.stripe.is_none());
        assert!(config.stripe_enabled().is_none());
        assert_eq!(config.firebase.unwrap().project_id, "testgps");
    }

    #[test]
    fn test_resolved_secrets_keep_stripe_enabled() {
        let raw = json!({
            "use_stripe": true,
            "stripe": { "secret_key": "secret_from_env", "webhook_secret": "secret_from_env" }
        });
        let config = resolve_secrets_with(raw, |path| match path {
            "stripe.secret_key" => Some("sk_test_1".to_string()),
            "stripe.webhook_secret" => Some("whsec_1".to_string()),
            _ => None,
        })
        .unwrap();
        let stripe = config.stripe_enabled().unwrap();
        assert_eq!(stripe.secret_key, "sk_test_1");
        assert_eq!(stripe.webhook_secret, "whsec_1");
    }

    #[test]
    fn test_resolve_secrets_rejects_wrong_types() {
        let raw = json!({ "server": { "host": "0.0.0.0", "port": "not-a-port" } });
        assert!(matches!(resolve_secrets(raw), Err(ConfigError::Message(_))));
    }
}
