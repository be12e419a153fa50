//! Configuration for the Beacon service.
//!
//! Values are layered, lowest precedence first: built-in defaults, the legacy
//! environment variables of earlier deployments (`DATABASE_HOST`, ...,
//! `SECRET_KEY`), `config/default.*`, `config/{RUN_ENV}.*` and finally
//! `BEACON__SECTION__KEY` environment variables.

use config::{Config, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use std::env;
use tracing::debug;

pub mod models;
pub use models::*;

/// Prefix for configuration environment variables
pub const ENV_PREFIX: &str = "BEACON";

/// Separator between prefix and nested keys, e.g. `BEACON__SERVER__PORT`
pub const ENV_SEPARATOR: &str = "__";

/// Loads the application configuration.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    ensure_dotenv_loaded();

    let run_env = env::var("RUN_ENV").unwrap_or_else(|_| "debug".to_string());
    let lookup = |key: &str| env::var(key).ok();

    let mut builder = Config::builder()
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5000_i64)?
        .set_default("logging.level", "info")?
        .set_default("logging.file", "app.log")?
        .set_default("auth.leeway_secs", 0_i64)?;

    if let Some(url) = legacy_database_url(lookup) {
        debug!("Using database url assembled from legacy DATABASE_* variables");
        builder = builder.set_default("database.url", url)?;
    }
    if let Some(secret) = lookup("SECRET_KEY") {
        builder = builder.set_default("auth.jwt_secret", secret)?;
    }

    let builder = builder
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{}", run_env)).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator(ENV_SEPARATOR)
                .separator(ENV_SEPARATOR)
                .try_parsing(true),
        );

    let config: AppConfig = builder.build()?.try_deserialize()?;
    if config.auth.jwt_secret.is_empty() {
        return Err(ConfigError::Message(
            "auth.jwt_secret must not be empty".to_string(),
        ));
    }
    Ok(config)
}

/// Assembles a PostgreSQL url from the legacy `DATABASE_*` variables.
///
/// Returns `None` unless host, name and user are all present. The port
/// defaults to 5432 and the password may be empty. User and password are
/// percent-encoded so reserved characters survive in the userinfo part.
pub fn legacy_database_url<F>(lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    let host = lookup("DATABASE_HOST")?;
    let name = lookup("DATABASE_NAME")?;
    let user = lookup("DATABASE_USER")?;
    let port = lookup("DATABASE_PORT").unwrap_or_else(|| "5432".to_string());
    let password = lookup("DATABASE_PASSWORD").unwrap_or_default();

    Some(format!(
        "postgres://{}:{}@{}:{}/{}",
        urlencoding::encode(&user),
        urlencoding::encode(&password),
        host,
        port,
        name
    ))
}

static INIT_DOTENV: OnceCell<()> = OnceCell::new();

/// Loads the dotenv file into the process environment, once.
///
/// `DOTENV_OVERRIDE` selects a file other than `.env`. A missing file is not
/// an error. Returns the path that was used.
pub fn ensure_dotenv_loaded() -> String {
    let dotenv_path = env::var("DOTENV_OVERRIDE").unwrap_or_else(|_| ".env".to_string());

    INIT_DOTENV.get_or_init(|| {
        dotenv::from_filename(&dotenv_path).ok();
    });

    dotenv_path
}
