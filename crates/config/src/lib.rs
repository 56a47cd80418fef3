use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "roster.toml",
    "config/roster.toml",
    "crates/config/roster.toml",
    "../roster.toml",
    "../config/roster.toml",
];

/// Plain environment variable consulted when `ROSTER__DATABASE__URL` is unset.
pub const DATABASE_URL_FALLBACK: &str = "DATABASE_URL";

/// Plain environment variable consulted when `ROSTER__HTTP__PORT` is unset.
pub const PORT_FALLBACK: &str = "PORT";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub address: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 5001,
        }
    }
}

/// Record store connection settings.
///
/// The connection string has no usable default: [`load`] fails when it is
/// missing from every source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
        }
    }
}

/// What the validator does with input keys the member schema does not declare.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownFieldPolicy {
    /// Report every unknown key as a validation error.
    #[default]
    Reject,
    /// Drop unknown keys from the normalized output.
    Strip,
}

/// Settings for the member validation engine.
///
/// ```
/// use roster_config::{UnknownFieldPolicy, ValidationConfig};
///
/// let validation = ValidationConfig::default();
/// assert_eq!(validation.default_region, "US");
/// assert_eq!(validation.unknown_fields, UnknownFieldPolicy::Reject);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// ISO 3166-1 alpha-2 region assumed for phone numbers without a country prefix.
    #[serde(default = "ValidationConfig::default_region")]
    pub default_region: String,
    #[serde(default)]
    pub unknown_fields: UnknownFieldPolicy,
}

impl ValidationConfig {
    fn default_region() -> String {
        "US".to_string()
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            default_region: Self::default_region(),
            unknown_fields: UnknownFieldPolicy::default(),
        }
    }
}

/// Load the application configuration by combining defaults, files, and environment overrides.
///
/// ```
/// use roster_config::load;
///
/// std::env::remove_var("ROSTER_CONFIG");
/// std::env::set_var("ROSTER__DATABASE__URL", "sqlite://roster.db");
///
/// let config = load().expect("configuration should load once a database url is set");
/// assert!(!config.http.address.is_empty());
/// assert_eq!(config.database.url, "sqlite://roster.db");
/// ```
pub fn load() -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();

    let mut builder = config::Config::builder()
        .set_default("http.address", defaults.http.address.clone())?
        .set_default("http.port", i64::from(defaults.http.port))?
        .set_default("database.url", defaults.database.url.clone())?
        .set_default(
            "database.max_connections",
            i64::from(defaults.database.max_connections),
        )?
        .set_default(
            "validation.default_region",
            defaults.validation.default_region.clone(),
        )?
        .set_default("validation.unknown_fields", "reject")?;

    let environment_overrides = config::Environment::with_prefix("ROSTER").separator("__");

    let mut config_file_attached = false;

    if let Ok(path) = std::env::var("ROSTER_CONFIG") {
        builder = builder.add_source(config::File::from(PathBuf::from(&path)));
        config_file_attached = true;
        debug!(path, "loading configuration via ROSTER_CONFIG");
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(environment_overrides);

    let cfg = builder.build().context("unable to build configuration")?;

    let mut config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    apply_plain_fallbacks(&mut config)?;

    if config.database.url.trim().is_empty() {
        bail!(
            "database connection string is not configured; set ROSTER__DATABASE__URL or {DATABASE_URL_FALLBACK}"
        );
    }

    debug!(?config, "loaded backend configuration");
    Ok(config)
}

fn apply_plain_fallbacks(config: &mut AppConfig) -> anyhow::Result<()> {
    if config.database.url.trim().is_empty() {
        if let Ok(url) = std::env::var(DATABASE_URL_FALLBACK) {
            debug!("using {DATABASE_URL_FALLBACK} for the database connection string");
            config.database.url = url;
        }
    }

    if std::env::var("ROSTER__HTTP__PORT").is_err() {
        if let Ok(port) = std::env::var(PORT_FALLBACK) {
            config.http.port = port
                .trim()
                .parse()
                .with_context(|| format!("invalid {PORT_FALLBACK} value {port:?}"))?;
        }
    }

    Ok(())
}
