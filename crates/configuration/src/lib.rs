use crate::error::ConfigError;
use rust_decimal::Decimal;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;
pub mod telemetry;

// Re-export the core types to provide a clean public API.
pub use settings::{BettingDefaults, Config, DatabaseConfig, LogFormat, LoggingConfig, ServerConfig};
pub use telemetry::init_tracing;

/// Name of the config file looked up in the working directory when no explicit
/// path is given.
pub const DEFAULT_CONFIG_FILE: &str = "stakebook.toml";

/// Prefix for environment overrides, e.g. `STAKEBOOK__SERVER__PORT=9000`.
pub const ENV_PREFIX: &str = "STAKEBOOK";

/// Loads the application configuration.
///
/// Sources are layered lowest to highest: built-in defaults, the config file
/// (`path`, or an optional `stakebook.toml`), then `STAKEBOOK__*` environment
/// variables. The merged result is validated before it is returned.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let file_source = match path {
        Some(path) => config::File::from(path).required(true),
        None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
    };

    let builder = config::Config::builder()
        .set_default("database.path", "data/betting.db")?
        .set_default("database.backup_dir", "data/backups")?
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8501_i64)?
        .set_default("logging.level", "info")?
        .set_default("logging.directory", "logs")?
        .set_default("logging.file_name", "stakebook.log")?
        .set_default("logging.format", "full")?
        .set_default("betting.min_transfer", "250.00")?
        .set_default("betting.default_betting_value", "2100.00")?
        .add_source(file_source)
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    validate(&config)?;

    Ok(config)
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.database.path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError("database.path must not be empty".to_string()));
    }
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError("server.port must not be 0".to_string()));
    }
    if config.server.socket_addr().is_err() {
        return Err(ConfigError::ValidationError(format!(
            "server.host '{}' is not a valid IP address",
            config.server.host
        )));
    }
    if config.betting.min_transfer <= Decimal::ZERO {
        return Err(ConfigError::ValidationError("betting.min_transfer must be positive".to_string()));
    }
    if config.betting.default_betting_value <= Decimal::ZERO {
        return Err(ConfigError::ValidationError(
            "betting.default_betting_value must be positive".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    #[test]
    fn defaults_apply_without_a_config_file() {
        let config = load_config(None).unwrap();
        assert_eq!(config.database.path, Path::new("data/betting.db"));
        assert_eq!(config.server.port, 8501);
        assert_eq!(config.logging.format, LogFormat::Full);
        assert_eq!(config.betting.min_transfer, dec!(250.00));
        assert_eq!(config.betting.as_settings().default_betting_value, dec!(2100.00));
    }

    #[test]
    fn file_values_override_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[database]\npath = \"/tmp/ledger.db\"\n\n[server]\nport = 9000\n\n[betting]\nmin_transfer = 100.0"
        )
        .unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.database.path, Path::new("/tmp/ledger.db"));
        assert_eq!(config.database.backup_dir, Path::new("data/backups"));
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.betting.min_transfer, dec!(100));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[betting]\nmin_transfer = -5").unwrap();
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = load_config(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::LoadError(_)));
    }
}
