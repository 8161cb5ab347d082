use core_types::Settings;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub betting: BettingDefaults,
}

/// Where the ledger lives on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// The SQLite database file. Parent directories are created on connect.
    pub path: PathBuf,
    /// Directory that receives timestamped backup copies.
    pub backup_dir: PathBuf,
}

/// Bind address of the web API.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive; `RUST_LOG` takes precedence when set.
    pub level: String,
    /// Directory for the log file.
    pub directory: PathBuf,
    pub file_name: String,
    #[serde(default)]
    pub format: LogFormat,
}

/// Console output style.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
}

/// Values used to seed the settings row the first time a database is created,
/// and again after a full reset.
#[derive(Debug, Clone, Deserialize)]
pub struct BettingDefaults {
    pub min_transfer: Decimal,
    pub default_betting_value: Decimal,
}

impl BettingDefaults {
    pub fn as_settings(&self) -> Settings {
        Settings {
            min_transfer: self.min_transfer,
            default_betting_value: self.default_betting_value,
            updated_at: None,
        }
    }
}
