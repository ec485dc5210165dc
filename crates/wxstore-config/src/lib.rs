use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_DB_PATH: &str = "data.db";
pub const DEFAULT_TABLE: &str = "datasource";
pub const CONFIG_ENV: &str = "WXSTORE_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
    pub table: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ImportConfig {
    pub delimiter: Option<char>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    /// "text" (default) or "json"
    pub format: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub database: Option<DatabaseConfig>,
    pub import: Option<ImportConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Delimiter must be a single ASCII character other than a quote or line break, got {0:?}")]
    InvalidDelimiter(char),
}

impl AppConfig {
    /// Load configuration from WXSTORE_CONFIG path (TOML) if present, with reasonable defaults
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| "config.toml".to_string());
        let path = Path::new(&path);
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(AppConfig::default())
        }
    }

    /// Load an explicit file; a missing file is an error here
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let cfg = toml::from_str::<AppConfig>(s)?;
        cfg.delimiter()?;
        Ok(cfg)
    }

    /// Database file path (default data.db)
    pub fn db_path(&self) -> PathBuf {
        self.database
            .as_ref()
            .and_then(|d| d.path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH))
    }

    /// Weather table name (default datasource)
    pub fn table(&self) -> String {
        self.database
            .as_ref()
            .and_then(|d| d.table.clone())
            .unwrap_or_else(|| DEFAULT_TABLE.to_string())
    }

    /// Import field delimiter as a byte (default ',')
    pub fn delimiter(&self) -> Result<u8, ConfigError> {
        let c = self
            .import
            .as_ref()
            .and_then(|i| i.delimiter)
            .unwrap_or(',');
        delimiter_byte(c)
    }

    /// Whether logs should be emitted as JSON
    pub fn log_json(&self) -> bool {
        self.logging
            .as_ref()
            .and_then(|l| l.format.as_deref())
            .is_some_and(|f| f.eq_ignore_ascii_case("json"))
    }
}

/// Validate a delimiter character for the CSV reader.
///
/// Quotes and line breaks are reserved by the CSV format itself.
pub fn delimiter_byte(c: char) -> Result<u8, ConfigError> {
    u8::try_from(c)
        .ok()
        .filter(|b| b.is_ascii() && !matches!(*b, b'"' | b'\n' | b'\r'))
        .ok_or(ConfigError::InvalidDelimiter(c))
}
