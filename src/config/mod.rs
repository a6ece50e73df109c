//! Configuration module for the magazine backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::{AddrParseError, SocketAddr};
use std::path::PathBuf;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Optional pre-shared key required on top of the admin check
    pub api_psk: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit JSON log lines instead of the human-readable format
    pub log_json: bool,
    /// Admin identities to insert into the directory at startup
    pub bootstrap_admins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AddrParseError> {
        dotenvy::dotenv().ok();

        let api_psk = env::var("MAGAZINE_API_PSK")
            .ok()
            .filter(|psk| !psk.is_empty());

        let db_path = env::var("MAGAZINE_DB_PATH")
            .unwrap_or_else(|_| "./data/magazines.sqlite".to_string())
            .into();

        let bind_addr = env::var("MAGAZINE_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
            .parse()?;

        let log_level = env::var("MAGAZINE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_json = env::var("MAGAZINE_LOG_JSON")
            .map(|v| matches!(v.trim(), "1" | "true" | "TRUE" | "yes"))
            .unwrap_or(false);

        let bootstrap_admins = env::var("MAGAZINE_BOOTSTRAP_ADMINS")
            .map(|v| parse_list(&v))
            .unwrap_or_default();

        Ok(Self {
            api_psk,
            db_path,
            bind_addr,
            log_level,
            log_json,
            bootstrap_admins,
        })
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        // Clear any existing env vars
        env::remove_var("MAGAZINE_API_PSK");
        env::remove_var("MAGAZINE_DB_PATH");
        env::remove_var("MAGAZINE_BIND_ADDR");
        env::remove_var("MAGAZINE_LOG_LEVEL");
        env::remove_var("MAGAZINE_LOG_JSON");
        env::remove_var("MAGAZINE_BOOTSTRAP_ADMINS");

        let config = Config::from_env().unwrap();

        assert!(config.api_psk.is_none());
        assert_eq!(config.db_path, PathBuf::from("./data/magazines.sqlite"));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:3000");
        assert_eq!(config.log_level, "info");
        assert!(!config.log_json);
        assert!(config.bootstrap_admins.is_empty());
    }

    #[test]
    fn test_parse_list_skips_blanks() {
        assert_eq!(
            parse_list(" adminA, ,adminB,"),
            vec!["adminA".to_string(), "adminB".to_string()]
        );
        assert!(parse_list("").is_empty());
    }
}
