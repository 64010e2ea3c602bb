// ⚙️ Configuration - loaded once at startup, read-only afterwards

use crate::schema::{CATEGORIAS, GASTOS, INGRESOS};
use anyhow::{anyhow, Result};
use std::path::PathBuf;

/// Environment variable names - single source of truth
pub mod env_vars {
    pub const NOTION_SECRET_API_KEY: &str = "NOTION_SECRET_API_KEY";
    pub const NOTION_DATABASE_ID_CATEGORIAS: &str = "NOTION_DATABASE_ID_CATEGORIAS";
    pub const NOTION_DATABASE_ID_GASTOS: &str = "NOTION_DATABASE_ID_GASTOS";
    pub const NOTION_DATABASE_ID_INGRESOS: &str = "NOTION_DATABASE_ID_INGRESOS";
    pub const NOTION_API_URL: &str = "NOTION_API_URL";
    pub const NOTION_VERSION: &str = "NOTION_VERSION";
    pub const GOOGLE_SPREADSHEET_ID: &str = "GOOGLE_SPREADSHEET_ID";
    pub const GOOGLE_TOKEN_FILE: &str = "GOOGLE_TOKEN_FILE";
    pub const GOOGLE_CREDENTIALS_FILE: &str = "GOOGLE_CREDENTIALS_FILE";
    pub const HEADERS_FILE: &str = "HEADERS_FILE";
    pub const SNAPSHOT_DIR: &str = "SNAPSHOT_DIR";
}

/// Default values
pub mod defaults {
    pub const NOTION_API_URL: &str = "https://api.notion.com";
    pub const NOTION_VERSION: &str = "2022-06-28";
    pub const GOOGLE_TOKEN_FILE: &str = "token.json";
    pub const GOOGLE_CREDENTIALS_FILE: &str = "credentials.json";
    pub const HEADERS_FILE: &str = "headers.json";
    pub const SNAPSHOT_DIR: &str = "json";
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub notion_api_key: Option<String>,
    pub notion_api_url: String,
    pub notion_version: String,
    pub database_categorias: Option<String>,
    pub database_gastos: Option<String>,
    pub database_ingresos: Option<String>,
    pub spreadsheet_id: Option<String>,
    pub token_file: PathBuf,
    pub credentials_file: PathBuf,
    pub headers_file: PathBuf,
    pub snapshot_dir: PathBuf,
}

/// Load `.env` (searched upwards from the working directory) into the process environment.
/// Returns the file used, if one was found.
pub fn load_dotenv() -> Option<PathBuf> {
    dotenv::dotenv().ok()
}

impl Config {
    /// Read the process environment; call [`load_dotenv`] first to pick up `.env`
    pub fn from_env() -> Self {
        Config::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let get_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        Config {
            notion_api_key: get(env_vars::NOTION_SECRET_API_KEY),
            notion_api_url: get_or(env_vars::NOTION_API_URL, defaults::NOTION_API_URL),
            notion_version: get_or(env_vars::NOTION_VERSION, defaults::NOTION_VERSION),
            database_categorias: get(env_vars::NOTION_DATABASE_ID_CATEGORIAS),
            database_gastos: get(env_vars::NOTION_DATABASE_ID_GASTOS),
            database_ingresos: get(env_vars::NOTION_DATABASE_ID_INGRESOS),
            spreadsheet_id: get(env_vars::GOOGLE_SPREADSHEET_ID),
            token_file: get_or(env_vars::GOOGLE_TOKEN_FILE, defaults::GOOGLE_TOKEN_FILE).into(),
            credentials_file: get_or(env_vars::GOOGLE_CREDENTIALS_FILE, defaults::GOOGLE_CREDENTIALS_FILE).into(),
            headers_file: get_or(env_vars::HEADERS_FILE, defaults::HEADERS_FILE).into(),
            snapshot_dir: get_or(env_vars::SNAPSHOT_DIR, defaults::SNAPSHOT_DIR).into(),
        }
    }

    /// Notion database id configured for a table
    pub fn database_id(&self, table_name: &str) -> Option<&str> {
        match table_name {
            CATEGORIAS => self.database_categorias.as_deref(),
            GASTOS => self.database_gastos.as_deref(),
            INGRESOS => self.database_ingresos.as_deref(),
            _ => None,
        }
    }

    pub fn require_notion_api_key(&self) -> Result<&str> {
        require(self.notion_api_key.as_deref(), env_vars::NOTION_SECRET_API_KEY)
    }

    pub fn require_spreadsheet_id(&self) -> Result<&str> {
        require(self.spreadsheet_id.as_deref(), env_vars::GOOGLE_SPREADSHEET_ID)
    }

    pub fn require_database_id(&self, table_name: &str) -> Result<&str> {
        self.database_id(table_name)
            .ok_or_else(|| anyhow!("No Notion database configured for table '{}'", table_name))
    }
}

fn require<'a>(value: Option<&'a str>, key: &str) -> Result<&'a str> {
    value.ok_or_else(|| anyhow!("Missing required setting {}", key))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = config_from(&[]);

        assert_eq!(config.notion_api_key, None);
        assert_eq!(config.notion_api_url, "https://api.notion.com");
        assert_eq!(config.notion_version, "2022-06-28");
        assert_eq!(config.token_file, PathBuf::from("token.json"));
        assert_eq!(config.credentials_file, PathBuf::from("credentials.json"));
        assert_eq!(config.headers_file, PathBuf::from("headers.json"));
        assert_eq!(config.snapshot_dir, PathBuf::from("json"));
    }

    #[test]
    fn test_database_ids_per_table() {
        let config = config_from(&[
            ("NOTION_DATABASE_ID_CATEGORIAS", "db-cat"),
            ("NOTION_DATABASE_ID_GASTOS", "db-gas"),
        ]);

        assert_eq!(config.database_id("categorias"), Some("db-cat"));
        assert_eq!(config.database_id("gastos"), Some("db-gas"));
        assert_eq!(config.database_id("ingresos"), None);
        assert_eq!(config.database_id("unknown"), None);
        assert!(config.require_database_id("ingresos").is_err());
    }

    #[test]
    fn test_blank_values_count_as_missing() {
        let config = config_from(&[("NOTION_SECRET_API_KEY", "   "), ("GOOGLE_SPREADSHEET_ID", "")]);

        let err = config.require_notion_api_key().unwrap_err();
        assert!(err.to_string().contains("NOTION_SECRET_API_KEY"));
        assert!(config.require_spreadsheet_id().is_err());
    }

    #[test]
    fn test_from_env_reads_process_environment() {
        // Only this test touches the process environment
        std::env::set_var("GOOGLE_TOKEN_FILE", "secrets/token.json");

        let config = Config::from_env();

        assert_eq!(config.token_file, PathBuf::from("secrets/token.json"));
        std::env::remove_var("GOOGLE_TOKEN_FILE");
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("NOTION_SECRET_API_KEY", " secret_abc "),
            ("HEADERS_FILE", "conf/headers.json"),
            ("SNAPSHOT_DIR", "out"),
        ]);

        assert_eq!(config.require_notion_api_key().unwrap(), "secret_abc");
        assert_eq!(config.headers_file, PathBuf::from("conf/headers.json"));
        assert_eq!(config.snapshot_dir, PathBuf::from("out"));
    }
}
