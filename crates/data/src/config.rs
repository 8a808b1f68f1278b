//! Database settings read from the environment.

use anyhow::{Context, Result, bail};
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_DRIVER: &str = "postgres";
const DEFAULT_PORT: u16 = 5432;
const DEFAULT_SSLMODE: &str = "require";
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 15;
const DEFAULT_OPTIONS: &str = "-c statement_timeout=15000";
const DEFAULT_SWAP_TABLE: &str = "uniswap_v3_swap_42161";
const DEFAULT_BLOCK_TABLE: &str = "blocks_42161";

/// Connection and table settings for the swap database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub driver: String,
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
    pub sslmode: String,
    pub connect_timeout_secs: u64,
    /// Server options passed at connection time, e.g. a statement timeout.
    pub options: String,
    pub swap_table: String,
    pub block_table: String,
}

impl DatabaseConfig {
    /// Reads the configuration from `DB_*` environment variables.
    ///
    /// Callers that rely on a `.env` file should load it first.
    ///
    /// # Errors
    /// Returns an error if a required variable is missing or a value does not parse.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// # Errors
    /// Returns an error if a required key is missing or a value does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| lookup(key).with_context(|| format!("{key} is not set"));
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.into());

        let port = match lookup("DB_PORT") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("DB_PORT is not a valid port: {raw}"))?,
            None => DEFAULT_PORT,
        };
        let connect_timeout_secs = match lookup("DB_CONNECT_TIMEOUT") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("DB_CONNECT_TIMEOUT is not a number of seconds: {raw}"))?,
            None => DEFAULT_CONNECT_TIMEOUT_SECS,
        };

        let config = Self {
            driver: or_default("DB_DRIVER", DEFAULT_DRIVER),
            host: required("DB_HOST")?,
            port,
            name: required("DB_NAME")?,
            user: required("DB_USER")?,
            password: required("DB_PASSWORD")?,
            sslmode: or_default("DB_SSLMODE", DEFAULT_SSLMODE),
            connect_timeout_secs,
            options: or_default("DB_OPTIONS", DEFAULT_OPTIONS),
            swap_table: or_default("DB_SWAP_TABLE", DEFAULT_SWAP_TABLE),
            block_table: or_default("DB_BLOCK_TABLE", DEFAULT_BLOCK_TABLE),
        };
        config.validate()?;
        Ok(config)
    }

    /// Table names are interpolated into SQL, so only plain identifiers are accepted.
    fn validate(&self) -> Result<()> {
        if !matches!(self.driver.as_str(), "postgres" | "postgresql") {
            bail!("unsupported DB_DRIVER {:?}, expected postgres", self.driver);
        }
        PgSslMode::from_str(&self.sslmode)
            .with_context(|| format!("invalid DB_SSLMODE {:?}", self.sslmode))?;
        self.server_options()?;
        for table in [&self.swap_table, &self.block_table] {
            let valid = !table.is_empty()
                && table
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_');
            if !valid {
                bail!("invalid table name: {table:?}");
            }
        }
        Ok(())
    }

    /// Splits `options` (`-c key=value` pairs, as libpq accepts them) into
    /// key/value settings.
    ///
    /// # Errors
    /// Returns an error on anything other than `-c key=value` pairs.
    pub fn server_options(&self) -> Result<Vec<(String, String)>> {
        let mut settings = Vec::new();
        let mut tokens = self.options.split_whitespace();
        while let Some(token) = tokens.next() {
            let setting = match token.strip_prefix("-c") {
                Some("") => tokens
                    .next()
                    .with_context(|| format!("missing setting after -c in {:?}", self.options))?,
                Some(inline) => inline,
                None => bail!("unsupported server option {token:?} in {:?}", self.options),
            };
            let (key, value) = setting
                .split_once('=')
                .with_context(|| format!("server option {setting:?} is not key=value"))?;
            settings.push((key.to_string(), value.to_string()));
        }
        Ok(settings)
    }

    /// Builds sqlx connect options from the individual settings.
    ///
    /// # Errors
    /// Returns an error if `sslmode` or the server options do not parse.
    pub fn connect_options(&self) -> Result<PgConnectOptions> {
        let ssl_mode = PgSslMode::from_str(&self.sslmode)
            .with_context(|| format!("invalid DB_SSLMODE {:?}", self.sslmode))?;
        Ok(PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.name)
            .ssl_mode(ssl_mode)
            .options(self.server_options()?))
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn minimal() -> Vec<(&'static str, &'static str)> {
        vec![
            ("DB_HOST", "db.example.com"),
            ("DB_NAME", "chain"),
            ("DB_USER", "reader"),
            ("DB_PASSWORD", "p@ss word"),
        ]
    }

    #[test]
    fn test_defaults_applied() {
        let config = DatabaseConfig::from_lookup(lookup(&minimal())).unwrap();
        assert_eq!(config.driver, "postgres");
        assert_eq!(config.port, 5432);
        assert_eq!(config.sslmode, "require");
        assert_eq!(config.connect_timeout_secs, 15);
        assert_eq!(config.options, "-c statement_timeout=15000");
        assert_eq!(config.swap_table, "uniswap_v3_swap_42161");
        assert_eq!(config.block_table, "blocks_42161");
    }

    #[test]
    fn test_missing_required_key() {
        let mut pairs = minimal();
        pairs.retain(|(k, _)| *k != "DB_HOST");
        let err = DatabaseConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(err.to_string().contains("DB_HOST"));
    }

    #[test]
    fn test_invalid_port() {
        let mut pairs = minimal();
        pairs.push(("DB_PORT", "not-a-port"));
        assert!(DatabaseConfig::from_lookup(lookup(&pairs)).is_err());
    }

    #[test]
    fn test_table_name_rejected() {
        let mut pairs = minimal();
        pairs.push(("DB_SWAP_TABLE", "swaps; DROP TABLE blocks"));
        assert!(DatabaseConfig::from_lookup(lookup(&pairs)).is_err());
    }

    #[test]
    fn test_connect_options() {
        let mut pairs = minimal();
        pairs.push(("DB_PORT", "6543"));
        pairs.push(("DB_USER", "svc@corp"));
        let config = DatabaseConfig::from_lookup(lookup(&pairs)).unwrap();
        let options = config.connect_options().unwrap();

        assert_eq!(options.get_host(), "db.example.com");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_username(), "svc@corp");
        assert_eq!(options.get_database(), Some("chain"));
        assert!(matches!(options.get_ssl_mode(), PgSslMode::Require));
        assert!(
            options
                .get_options()
                .is_some_and(|o| o.contains("statement_timeout=15000"))
        );
        assert_eq!(config.connect_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_server_options_parsing() {
        let mut pairs = minimal();
        pairs.push(("DB_OPTIONS", "-c statement_timeout=5000 -csearch_path=public"));
        let config = DatabaseConfig::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(
            config.server_options().unwrap(),
            vec![
                ("statement_timeout".to_string(), "5000".to_string()),
                ("search_path".to_string(), "public".to_string()),
            ]
        );

        for bad in ["statement_timeout=5000", "-c statement_timeout", "-c"] {
            let mut pairs = minimal();
            pairs.push(("DB_OPTIONS", bad));
            assert!(DatabaseConfig::from_lookup(lookup(&pairs)).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_unsupported_driver_and_sslmode() {
        let mut pairs = minimal();
        pairs.push(("DB_DRIVER", "mysql"));
        assert!(DatabaseConfig::from_lookup(lookup(&pairs)).is_err());

        let mut pairs = minimal();
        pairs.push(("DB_SSLMODE", "sometimes"));
        assert!(DatabaseConfig::from_lookup(lookup(&pairs)).is_err());
    }
}
