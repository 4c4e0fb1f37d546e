//! Configuration loading from environment.

use std::env;

/// Application configuration.
#[derive(Debug)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// OTLP collector endpoint; trace export is off when unset.
    pub otlp_endpoint: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let port = lookup("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()?;

        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let otlp_endpoint = lookup("OTEL_EXPORTER_OTLP_ENDPOINT").filter(|v| !v.is_empty());

        Ok(Self {
            port,
            database_url,
            otlp_endpoint,
        })
    }

    /// The database URL with any password replaced, for logging.
    pub fn redacted_database_url(&self) -> String {
        let url = &self.database_url;
        let Some(scheme_end) = url.find("://") else {
            return url.clone();
        };
        let rest = &url[scheme_end + 3..];
        let authority_end = rest.find('/').unwrap_or(rest.len());
        let Some(at) = rest[..authority_end].rfind('@') else {
            return url.clone();
        };
        match rest[..at].find(':') {
            Some(colon) => format!(
                "{}{}:***{}",
                &url[..scheme_end + 3],
                &rest[..colon],
                &rest[at..]
            ),
            None => url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("DATABASE_URL", "sqlite://washi.db")]).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.otlp_endpoint, None);
    }

    #[test]
    fn test_database_url_is_required() {
        let err = load(&[("PORT", "8080")]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        assert!(load(&[("DATABASE_URL", "x"), ("PORT", "eighty")]).is_err());
    }

    #[test]
    fn test_empty_otlp_endpoint_is_unset() {
        let config = load(&[("DATABASE_URL", "x"), ("OTEL_EXPORTER_OTLP_ENDPOINT", "")]).unwrap();
        assert_eq!(config.otlp_endpoint, None);
    }

    #[test]
    fn test_redacted_database_url() {
        let config = load(&[("DATABASE_URL", "postgres://washi:s3cret@db:5432/washi")]).unwrap();
        assert_eq!(
            config.redacted_database_url(),
            "postgres://washi:***@db:5432/washi"
        );

        let config = load(&[("DATABASE_URL", "sqlite://data/washi.db?mode=rwc")]).unwrap();
        assert_eq!(
            config.redacted_database_url(),
            "sqlite://data/washi.db?mode=rwc"
        );
    }
}
