use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Runtime settings: defaults, then optional file, then `QSEARCH_*` env vars
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub listen_addr: String,
    pub backend_url: String,
    pub request_timeout_secs: u64,
    pub discard_stale_results: bool,
    pub log_level: String,
}

impl AppConfig {
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("listen_addr", "127.0.0.1:8080")?
            .set_default("backend_url", "http://127.0.0.1:3000")?
            .set_default("request_timeout_secs", 30)?
            .set_default("discard_stale_results", true)?
            .set_default("log_level", "info")?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        builder
            .add_source(Environment::with_prefix("QSEARCH").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "backend_url = \"http://backend.internal:9000\"").unwrap();
        writeln!(file, "request_timeout_secs = 5").unwrap();
        writeln!(file, "discard_stale_results = false").unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();

        assert_eq!(config.backend_url, "http://backend.internal:9000");
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert!(!config.discard_stale_results);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(AppConfig::load(Some(&missing)).is_err());
    }
}
