use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub store: StoreConfig,
    pub provider: ProviderConfig,
    pub search: SearchConfig,
    #[serde(default)]
    pub locations: LocationsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub ledger_path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_timeout() -> u64 { 30 }

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    pub default_results: usize,
    pub passengers: u32,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LocationsConfig {
    /// IATA codes accepted in addition to the built-in directory.
    #[serde(default)]
    pub extra_airports: Vec<String>,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .set_default("store.ledger_path", "data/tracked.json")?
            .set_default("provider.base_url", "http://localhost:8080")?
            .set_default("provider.timeout_seconds", 30)?
            .set_default("search.default_results", 5)?
            .set_default("search.passengers", 1)?
            .add_source(config::File::with_name("config/default").required(false))
            // Per-environment overrides, e.g. config/production.toml
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Developer overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg.. `FAREWATCH__STORE__LEDGER_PATH=/tmp/tracked.json`
            .add_source(config::Environment::with_prefix("FAREWATCH").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply_without_files() {
        let config = Config::load().expect("defaults should be enough to load");
        assert!(config.search.passengers >= 1);
        assert!(config.provider.timeout_seconds > 0);
    }
}
