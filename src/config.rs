use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(rename = "host_address")]
    pub host: SocketAddr,
    #[serde(rename = "log_dir", default = "default_log_dir")]
    pub log_dir: PathBuf,
    /// How often a fresh snapshot is appended to the series, in seconds.
    #[serde(
        rename = "cycle_interval_secs",
        default = "default_cycle_interval",
        deserialize_with = "seconds_from_str"
    )]
    pub cycle_interval_secs: u64,
    #[serde(flatten)]
    pub surreal: SurrealConfig,
}

impl Config {
    pub fn from_env() -> Result<Config, envy::Error> {
        envy::from_env::<Config>()
    }

    pub fn cycle_interval(&self) -> Duration {
        Duration::from_secs(self.cycle_interval_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SurrealConfig {
    #[serde(rename = "surreal_endpoint")]
    pub endpoint: Url,
    #[serde(rename = "surreal_namespace")]
    pub namespace: String,
    #[serde(rename = "surreal_database")]
    pub database: String,
    /// Root credentials, unused for embedded engines such as `mem://`.
    #[serde(rename = "surreal_username", default)]
    pub username: Option<String>,
    #[serde(rename = "surreal_password", default)]
    pub password: Option<String>,
}

// environment values arrive as strings, even next to a flattened section
fn seconds_from_str<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let value = String::deserialize(deserializer)?;
    value.parse().map_err(serde::de::Error::custom)
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_cycle_interval() -> u64 {
    // one aggregation cycle per day
    86_400
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_from_env_pairs() {
        let vars = vec![
            ("HOST_ADDRESS".to_string(), "127.0.0.1:4000".to_string()),
            ("SURREAL_ENDPOINT".to_string(), "mem://".to_string()),
            ("SURREAL_NAMESPACE".to_string(), "abacus".to_string()),
            ("SURREAL_DATABASE".to_string(), "stats".to_string()),
        ];

        let config: Config = envy::from_iter(vars).unwrap();

        assert_eq!(config.cycle_interval(), Duration::from_secs(86_400));
        assert_eq!(config.surreal.namespace, "abacus");
        assert!(config.surreal.username.is_none());
    }

    #[test]
    fn cycle_interval_can_be_overridden() {
        let vars = vec![
            ("HOST_ADDRESS".to_string(), "127.0.0.1:4000".to_string()),
            ("SURREAL_ENDPOINT".to_string(), "mem://".to_string()),
            ("SURREAL_NAMESPACE".to_string(), "abacus".to_string()),
            ("SURREAL_DATABASE".to_string(), "stats".to_string()),
            ("CYCLE_INTERVAL_SECS".to_string(), "3600".to_string()),
        ];

        let config: Config = envy::from_iter(vars).unwrap();
        assert_eq!(config.cycle_interval(), Duration::from_secs(3600));
    }
}
