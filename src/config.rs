use clap::Parser;
use std::env;
use std::path::PathBuf;

/// Command-line overrides for the environment configuration
#[derive(Debug, Default, Parser)]
#[command(name = "sync-wizard", about = "Job sync wizard service")]
pub struct Cli {
    /// Address to bind the HTTP server to, e.g. 127.0.0.1:8080
    #[arg(long)]
    pub bind: Option<String>,

    /// Directory holding the persisted session and draft
    #[arg(long)]
    pub storage_dir: Option<PathBuf>,

    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Default: 127.0.0.1:8080
    pub bind_addr: String,

    /// Default: ./data
    pub storage_dir: PathBuf,

    /// Default: ./logs
    pub log_dir: PathBuf,

    /// Maximum payload size for all requests (in bytes)
    /// Default: 1MB (1024 * 1024)
    pub max_payload_size: usize,

    /// Inactivity timeout before a session expires
    /// Default: 30
    pub session_timeout_minutes: i64,

    /// How often the session ticker checks for expiry
    /// Default: 60
    pub session_check_interval_secs: u64,

    /// Delay applied by the simulated collaborators
    /// Default: 1000
    pub simulated_latency_ms: u64,
}

fn parsed<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    lookup(key).and_then(|s| s.parse().ok()).unwrap_or(default)
}

impl Config {
    /// Load configuration from `.env` and the process environment
    ///
    /// Optional environment variables:
    /// - BIND_ADDR
    /// - STORAGE_DIR
    /// - LOG_DIR
    /// - MAX_PAYLOAD_SIZE: bytes
    /// - SESSION_TIMEOUT_MINUTES: must be positive
    /// - SESSION_CHECK_INTERVAL_SECS
    /// - SIMULATED_LATENCY_MS
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if it exists
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    ///
    /// Unparsable values fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let session_timeout_minutes: i64 = parsed(&lookup, "SESSION_TIMEOUT_MINUTES", 30);
        if session_timeout_minutes <= 0 {
            return Err("SESSION_TIMEOUT_MINUTES must be greater than zero".to_string());
        }

        let session_check_interval_secs = parsed::<u64>(&lookup, "SESSION_CHECK_INTERVAL_SECS", 60).max(1);

        Ok(Config {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "127.0.0.1:8080".to_string()),
            storage_dir: lookup("STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./data")),
            log_dir: lookup("LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./logs")),
            max_payload_size: parsed(&lookup, "MAX_PAYLOAD_SIZE", 1024 * 1024),
            session_timeout_minutes,
            session_check_interval_secs,
            simulated_latency_ms: parsed(&lookup, "SIMULATED_LATENCY_MS", 1000),
        })
    }

    /// Apply command-line overrides
    pub fn with_cli(mut self, cli: Cli) -> Self {
        if let Some(bind) = cli.bind {
            self.bind_addr = bind;
        }
        if let Some(dir) = cli.storage_dir {
            self.storage_dir = dir;
        }
        if let Some(dir) = cli.log_dir {
            self.log_dir = dir;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config(&[]).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.storage_dir, PathBuf::from("./data"));
        assert_eq!(config.max_payload_size, 1024 * 1024);
        assert_eq!(config.session_timeout_minutes, 30);
        assert_eq!(config.session_check_interval_secs, 60);
        assert_eq!(config.simulated_latency_ms, 1000);
    }

    #[test]
    fn unparsable_values_fall_back() {
        let config = config(&[("MAX_PAYLOAD_SIZE", "lots"), ("SIMULATED_LATENCY_MS", "-5")]).unwrap();
        assert_eq!(config.max_payload_size, 1024 * 1024);
        assert_eq!(config.simulated_latency_ms, 1000);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        assert!(config(&[("SESSION_TIMEOUT_MINUTES", "0")]).is_err());
    }

    #[test]
    fn cli_overrides_environment() {
        let config = config(&[("BIND_ADDR", "0.0.0.0:9000")])
            .unwrap()
            .with_cli(Cli::parse_from(["sync-wizard", "--bind", "127.0.0.1:3000", "--log-dir", "/tmp/logs"]));
        assert_eq!(config.bind_addr, "127.0.0.1:3000");
        assert_eq!(config.log_dir, PathBuf::from("/tmp/logs"));
        assert_eq!(config.storage_dir, PathBuf::from("./data"));
    }
}
