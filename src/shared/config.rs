use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub remote: RemoteConfig,
    pub sync: SyncConfig,
    pub connectivity: ConnectivityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub endpoint: String,
    pub request_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub auto_sync: bool,
    pub sync_interval: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectivityConfig {
    pub probe_addr: String,
    pub probe_timeout: u64,
    pub poll_interval: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite:data/accountd.db?mode=rwc".to_string(),
                max_connections: 5,
                connection_timeout: 30,
            },
            remote: RemoteConfig {
                endpoint: String::new(),
                request_timeout: 10,
            },
            sync: SyncConfig {
                auto_sync: true,
                sync_interval: 300, // 5 minutes
            },
            connectivity: ConnectivityConfig {
                probe_addr: "1.1.1.1:443".to_string(),
                probe_timeout: 3,
                poll_interval: 30,
            },
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("ACCOUNTD_DATABASE_URL") {
            if !v.trim().is_empty() {
                cfg.database.url = v;
            }
        }
        if let Ok(v) = std::env::var("ACCOUNTD_REMOTE_ENDPOINT") {
            cfg.remote.endpoint = v;
        }
        if let Ok(v) = std::env::var("ACCOUNTD_AUTO_SYNC") {
            cfg.sync.auto_sync = parse_bool(&v, cfg.sync.auto_sync);
        }
        if let Ok(v) = std::env::var("ACCOUNTD_SYNC_INTERVAL") {
            if let Some(value) = parse_u64(&v) {
                cfg.sync.sync_interval = value.max(1);
            }
        }
        if let Ok(v) = std::env::var("ACCOUNTD_PROBE_ADDR") {
            if !v.trim().is_empty() {
                cfg.connectivity.probe_addr = v;
            }
        }
        if let Ok(v) = std::env::var("ACCOUNTD_PROBE_TIMEOUT") {
            if let Some(value) = parse_u64(&v) {
                cfg.connectivity.probe_timeout = value.max(1);
            }
        }
        if let Ok(v) = std::env::var("ACCOUNTD_POLL_INTERVAL") {
            if let Some(value) = parse_u64(&v) {
                cfg.connectivity.poll_interval = value.max(1);
            }
        }

        cfg
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.database.url.trim().is_empty() {
            return Err("Database url must not be empty".to_string());
        }
        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }
        if self.sync.sync_interval == 0 {
            return Err("Sync sync_interval must be greater than 0".to_string());
        }
        if self.connectivity.poll_interval == 0 {
            return Err("Connectivity poll_interval must be greater than 0".to_string());
        }
        Ok(())
    }
}

fn parse_bool(s: &str, default: bool) -> bool {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

fn parse_u64(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_intervals() {
        let mut cfg = AppConfig::default();
        cfg.sync.sync_interval = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_parse_bool_falls_back_to_default() {
        assert!(parse_bool("yes", false));
        assert!(!parse_bool("off", true));
        assert!(parse_bool("garbage", true));
    }
}
