//! Configuration module for Resocks
//!
//! This module provides configuration types, TOML parsing and persistence.

mod relay;
mod settings;
mod state;

pub use relay::{RelayConfig, TcpConfig, DEFAULT_LOCAL_HOST, DEFAULT_LOCAL_PORT};
pub use settings::{Credentials, Settings};
pub use state::SettingsState;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Upstream proxy settings
    #[serde(default)]
    pub upstream: Settings,

    /// Local relay configuration
    #[serde(default)]
    pub relay: RelayConfig,
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

    parse_config(&content)
}

/// Parse configuration from a TOML string
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config =
        toml::from_str(content).with_context(|| "Failed to parse configuration")?;
    config
        .relay
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid relay configuration: {}", e))?;
    Ok(config)
}

/// Write configuration back to a TOML file
pub fn save_config<P: AsRef<Path>>(path: P, config: &Config) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }

    let content =
        toml::to_string_pretty(config).with_context(|| "Failed to serialize configuration")?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config file: {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_config() {
        let config = parse_config("").unwrap();
        assert_eq!(config, Config::default());
        assert!(!config.upstream.is_configured());
    }

    #[test]
    fn test_parse_full_config() {
        let config_str = r#"
[upstream]
enabled = true
server_address = "proxy.example.com"
server_port = 1080
server_login = "user"
server_password = "pass"

[relay]
listen_addr = "127.0.0.1:1081"
buffer_size = 65536
connect_timeout = 5

[relay.tcp]
nodelay = false
keepalive_secs = 60
no_linger = false
"#;

        let config = parse_config(config_str).unwrap();
        assert!(config.upstream.enabled);
        assert_eq!(config.upstream.server_address, "proxy.example.com");
        assert_eq!(config.upstream.server_port, 1080);
        assert_eq!(config.upstream.server_login, "user");
        assert_eq!(config.relay.listen_addr.port(), 1081);
        assert_eq!(config.relay.buffer_size, 65536);
        assert_eq!(config.relay.connect_timeout, 5);
        assert_eq!(config.relay.handshake_timeout, 30);
        assert!(!config.relay.tcp.nodelay);
        assert_eq!(config.relay.tcp.keepalive_secs, 60);
        assert!(!config.relay.tcp.no_linger);
    }

    #[test]
    fn test_parse_invalid_relay_config() {
        let config_str = r#"
[relay]
buffer_size = 0
"#;
        assert!(parse_config(config_str).is_err());
    }

    #[test]
    fn test_parse_port_out_of_range() {
        let config_str = r#"
[upstream]
server_port = 70000
"#;
        assert!(parse_config(config_str).is_err());
    }

    #[test]
    fn test_save_and_load_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("resocks.toml");

        let mut config = Config::default();
        config.upstream.enabled = true;
        config.upstream.server_address = "10.1.2.3".to_string();
        config.upstream.server_port = 1080;
        config.upstream.server_password = "p@ss".to_string();

        save_config(&path, &config).unwrap();
        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config(dir.path().join("missing.toml"));
        assert!(result.is_err());
    }
}
