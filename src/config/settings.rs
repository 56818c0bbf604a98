//! Upstream proxy settings
//!
//! The immutable snapshot handed to the relay at start time.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Upstream proxy settings
#[derive(Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    /// Whether the relay should be running
    #[serde(default)]
    pub enabled: bool,

    /// Upstream SOCKS5 proxy host (name or IP literal)
    #[serde(default)]
    pub server_address: String,

    /// Upstream SOCKS5 proxy port
    #[serde(default)]
    pub server_port: u16,

    /// Username for upstream authentication
    #[serde(default)]
    pub server_login: String,

    /// Password for upstream authentication
    #[serde(default)]
    pub server_password: String,
}

/// Username/password pair presented to the upstream proxy
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Username
    pub username: String,
    /// Password
    pub password: String,
}

impl Settings {
    /// Check that an upstream address and port are present
    pub fn is_configured(&self) -> bool {
        !self.server_address.is_empty() && self.server_port != 0
    }

    /// Upstream endpoint as `host:port`
    pub fn upstream_endpoint(&self) -> String {
        if self.server_address.contains(':') && !self.server_address.starts_with('[') {
            format!("[{}]:{}", self.server_address, self.server_port)
        } else {
            format!("{}:{}", self.server_address, self.server_port)
        }
    }

    /// Credentials for the upstream username/password sub-negotiation
    pub fn credentials(&self) -> Credentials {
        Credentials {
            username: self.server_login.clone(),
            password: self.server_password.clone(),
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("enabled", &self.enabled)
            .field("server_address", &self.server_address)
            .field("server_port", &self.server_port)
            .field("server_login", &self.server_login)
            .field("server_password", &"<redacted>")
            .finish()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> Settings {
        Settings {
            enabled: true,
            server_address: "proxy.example.com".to_string(),
            server_port: 1080,
            server_login: "user".to_string(),
            server_password: "secret".to_string(),
        }
    }

    #[test]
    fn test_settings_default_not_configured() {
        let settings = Settings::default();
        assert!(!settings.enabled);
        assert!(!settings.is_configured());
    }

    #[test]
    fn test_settings_is_configured() {
        assert!(configured().is_configured());

        let settings = Settings {
            server_port: 0,
            ..configured()
        };
        assert!(!settings.is_configured());

        let settings = Settings {
            server_address: String::new(),
            ..configured()
        };
        assert!(!settings.is_configured());
    }

    #[test]
    fn test_upstream_endpoint() {
        assert_eq!(configured().upstream_endpoint(), "proxy.example.com:1080");

        let settings = Settings {
            server_address: "::1".to_string(),
            ..configured()
        };
        assert_eq!(settings.upstream_endpoint(), "[::1]:1080");
    }

    #[test]
    fn test_debug_redacts_password() {
        let debug_str = format!("{:?}", configured());
        assert!(debug_str.contains("proxy.example.com"));
        assert!(!debug_str.contains("secret"));

        let debug_str = format!("{:?}", configured().credentials());
        assert!(debug_str.contains("user"));
        assert!(!debug_str.contains("secret"));
    }
}
