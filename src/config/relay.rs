//! Relay configuration types
//!
//! Listener address, buffer pool sizing, timeouts and TCP socket options.

use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Default local loopback host
pub const DEFAULT_LOCAL_HOST: Ipv4Addr = Ipv4Addr::LOCALHOST;

/// Default local listen port
pub const DEFAULT_LOCAL_PORT: u16 = 56788;

/// Default listen address
fn default_listen_addr() -> SocketAddr {
    SocketAddr::from((DEFAULT_LOCAL_HOST, DEFAULT_LOCAL_PORT))
}

/// Default copy buffer size (4 MiB)
fn default_buffer_size() -> usize {
    4 * 1024 * 1024
}

/// Default number of idle buffers kept by the pool
fn default_max_idle_buffers() -> usize {
    16
}

/// Default upstream dial timeout in seconds
fn default_connect_timeout() -> u64 {
    10
}

/// Default upstream handshake deadline in seconds
fn default_handshake_timeout() -> u64 {
    30
}

/// Relay configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Local address the SOCKS5 listener binds to
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Size of each pooled copy buffer in bytes
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Maximum number of idle buffers retained by the pool
    #[serde(default = "default_max_idle_buffers")]
    pub max_idle_buffers: usize,

    /// Upstream dial timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Deadline in seconds covering the full upstream handshake
    #[serde(default = "default_handshake_timeout")]
    pub handshake_timeout: u64,

    /// TCP socket options applied to both sides of a session
    #[serde(default)]
    pub tcp: TcpConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        RelayConfig {
            listen_addr: default_listen_addr(),
            buffer_size: default_buffer_size(),
            max_idle_buffers: default_max_idle_buffers(),
            connect_timeout: default_connect_timeout(),
            handshake_timeout: default_handshake_timeout(),
            tcp: TcpConfig::default(),
        }
    }
}

impl RelayConfig {
    /// Upstream dial timeout
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    /// Upstream handshake deadline
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.handshake_timeout)
    }

    /// Validate the relay configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.buffer_size == 0 {
            return Err("buffer_size must be greater than 0".to_string());
        }
        if self.connect_timeout == 0 {
            return Err("connect_timeout must be greater than 0".to_string());
        }
        if self.handshake_timeout == 0 {
            return Err("handshake_timeout must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Default keepalive period in seconds
fn default_keepalive_secs() -> u64 {
    30
}

/// Default socket buffer size (8 MiB)
fn default_socket_buffer_size() -> usize {
    8 * 1024 * 1024
}

fn default_true() -> bool {
    true
}

/// TCP socket configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TcpConfig {
    /// Enable TCP_NODELAY
    #[serde(default = "default_true")]
    pub nodelay: bool,

    /// TCP keepalive period in seconds
    #[serde(default = "default_keepalive_secs")]
    pub keepalive_secs: u64,

    /// SO_RCVBUF size in bytes
    #[serde(default = "default_socket_buffer_size")]
    pub recv_buffer_size: usize,

    /// SO_SNDBUF size in bytes
    #[serde(default = "default_socket_buffer_size")]
    pub send_buffer_size: usize,

    /// Close with SO_LINGER 0, discarding unsent data instead of lingering
    #[serde(default = "default_true")]
    pub no_linger: bool,
}

impl Default for TcpConfig {
    fn default() -> Self {
        TcpConfig {
            nodelay: true,
            keepalive_secs: default_keepalive_secs(),
            recv_buffer_size: default_socket_buffer_size(),
            send_buffer_size: default_socket_buffer_size(),
            no_linger: true,
        }
    }
}
