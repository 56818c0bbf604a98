//! Transport module for Resocks
//!
//! This module provides TCP socket tuning, the local listener and the
//! bounded dialer used to reach the upstream proxy.

mod tcp;

pub use tcp::{bind_listener, connect_tcp};

use crate::config::TcpConfig;
use std::time::Duration;
use tokio::net::TcpStream;

/// Socket options for configuring connections
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketOpts {
    /// Enable TCP_NODELAY
    pub nodelay: bool,
    /// TCP keepalive period
    pub keepalive: Option<Duration>,
    /// SO_RCVBUF size in bytes
    pub recv_buffer_size: Option<usize>,
    /// SO_SNDBUF size in bytes
    pub send_buffer_size: Option<usize>,
    /// SO_LINGER timeout, `Some(ZERO)` closes with a reset
    pub linger: Option<Duration>,
}

impl Default for SocketOpts {
    fn default() -> Self {
        SocketOpts::from_tcp_config(&TcpConfig::default())
    }
}

impl SocketOpts {
    /// Create socket options from TCP config
    pub fn from_tcp_config(config: &TcpConfig) -> Self {
        SocketOpts {
            nodelay: config.nodelay,
            keepalive: (config.keepalive_secs > 0)
                .then(|| Duration::from_secs(config.keepalive_secs)),
            recv_buffer_size: (config.recv_buffer_size > 0).then_some(config.recv_buffer_size),
            send_buffer_size: (config.send_buffer_size > 0).then_some(config.send_buffer_size),
            linger: config.no_linger.then_some(Duration::ZERO),
        }
    }

    /// Enable only keepalive, as applied to freshly accepted connections
    pub fn keepalive_only(&self) -> Self {
        SocketOpts {
            nodelay: self.nodelay,
            keepalive: self.keepalive,
            recv_buffer_size: None,
            send_buffer_size: None,
            linger: None,
        }
    }

    /// Apply socket options to a TCP stream
    pub fn apply(&self, stream: &TcpStream) -> std::io::Result<()> {
        stream.set_nodelay(self.nodelay)?;

        let socket = socket2::SockRef::from(stream);
        if let Some(period) = self.keepalive {
            let keepalive = socket2::TcpKeepalive::new()
                .with_time(period)
                .with_interval(period);
            socket.set_tcp_keepalive(&keepalive)?;
        }
        if let Some(size) = self.recv_buffer_size {
            socket.set_recv_buffer_size(size)?;
        }
        if let Some(size) = self.send_buffer_size {
            socket.set_send_buffer_size(size)?;
        }
        if self.linger.is_some() {
            socket.set_linger(self.linger)?;
        }

        Ok(())
    }

    /// Apply socket options, logging instead of failing
    pub fn hint(&self, stream: &TcpStream) {
        if let Err(e) = self.apply(stream) {
            tracing::warn!("Failed to apply socket options: {}", e);
        }
    }
}
