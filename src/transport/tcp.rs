//! TCP listener and dialer
//!
//! Binds the local SOCKS5 listener and dials the upstream proxy.

use crate::error::{RelayError, Result};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};

/// Listen backlog for the local listener
const LISTEN_BACKLOG: i32 = 1024;

/// Bind a TCP listener with SO_REUSEADDR set
///
/// Reusing the address lets a stopped relay rebind its fixed port right
/// away while old connections sit in TIME_WAIT. Must be called from within
/// a tokio runtime.
pub fn bind_listener(addr: SocketAddr) -> Result<TcpListener> {
    let socket = socket2::Socket::new(
        socket2::Domain::for_address(addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(LISTEN_BACKLOG)?;

    let listener = TcpListener::from_std(socket.into())?;
    Ok(listener)
}

/// Connect to `host:port` with a bounded timeout
pub async fn connect_tcp(host: &str, port: u16, timeout: Duration) -> Result<TcpStream> {
    let stream = tokio::time::timeout(timeout, TcpStream::connect((host, port)))
        .await
        .map_err(|_| RelayError::Timeout(format!("connecting to {}:{}", host, port)))?
        .map_err(|e| RelayError::Upstream(format!("failed to connect to {}:{}: {}", host, port, e)))?;

    tracing::debug!("TCP connection established to {}:{}", host, port);

    Ok(stream)
}
