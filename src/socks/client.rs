//! Upstream SOCKS5 client
//!
//! Dials the configured upstream proxy, authenticates with username and
//! password and asks it to CONNECT to the client's target.

use super::codec::{
    write_message, ConnectRequest, MethodRequest, MethodSelection, PasswordReply,
    PasswordRequest, Reply,
};
use super::consts::{SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE, SOCKS5_AUTH_METHOD_PASSWORD};
use super::types::TargetAddr;
use crate::config::{RelayConfig, Settings};
use crate::error::{RelayError, Result, Socks5Error};
use crate::transport::{connect_tcp, SocketOpts};
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::debug;

/// Opens tunnels to a target through some upstream
#[async_trait]
pub trait UpstreamConnect: Send + Sync {
    /// Return a stream that is connected to `target` and ready for data
    async fn connect(&self, target: &TargetAddr) -> Result<TcpStream>;
}

/// Run the client side of the upstream handshake on an open stream
///
/// Offers only username/password, authenticates, then sends CONNECT.
/// Domains that spell an IP literal are sent with the matching IP address
/// type. On success the stream is positioned at the first tunnel byte.
pub async fn connect_handshake<S>(
    stream: &mut S,
    auth: &PasswordRequest,
    target: &TargetAddr,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    write_message(stream, &MethodRequest::single(SOCKS5_AUTH_METHOD_PASSWORD).encode()).await?;

    let selection = MethodSelection::read_from(stream).await?;
    if selection.method == SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE {
        debug!("Upstream proxy does not accept username/password authentication");
    }
    if selection.method != SOCKS5_AUTH_METHOD_PASSWORD {
        return Err(Socks5Error::UnexpectedMethod(selection.method).into());
    }

    write_message(stream, &auth.encode()?).await?;
    let status = PasswordReply::read_from(stream).await?;
    if !status.is_success() {
        return Err(Socks5Error::AuthFailed(status.status).into());
    }

    let request = ConnectRequest::new(target.clone().with_literal_ip());
    write_message(stream, &request.encode()?).await?;
    Reply::read_from(stream).await?;

    Ok(())
}

/// Connector that tunnels through an authenticated SOCKS5 proxy
#[derive(Debug, Clone)]
pub struct Socks5Upstream {
    settings: Settings,
    opts: SocketOpts,
    connect_timeout: Duration,
    handshake_timeout: Duration,
}

impl Socks5Upstream {
    /// Connector for the proxy in `settings`, tuned by `config`
    pub fn new(settings: Settings, config: &RelayConfig) -> Self {
        Socks5Upstream {
            settings,
            opts: SocketOpts::from_tcp_config(&config.tcp),
            connect_timeout: config.connect_timeout(),
            handshake_timeout: config.handshake_timeout(),
        }
    }

    /// Settings this connector was built from
    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

#[async_trait]
impl UpstreamConnect for Socks5Upstream {
    async fn connect(&self, target: &TargetAddr) -> Result<TcpStream> {
        // Checked before dialing so oversized credentials never reach the network
        let auth = PasswordRequest::new(&self.settings.credentials())?;

        let mut stream = connect_tcp(
            &self.settings.server_address,
            self.settings.server_port,
            self.connect_timeout,
        )
        .await?;
        self.opts.hint(&stream);

        tokio::time::timeout(
            self.handshake_timeout,
            connect_handshake(&mut stream, &auth, target),
        )
        .await
        .map_err(|_| {
            RelayError::Timeout(format!(
                "handshake with upstream {}",
                self.settings.upstream_endpoint()
            ))
        })??;

        debug!(
            "Upstream {} connected to {}",
            self.settings.upstream_endpoint(),
            target
        );
        Ok(stream)
    }
}
