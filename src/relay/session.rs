//! Single client session
//!
//! Handshake with the local client, open the upstream tunnel, answer the
//! client and relay data until either side closes.

use super::copy::{relay_bidirectional, RelayStats};
use crate::error::{RelayError, Result, Socks5ReplyCode};
use crate::pool::BufferPool;
use crate::socks::{accept_handshake, send_reply, UpstreamConnect};
use crate::transport::SocketOpts;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Resources shared by every session of a running relay
pub struct SessionContext {
    /// Opens upstream tunnels
    pub connector: Arc<dyn UpstreamConnect>,
    /// Copy buffers
    pub pool: Arc<BufferPool>,
    /// Options applied to the client socket before relaying
    pub opts: SocketOpts,
}

/// Serve one accepted client connection
///
/// `shutdown` aborts the session while it is still in the handshake or
/// upstream-connect phase. An established relay runs until a peer closes.
pub async fn serve(
    mut client: TcpStream,
    ctx: Arc<SessionContext>,
    shutdown: CancellationToken,
) -> Result<RelayStats> {
    let upstream = tokio::select! {
        biased;
        _ = shutdown.cancelled() => return Err(RelayError::Cancelled),
        upstream = establish(&mut client, ctx.connector.as_ref()) => upstream?,
    };

    ctx.opts.hint(&client);
    let stats = relay_bidirectional(client, upstream, &ctx.pool).await;
    debug!(
        "Session closed: {} bytes up, {} bytes down",
        stats.client_to_upstream, stats.upstream_to_client
    );
    Ok(stats)
}

async fn establish(client: &mut TcpStream, connector: &dyn UpstreamConnect) -> Result<TcpStream> {
    let target = accept_handshake(client).await?;
    debug!("CONNECT {}", target);

    match connector.connect(&target).await {
        Ok(upstream) => {
            send_reply(client, Socks5ReplyCode::Succeeded).await?;
            Ok(upstream)
        }
        Err(e) => {
            debug!("Upstream connect to {} failed: {}", target, e);
            // The session ends either way
            let _ = send_reply(client, Socks5ReplyCode::HostUnreachable).await;
            Err(e)
        }
    }
}
