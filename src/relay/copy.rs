//! Bidirectional data relay
//!
//! Each direction runs as its own task with a pooled buffer. Both tasks
//! report to a completion channel. The first completion tears the session
//! down: the session token is cancelled, which stops the other task and
//! lets both sockets close once their halves are dropped.

use crate::pool::{BufferPool, PooledBuffer};
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Bytes moved in each direction of a finished relay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// Bytes read from the client and written upstream
    pub client_to_upstream: u64,
    /// Bytes read from upstream and written to the client
    pub upstream_to_client: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    ClientToUpstream,
    UpstreamToClient,
}

/// Relay bytes between `client` and `upstream` until either side ends
///
/// Returns once both copy tasks have finished, so no task of the session
/// outlives this call. EOF and I/O errors both end the relay; errors are
/// only logged.
pub async fn relay_bidirectional<A, B>(client: A, upstream: B, pool: &Arc<BufferPool>) -> RelayStats
where
    A: AsyncRead + AsyncWrite + Send + 'static,
    B: AsyncRead + AsyncWrite + Send + 'static,
{
    let (client_read, client_write) = tokio::io::split(client);
    let (upstream_read, upstream_write) = tokio::io::split(upstream);

    let token = CancellationToken::new();
    let (done_tx, mut done_rx) = mpsc::channel(2);

    spawn_copy(
        Direction::ClientToUpstream,
        client_read,
        upstream_write,
        pool.acquire(),
        token.clone(),
        done_tx.clone(),
    );
    spawn_copy(
        Direction::UpstreamToClient,
        upstream_read,
        client_write,
        pool.acquire(),
        token.clone(),
        done_tx,
    );

    let mut stats = RelayStats::default();

    // First finisher closes the session, then wait for the second
    for _ in 0..2 {
        let Some((direction, result)) = done_rx.recv().await else {
            break;
        };
        token.cancel();

        let bytes = match result {
            Ok(bytes) => bytes,
            Err(CopyError { bytes, error }) => {
                debug!("Relay {:?} ended with error: {}", direction, error);
                bytes
            }
        };
        match direction {
            Direction::ClientToUpstream => stats.client_to_upstream = bytes,
            Direction::UpstreamToClient => stats.upstream_to_client = bytes,
        }
    }

    stats
}

struct CopyError {
    bytes: u64,
    error: io::Error,
}

type CopyResult = Result<u64, CopyError>;

fn spawn_copy<R, W>(
    direction: Direction,
    reader: R,
    writer: W,
    buf: PooledBuffer,
    token: CancellationToken,
    done: mpsc::Sender<(Direction, CopyResult)>,
) where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let result = copy_until_cancelled(reader, writer, buf, &token).await;
        if result.is_err() {
            // Unblock the opposite direction
            token.cancel();
        }
        let _ = done.send((direction, result)).await;
    });
}

async fn copy_until_cancelled<R, W>(
    mut reader: R,
    mut writer: W,
    mut buf: PooledBuffer,
    token: &CancellationToken,
) -> CopyResult
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut bytes = 0u64;
    loop {
        let read = tokio::select! {
            _ = token.cancelled() => return Ok(bytes),
            read = reader.read(&mut buf[..]) => read,
        };
        let n = match read {
            Ok(0) => return Ok(bytes),
            Ok(n) => n,
            Err(error) => return Err(CopyError { bytes, error }),
        };

        let written = tokio::select! {
            _ = token.cancelled() => return Ok(bytes),
            written = writer.write_all(&buf[..n]) => written,
        };
        if let Err(error) = written {
            return Err(CopyError { bytes, error });
        }
        bytes += n as u64;
    }
}
