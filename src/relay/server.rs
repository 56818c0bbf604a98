//! Relay server lifecycle
//!
//! Owns the local listener, the accept loop task and the session tracker.

use super::session::{serve, SessionContext};
use crate::config::{RelayConfig, Settings};
use crate::error::{RelayError, Result};
use crate::pool::BufferPool;
use crate::socks::{Socks5Upstream, UpstreamConnect};
use crate::transport::{bind_listener, SocketOpts};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, trace, warn};

/// Pause after a failed accept before trying again
const ACCEPT_ERROR_PAUSE: Duration = Duration::from_millis(50);

struct RunningRelay {
    local_addr: SocketAddr,
    settings: Option<Settings>,
    shutdown: CancellationToken,
    accept_task: JoinHandle<()>,
}

/// Local SOCKS5 relay that can be started and stopped repeatedly
///
/// Start and stop calls are expected to be serialized by the caller; the
/// internal lock only guards the running state, never I/O.
pub struct RelayServer {
    config: RelayConfig,
    pool: Arc<BufferPool>,
    sessions: TaskTracker,
    state: Mutex<Option<RunningRelay>>,
}

impl RelayServer {
    /// Create a stopped relay
    pub fn new(config: RelayConfig) -> Self {
        let pool = BufferPool::new(config.buffer_size, config.max_idle_buffers);
        RelayServer {
            config,
            pool,
            sessions: TaskTracker::new(),
            state: Mutex::new(None),
        }
    }

    /// Bind the listener and start accepting, tunnelling through `settings`
    ///
    /// Returns the bound address once the listener is ready. Fails with
    /// [`RelayError::AlreadyRunning`] when a listener is already bound and
    /// with [`RelayError::Config`] when the relay configuration is invalid.
    /// Must be called from within a tokio runtime.
    pub fn start(&self, settings: Settings) -> Result<SocketAddr> {
        let connector = Arc::new(Socks5Upstream::new(settings.clone(), &self.config));
        self.launch(connector, Some(settings))
    }

    /// Start with a custom upstream connector
    ///
    /// Sessions hand their targets to `connector` instead of a SOCKS5 proxy.
    pub fn start_with(&self, connector: Arc<dyn UpstreamConnect>) -> Result<SocketAddr> {
        self.launch(connector, None)
    }

    fn launch(
        &self,
        connector: Arc<dyn UpstreamConnect>,
        settings: Option<Settings>,
    ) -> Result<SocketAddr> {
        let mut state = self.lock_state();
        if state.is_some() {
            return Err(RelayError::AlreadyRunning);
        }
        self.config.validate().map_err(RelayError::Config)?;

        let listener = bind_listener(self.config.listen_addr)?;
        let local_addr = listener.local_addr()?;

        let opts = SocketOpts::from_tcp_config(&self.config.tcp);
        let ctx = Arc::new(SessionContext {
            connector,
            pool: Arc::clone(&self.pool),
            opts: opts.clone(),
        });
        let shutdown = CancellationToken::new();
        let accept_task = tokio::spawn(accept_loop(
            listener,
            ctx,
            opts.keepalive_only(),
            shutdown.clone(),
            self.sessions.clone(),
        ));

        info!("Listening for SOCKS5 clients at {}", local_addr);
        *state = Some(RunningRelay {
            local_addr,
            settings,
            shutdown,
            accept_task,
        });
        Ok(local_addr)
    }

    /// Stop accepting and close the listener
    ///
    /// A no-op when not running. Sessions still in their handshake are
    /// aborted; sessions already relaying data run until a peer closes.
    pub async fn stop(&self) -> Result<()> {
        let Some(running) = self.lock_state().take() else {
            return Ok(());
        };

        running.shutdown.cancel();
        running
            .accept_task
            .await
            .map_err(|e| RelayError::Shutdown(format!("accept loop failed: {}", e)))?;

        info!("Relay at {} stopped", running.local_addr);
        Ok(())
    }

    /// Whether a listener is currently bound
    pub fn is_running(&self) -> bool {
        self.lock_state().is_some()
    }

    /// Address of the bound listener
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.lock_state().as_ref().map(|running| running.local_addr)
    }

    /// Settings snapshot the running relay was started with
    pub fn settings(&self) -> Option<Settings> {
        self.lock_state()
            .as_ref()
            .and_then(|running| running.settings.clone())
    }

    /// Number of sessions that have not finished yet
    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Wait until every session spawned so far has finished
    pub async fn wait_sessions(&self) {
        self.sessions.close();
        self.sessions.wait().await;
        self.sessions.reopen();
    }

    /// Relay configuration
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Buffer pool shared by all sessions
    pub fn pool(&self) -> &Arc<BufferPool> {
        &self.pool
    }

    fn lock_state(&self) -> MutexGuard<'_, Option<RunningRelay>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for RelayServer {
    fn drop(&mut self) {
        if let Some(running) = self.lock_state().take() {
            running.shutdown.cancel();
        }
    }
}

async fn accept_loop(
    listener: TcpListener,
    ctx: Arc<SessionContext>,
    accept_opts: SocketOpts,
    shutdown: CancellationToken,
    sessions: TaskTracker,
) {
    loop {
        let accepted = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            accepted = listener.accept() => accepted,
        };

        match accepted {
            Ok((stream, peer)) => {
                trace!("Accepted connection from {}", peer);
                accept_opts.hint(&stream);

                let ctx = Arc::clone(&ctx);
                let shutdown = shutdown.clone();
                sessions.spawn(async move {
                    if let Err(e) = serve(stream, ctx, shutdown).await {
                        debug!("Session from {} ended: {}", peer, e);
                    }
                });
            }
            Err(e) => {
                if shutdown.is_cancelled() {
                    break;
                }
                warn!("Failed to accept connection: {}", e);
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(ACCEPT_ERROR_PAUSE) => {}
                }
            }
        }
    }

    debug!("Accept loop exited");
}
