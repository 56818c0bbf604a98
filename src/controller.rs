//! Lifecycle controller
//!
//! Couples the relay with the settings store: starting marks the settings
//! enabled, stopping marks them disabled and saving new settings restarts a
//! running relay. Start and stop transitions are serialized here and
//! announced as [`RelayEvent`]s.

use crate::config::{RelayConfig, Settings, SettingsState};
use crate::error::{RelayError, Result};
use crate::relay::RelayServer;
use std::net::SocketAddr;
use tokio::sync::{broadcast, Mutex};
use tracing::info;

/// Capacity of the event channel
const EVENT_CAPACITY: usize = 16;

/// Relay lifecycle notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayEvent {
    /// The relay is accepting clients at this address
    Started(SocketAddr),
    /// The relay stopped accepting clients
    Stopped,
}

/// Start/stop policy on top of [`RelayServer`]
pub struct RelayController {
    server: RelayServer,
    settings: SettingsState,
    events: broadcast::Sender<RelayEvent>,
    lifecycle: Mutex<()>,
}

impl RelayController {
    /// Create a controller with a stopped relay
    pub fn new(config: RelayConfig, settings: SettingsState) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        RelayController {
            server: RelayServer::new(config),
            settings,
            events,
            lifecycle: Mutex::new(()),
        }
    }

    /// Start the relay with the stored settings and mark them enabled
    pub async fn start_proxy(&self) -> Result<SocketAddr> {
        let _guard = self.lifecycle.lock().await;

        let settings = self.settings.get();
        if !settings.is_configured() {
            return Err(RelayError::NotConfigured);
        }

        let addr = self.server.start(settings)?;
        self.settings.update(|s| s.enabled = true);
        self.emit(RelayEvent::Started(addr));
        Ok(addr)
    }

    /// Stop the relay and mark the settings disabled
    pub async fn stop_proxy(&self) -> Result<()> {
        let _guard = self.lifecycle.lock().await;

        self.server.stop().await?;
        self.settings.update(|s| s.enabled = false);
        self.emit(RelayEvent::Stopped);
        Ok(())
    }

    /// Store new settings, restarting the relay if it was running
    pub async fn save_settings(&self, settings: Settings) -> Result<()> {
        let _guard = self.lifecycle.lock().await;

        let was_running = self.server.is_running();
        if was_running {
            self.server.stop().await?;
            self.emit(RelayEvent::Stopped);
        }

        self.settings.set(settings.clone());

        if was_running {
            let addr = self.server.start(settings)?;
            self.emit(RelayEvent::Started(addr));
            info!("Settings saved, relay restarted");
        } else {
            info!("Settings saved");
        }
        Ok(())
    }

    /// Start the relay if the stored settings ask for it
    ///
    /// Returns whether the relay was started. Disabled or incomplete
    /// settings are not an error.
    pub async fn auto_start(&self) -> Result<bool> {
        let _guard = self.lifecycle.lock().await;

        let settings = self.settings.get();
        if !settings.enabled || !settings.is_configured() {
            return Ok(false);
        }

        let addr = self.server.start(settings)?;
        self.emit(RelayEvent::Started(addr));
        Ok(true)
    }

    /// Stop the relay without touching the enabled flag
    ///
    /// Used on process exit so the next launch starts again.
    pub async fn shutdown(&self) -> Result<()> {
        let _guard = self.lifecycle.lock().await;

        if self.server.is_running() {
            self.server.stop().await?;
            self.emit(RelayEvent::Stopped);
        }
        Ok(())
    }

    /// Whether the relay is accepting clients
    pub fn is_running(&self) -> bool {
        self.server.is_running()
    }

    /// Address local clients should connect to
    ///
    /// The bound address while running, the configured one otherwise.
    pub fn local_address(&self) -> SocketAddr {
        self.server
            .local_addr()
            .unwrap_or(self.server.config().listen_addr)
    }

    /// Current settings
    pub fn settings(&self) -> Settings {
        self.settings.get()
    }

    /// Settings store backing this controller
    pub fn settings_state(&self) -> &SettingsState {
        &self.settings
    }

    /// Underlying relay
    pub fn server(&self) -> &RelayServer {
        &self.server
    }

    /// Receive lifecycle events from now on
    pub fn subscribe(&self) -> broadcast::Receiver<RelayEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: RelayEvent) {
        info!("Relay event: {:?}", event);
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller(settings: Settings) -> RelayController {
        let config = RelayConfig {
            listen_addr: "127.0.0.1:0".parse().unwrap(),
            buffer_size: 1024,
            ..Default::default()
        };
        RelayController::new(config, SettingsState::new(settings))
    }

    fn configured() -> Settings {
        Settings {
            server_address: "127.0.0.1".to_string(),
            server_port: 1080,
            server_login: "user".to_string(),
            server_password: "pass".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_start_requires_configuration() {
        let controller = controller(Settings::default());
        let result = controller.start_proxy().await;
        assert!(matches!(result, Err(RelayError::NotConfigured)));
        assert!(!controller.is_running());
    }

    #[tokio::test]
    async fn test_start_and_stop_toggle_enabled() {
        let controller = controller(configured());
        let mut events = controller.subscribe();

        let addr = controller.start_proxy().await.unwrap();
        assert!(controller.is_running());
        assert!(controller.settings().enabled);
        assert_eq!(controller.local_address(), addr);
        assert_eq!(events.recv().await.unwrap(), RelayEvent::Started(addr));

        controller.stop_proxy().await.unwrap();
        assert!(!controller.is_running());
        assert!(!controller.settings().enabled);
        assert_eq!(events.recv().await.unwrap(), RelayEvent::Stopped);
    }

    #[tokio::test]
    async fn test_start_twice_reports_already_running() {
        let controller = controller(configured());
        controller.start_proxy().await.unwrap();
        assert!(matches!(
            controller.start_proxy().await,
            Err(RelayError::AlreadyRunning)
        ));
        controller.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_save_settings_restarts_running_relay() {
        let controller = controller(configured());
        controller.start_proxy().await.unwrap();
        let mut events = controller.subscribe();

        let updated = Settings {
            server_port: 1081,
            enabled: true,
            ..configured()
        };
        controller.save_settings(updated.clone()).await.unwrap();

        assert!(controller.is_running());
        assert_eq!(controller.settings(), updated);
        assert_eq!(controller.server().settings(), Some(updated));
        assert_eq!(events.recv().await.unwrap(), RelayEvent::Stopped);
        assert!(matches!(
            events.recv().await.unwrap(),
            RelayEvent::Started(_)
        ));
        controller.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_save_settings_when_stopped_only_stores() {
        let controller = controller(Settings::default());
        let mut events = controller.subscribe();

        controller.save_settings(configured()).await.unwrap();
        assert!(!controller.is_running());
        assert_eq!(controller.settings(), configured());
        assert!(matches!(
            events.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn test_auto_start_policy() {
        let disabled = controller(configured());
        assert!(!disabled.auto_start().await.unwrap());
        assert!(!disabled.is_running());

        let unconfigured = controller(Settings {
            enabled: true,
            ..Default::default()
        });
        assert!(!unconfigured.auto_start().await.unwrap());

        let enabled = controller(Settings {
            enabled: true,
            ..configured()
        });
        assert!(enabled.auto_start().await.unwrap());
        assert!(enabled.is_running());
        enabled.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_keeps_enabled_flag() {
        let controller = controller(configured());
        controller.start_proxy().await.unwrap();

        controller.shutdown().await.unwrap();
        assert!(!controller.is_running());
        assert!(controller.settings().enabled);
    }
}
