//! Settings store with change notification
//!
//! Holds the current [`Settings`] and lets interested parties subscribe to
//! every committed change.

use super::Settings;
use tokio::sync::watch;

/// Shared settings store
#[derive(Debug, Clone)]
pub struct SettingsState {
    tx: watch::Sender<Settings>,
}

impl SettingsState {
    /// Create a store holding the initial settings
    pub fn new(initial: Settings) -> Self {
        let (tx, _rx) = watch::channel(initial);
        SettingsState { tx }
    }

    /// Current settings snapshot
    pub fn get(&self) -> Settings {
        self.tx.borrow().clone()
    }

    /// Replace the settings and notify subscribers
    pub fn set(&self, settings: Settings) {
        self.tx.send_replace(settings);
    }

    /// Modify the settings in place and notify subscribers
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut Settings),
    {
        self.tx.send_modify(f);
    }

    /// Subscribe to settings changes
    pub fn subscribe(&self) -> watch::Receiver<Settings> {
        self.tx.subscribe()
    }
}

impl Default for SettingsState {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set() {
        let state = SettingsState::default();
        assert!(!state.get().enabled);

        state.set(Settings {
            enabled: true,
            server_address: "10.0.0.1".to_string(),
            server_port: 1080,
            ..Default::default()
        });

        let current = state.get();
        assert!(current.enabled);
        assert_eq!(current.server_port, 1080);
    }

    #[test]
    fn test_update_without_subscribers() {
        let state = SettingsState::default();
        state.update(|s| s.server_port = 9050);
        assert_eq!(state.get().server_port, 9050);
    }

    #[tokio::test]
    async fn test_subscriber_sees_changes() {
        let state = SettingsState::default();
        let mut rx = state.subscribe();

        state.update(|s| s.enabled = true);

        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().enabled);

        let cloned = state.clone();
        cloned.set(Settings::default());
        rx.changed().await.unwrap();
        assert!(!rx.borrow().enabled);
    }
}
