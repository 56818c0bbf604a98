//! # Resocks - Local SOCKS5 Relay to an Authenticated Upstream
//!
//! Resocks runs a SOCKS5 server on the loopback interface that needs no
//! authentication and forwards every CONNECT through a remote SOCKS5 proxy
//! that requires a username and password. Applications that cannot speak
//! authenticated SOCKS5 point at the local relay instead.
//!
//! ## Features
//!
//! - **Chained CONNECT**: Every client session becomes one upstream tunnel
//! - **No Local DNS**: Domain names are forwarded to the upstream verbatim
//! - **Start/Stop Lifecycle**: The relay can be restarted with new settings
//! - **Pooled Buffers**: Large copy buffers are reused across sessions
//!
//! ## Usage
//!
//! ```rust,ignore
//! use resocks::config::{load_config, SettingsState};
//! use resocks::controller::RelayController;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config("config.toml")?;
//!     let controller = RelayController::new(config.relay, SettingsState::new(config.upstream));
//!
//!     let addr = controller.start_proxy().await?;
//!     println!("SOCKS5 relay at {}", addr);
//!     tokio::signal::ctrl_c().await?;
//!     controller.shutdown().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Application -> Resocks (127.0.0.1:56788, no auth) -> Upstream SOCKS5 (user/pass) -> Target
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod controller;
pub mod error;
pub mod pool;
pub mod relay;
pub mod socks;
pub mod transport;

// Re-export commonly used items
pub use config::{load_config, Config, Settings, SettingsState};
pub use controller::{RelayController, RelayEvent};
pub use error::{RelayError, Socks5Error};
pub use relay::RelayServer;

/// Version of the Resocks library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the application
pub const NAME: &str = env!("CARGO_PKG_NAME");
