//! Relay module for Resocks
//!
//! Accepts local SOCKS5 clients and chains each one through the upstream
//! proxy, copying bytes in both directions.

mod copy;
mod server;
mod session;

pub use copy::{relay_bidirectional, RelayStats};
pub use server::RelayServer;
pub use session::{serve, SessionContext};
