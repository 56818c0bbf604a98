//! SOCKS5 module for Resocks
//!
//! This module implements both ends of the SOCKS5 protocol used by the
//! relay: the permissive server side spoken to local clients and the
//! authenticated client side spoken to the upstream proxy.

mod client;
mod codec;
mod consts;
mod server;
mod types;

pub use client::{connect_handshake, Socks5Upstream, UpstreamConnect};
pub use codec::{
    write_message, ConnectRequest, MethodRequest, MethodSelection, PasswordReply,
    PasswordRequest, Reply,
};
pub use consts::*;
pub use server::{accept_handshake, send_reply};
pub use types::TargetAddr;
