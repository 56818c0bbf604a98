//! Error types for Resocks
//!
//! This module defines all custom error types used throughout the relay.

use std::io;
use thiserror::Error;

/// Main error type for relay operations
#[derive(Error, Debug)]
pub enum RelayError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Start was called while a listener is already bound
    #[error("Relay is already running")]
    AlreadyRunning,

    /// Upstream proxy address or port is missing
    #[error("Upstream proxy settings are not configured")]
    NotConfigured,

    /// SOCKS5 protocol error
    #[error("SOCKS5 error: {0}")]
    Socks5(#[from] Socks5Error),

    /// Upstream proxy could not be reached
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Timeout error
    #[error("Timeout: {0}")]
    Timeout(String),

    /// The relay was stopped while the operation was in progress
    #[error("Operation cancelled by relay shutdown")]
    Cancelled,

    /// Listener could not be shut down cleanly
    #[error("Shutdown error: {0}")]
    Shutdown(String),
}

/// SOCKS5 specific errors
#[derive(Error, Debug)]
pub enum Socks5Error {
    /// Unsupported SOCKS version
    #[error("Unsupported SOCKS version: {0}")]
    UnsupportedVersion(u8),

    /// Greeting carried no authentication methods
    #[error("Empty authentication method list")]
    NoMethods,

    /// Upstream selected a method other than username/password
    #[error("Upstream selected unexpected authentication method: {0:#04x}")]
    UnexpectedMethod(u8),

    /// Username/password sub-negotiation used the wrong version
    #[error("Unsupported authentication version: {0}")]
    UnsupportedAuthVersion(u8),

    /// Authentication failed
    #[error("Authentication failed with status {0:#04x}")]
    AuthFailed(u8),

    /// Username or password does not fit a single length byte
    #[error("{field} is too long: {len} bytes (max 255)")]
    CredentialTooLong {
        /// Which credential field overflowed
        field: &'static str,
        /// Its length in bytes
        len: usize,
    },

    /// Command not supported
    #[error("Command not supported: {0}")]
    CommandNotSupported(u8),

    /// Address type not supported
    #[error("Address type not supported: {0}")]
    AddressTypeNotSupported(u8),

    /// Invalid domain name
    #[error("Invalid domain name: {0}")]
    InvalidDomain(String),

    /// Upstream answered CONNECT with a failure reply
    #[error("CONNECT rejected by upstream: {0:?}")]
    ConnectRejected(Socks5ReplyCode),

    /// Upstream answered CONNECT with a reply code outside RFC 1928
    #[error("CONNECT rejected by upstream with unknown code {0:#04x}")]
    UnknownReply(u8),
}

/// Reply codes for SOCKS5 protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Socks5ReplyCode {
    /// Command succeeded
    Succeeded = 0x00,
    /// General SOCKS server failure
    GeneralFailure = 0x01,
    /// Connection not allowed by ruleset
    ConnectionNotAllowed = 0x02,
    /// Network unreachable
    NetworkUnreachable = 0x03,
    /// Host unreachable
    HostUnreachable = 0x04,
    /// Connection refused
    ConnectionRefused = 0x05,
    /// TTL expired
    TtlExpired = 0x06,
    /// Command not supported
    CommandNotSupported = 0x07,
    /// Address type not supported
    AddressTypeNotSupported = 0x08,
}

impl From<Socks5ReplyCode> for u8 {
    fn from(code: Socks5ReplyCode) -> Self {
        code as u8
    }
}

impl TryFrom<u8> for Socks5ReplyCode {
    type Error = Socks5Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Socks5ReplyCode::Succeeded),
            0x01 => Ok(Socks5ReplyCode::GeneralFailure),
            0x02 => Ok(Socks5ReplyCode::ConnectionNotAllowed),
            0x03 => Ok(Socks5ReplyCode::NetworkUnreachable),
            0x04 => Ok(Socks5ReplyCode::HostUnreachable),
            0x05 => Ok(Socks5ReplyCode::ConnectionRefused),
            0x06 => Ok(Socks5ReplyCode::TtlExpired),
            0x07 => Ok(Socks5ReplyCode::CommandNotSupported),
            0x08 => Ok(Socks5ReplyCode::AddressTypeNotSupported),
            other => Err(Socks5Error::UnknownReply(other)),
        }
    }
}

/// Result alias used across the library
pub type Result<T, E = RelayError> = std::result::Result<T, E>;
