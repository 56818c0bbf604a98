//! SOCKS5 wire constants (RFC 1928 and RFC 1929)

/// SOCKS protocol version
pub const SOCKS5_VERSION: u8 = 0x05;

/// Username/password sub-negotiation version
pub const SOCKS5_AUTH_VERSION: u8 = 0x01;

// Authentication methods
/// No authentication required
pub const SOCKS5_AUTH_METHOD_NONE: u8 = 0x00;
/// Username/password authentication
pub const SOCKS5_AUTH_METHOD_PASSWORD: u8 = 0x02;
/// No acceptable methods
pub const SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE: u8 = 0xFF;

/// Username/password status for success
pub const SOCKS5_AUTH_STATUS_SUCCESS: u8 = 0x00;

/// TCP CONNECT, the only command relayed
pub const SOCKS5_CMD_TCP_CONNECT: u8 = 0x01;

// Address types
/// IPv4 address
pub const SOCKS5_ADDR_TYPE_IPV4: u8 = 0x01;
/// Domain name
pub const SOCKS5_ADDR_TYPE_DOMAIN: u8 = 0x03;
/// IPv6 address
pub const SOCKS5_ADDR_TYPE_IPV6: u8 = 0x04;

/// Reserved byte value
pub const SOCKS5_RESERVED: u8 = 0x00;

/// Longest value a single length byte can carry
pub const MAX_FIELD_LEN: usize = u8::MAX as usize;
