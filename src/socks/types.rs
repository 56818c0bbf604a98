//! SOCKS5 destination address
//!
//! The address carried in CONNECT requests and replies, with its wire
//! encoding.

use super::consts::*;
use crate::error::{Result, Socks5Error};
use bytes::{BufMut, BytesMut};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Target address for SOCKS5 requests
///
/// Either an IP socket address or an unresolved domain name with a port.
/// Domain names are never resolved locally; the upstream proxy does that.
/// The name is kept as the raw bytes the client sent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TargetAddr {
    /// IP address with port
    Ip(SocketAddr),
    /// Domain name bytes with port
    Domain(Vec<u8>, u16),
}

impl TargetAddr {
    /// Create a new TargetAddr from an IPv4 address and port
    pub fn ipv4(ip: Ipv4Addr, port: u16) -> Self {
        TargetAddr::Ip(SocketAddr::new(IpAddr::V4(ip), port))
    }

    /// Create a new TargetAddr from an IPv6 address and port
    pub fn ipv6(ip: Ipv6Addr, port: u16) -> Self {
        TargetAddr::Ip(SocketAddr::new(IpAddr::V6(ip), port))
    }

    /// Create a new TargetAddr from a domain name and port
    pub fn domain(domain: impl Into<Vec<u8>>, port: u16) -> Self {
        TargetAddr::Domain(domain.into(), port)
    }

    /// Get the port number
    pub fn port(&self) -> u16 {
        match self {
            TargetAddr::Ip(addr) => addr.port(),
            TargetAddr::Domain(_, port) => *port,
        }
    }

    /// Get the address type byte for the SOCKS5 protocol
    pub fn addr_type(&self) -> u8 {
        match self {
            TargetAddr::Ip(SocketAddr::V4(_)) => SOCKS5_ADDR_TYPE_IPV4,
            TargetAddr::Ip(SocketAddr::V6(_)) => SOCKS5_ADDR_TYPE_IPV6,
            TargetAddr::Domain(_, _) => SOCKS5_ADDR_TYPE_DOMAIN,
        }
    }

    /// Normalise IP literals before forwarding
    ///
    /// A UTF-8 domain that spells an IP literal becomes an IP address:
    /// `"10.0.0.1"` becomes `Ip(10.0.0.1)` and `"::1"` (or `"[::1]"`) becomes
    /// `Ip(::1)`. IPv4-mapped IPv6 addresses (`::ffff:a.b.c.d`) become plain
    /// IPv4. Everything else is returned unchanged.
    pub fn with_literal_ip(self) -> Self {
        match self {
            TargetAddr::Ip(addr) => {
                TargetAddr::Ip(SocketAddr::new(unmap_ipv4(addr.ip()), addr.port()))
            }
            TargetAddr::Domain(domain, port) => {
                let literal = std::str::from_utf8(&domain).ok().and_then(|name| {
                    let name = name
                        .strip_prefix('[')
                        .and_then(|d| d.strip_suffix(']'))
                        .unwrap_or(name);
                    name.parse::<IpAddr>().ok()
                });
                match literal {
                    Some(ip) => TargetAddr::Ip(SocketAddr::new(unmap_ipv4(ip), port)),
                    None => TargetAddr::Domain(domain, port),
                }
            }
        }
    }

    /// Number of bytes `write_to_buf` produces
    pub fn encoded_len(&self) -> usize {
        match self {
            TargetAddr::Ip(SocketAddr::V4(_)) => 1 + 4 + 2,
            TargetAddr::Ip(SocketAddr::V6(_)) => 1 + 16 + 2,
            TargetAddr::Domain(domain, _) => 1 + 1 + domain.len() + 2,
        }
    }

    /// Append `ATYP | ADDR | PORT` to `buf`
    ///
    /// Domain bytes are written exactly as stored. Fails when a domain does
    /// not fit a single length byte.
    pub fn write_to_buf(&self, buf: &mut BytesMut) -> Result<()> {
        if let TargetAddr::Domain(domain, _) = self {
            if domain.len() > MAX_FIELD_LEN {
                return Err(
                    Socks5Error::InvalidDomain(String::from_utf8_lossy(domain).into_owned()).into(),
                );
            }
        }

        buf.reserve(self.encoded_len());
        buf.put_u8(self.addr_type());
        match self {
            TargetAddr::Ip(SocketAddr::V4(addr)) => buf.put_slice(&addr.ip().octets()),
            TargetAddr::Ip(SocketAddr::V6(addr)) => buf.put_slice(&addr.ip().octets()),
            TargetAddr::Domain(domain, _) => {
                buf.put_u8(domain.len() as u8);
                buf.put_slice(domain);
            }
        }
        buf.put_u16(self.port());
        Ok(())
    }

    /// Read `ADDR | PORT` for an already consumed address type byte
    ///
    /// Domain names are taken as opaque octets, empty ones included.
    pub async fn read_from<R>(reader: &mut R, addr_type: u8) -> Result<Self>
    where
        R: AsyncRead + Unpin,
    {
        match addr_type {
            SOCKS5_ADDR_TYPE_IPV4 => {
                let mut octets = [0u8; 4];
                reader.read_exact(&mut octets).await?;
                let port = reader.read_u16().await?;
                Ok(TargetAddr::ipv4(Ipv4Addr::from(octets), port))
            }
            SOCKS5_ADDR_TYPE_IPV6 => {
                let mut octets = [0u8; 16];
                reader.read_exact(&mut octets).await?;
                let port = reader.read_u16().await?;
                Ok(TargetAddr::ipv6(Ipv6Addr::from(octets), port))
            }
            SOCKS5_ADDR_TYPE_DOMAIN => {
                let len = reader.read_u8().await? as usize;
                let mut domain = vec![0u8; len];
                reader.read_exact(&mut domain).await?;
                let port = reader.read_u16().await?;
                Ok(TargetAddr::Domain(domain, port))
            }
            other => Err(Socks5Error::AddressTypeNotSupported(other).into()),
        }
    }
}

fn unmap_ipv4(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map_or(ip, IpAddr::V4),
        v4 => v4,
    }
}

impl Default for TargetAddr {
    fn default() -> Self {
        TargetAddr::ipv4(Ipv4Addr::UNSPECIFIED, 0)
    }
}

impl From<SocketAddr> for TargetAddr {
    fn from(addr: SocketAddr) -> Self {
        TargetAddr::Ip(addr)
    }
}

impl fmt::Display for TargetAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetAddr::Ip(addr) => write!(f, "{}", addr),
            TargetAddr::Domain(domain, port) => {
                write!(f, "{}:{}", String::from_utf8_lossy(domain), port)
            }
        }
    }
}
