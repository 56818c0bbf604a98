//! SOCKS5 wire messages
//!
//! Each message of the RFC 1928 / RFC 1929 exchange is a small struct with
//! named fields, an `encode` into a [`BytesMut`] and a `read_from` that
//! decodes it from an async reader. Decoders validate version bytes and
//! return [`Socks5Error`]s; short reads surface as I/O errors.

use super::consts::*;
use super::types::TargetAddr;
use crate::config::Credentials;
use crate::error::{Result, Socks5Error, Socks5ReplyCode};
use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Write an encoded message and flush it
pub async fn write_message<W>(writer: &mut W, buf: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(buf).await?;
    writer.flush().await?;
    Ok(())
}

/// Method negotiation greeting
///
/// ```text
/// +----+----------+----------+
/// |VER | NMETHODS | METHODS  |
/// +----+----------+----------+
/// | 1  |    1     | 1 to 255 |
/// +----+----------+----------+
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodRequest {
    /// Offered authentication methods
    pub methods: Vec<u8>,
}

impl MethodRequest {
    /// Greeting offering a single method
    pub fn single(method: u8) -> Self {
        MethodRequest {
            methods: vec![method],
        }
    }

    /// Whether `method` is among the offered methods
    pub fn offers(&self, method: u8) -> bool {
        self.methods.contains(&method)
    }

    /// Encode the greeting
    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(2 + self.methods.len());
        buf.put_u8(SOCKS5_VERSION);
        buf.put_u8(self.methods.len() as u8);
        buf.put_slice(&self.methods);
        buf
    }

    /// Read a greeting, rejecting other versions and empty method lists
    pub async fn read_from<R>(reader: &mut R) -> Result<Self>
    where
        R: AsyncRead + Unpin,
    {
        let mut header = [0u8; 2];
        reader.read_exact(&mut header).await?;

        if header[0] != SOCKS5_VERSION {
            return Err(Socks5Error::UnsupportedVersion(header[0]).into());
        }
        if header[1] == 0 {
            return Err(Socks5Error::NoMethods.into());
        }

        let mut methods = vec![0u8; header[1] as usize];
        reader.read_exact(&mut methods).await?;
        Ok(MethodRequest { methods })
    }
}

/// Method selected by the server: `VER | METHOD`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodSelection {
    /// Selected authentication method
    pub method: u8,
}

impl MethodSelection {
    /// Selection of `method`
    pub fn new(method: u8) -> Self {
        MethodSelection { method }
    }

    /// Encode the selection
    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(2);
        buf.put_u8(SOCKS5_VERSION);
        buf.put_u8(self.method);
        buf
    }

    /// Read a selection
    pub async fn read_from<R>(reader: &mut R) -> Result<Self>
    where
        R: AsyncRead + Unpin,
    {
        let mut buf = [0u8; 2];
        reader.read_exact(&mut buf).await?;

        if buf[0] != SOCKS5_VERSION {
            return Err(Socks5Error::UnsupportedVersion(buf[0]).into());
        }
        Ok(MethodSelection { method: buf[1] })
    }
}

/// Username/password request (RFC 1929)
///
/// ```text
/// +----+------+----------+------+----------+
/// |VER | ULEN |  UNAME   | PLEN |  PASSWD  |
/// +----+------+----------+------+----------+
/// | 1  |  1   | 0 to 255 |  1   | 0 to 255 |
/// +----+------+----------+------+----------+
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordRequest {
    /// Username
    pub username: String,
    /// Password
    pub password: String,
}

impl PasswordRequest {
    /// Build a request, failing when either field exceeds 255 bytes
    pub fn new(credentials: &Credentials) -> Result<Self> {
        check_field_len("username", &credentials.username)?;
        check_field_len("password", &credentials.password)?;
        Ok(PasswordRequest {
            username: credentials.username.clone(),
            password: credentials.password.clone(),
        })
    }

    /// Encode the request
    pub fn encode(&self) -> Result<BytesMut> {
        check_field_len("username", &self.username)?;
        check_field_len("password", &self.password)?;

        let mut buf = BytesMut::with_capacity(3 + self.username.len() + self.password.len());
        buf.put_u8(SOCKS5_AUTH_VERSION);
        buf.put_u8(self.username.len() as u8);
        buf.put_slice(self.username.as_bytes());
        buf.put_u8(self.password.len() as u8);
        buf.put_slice(self.password.as_bytes());
        Ok(buf)
    }

    /// Read a request
    pub async fn read_from<R>(reader: &mut R) -> Result<Self>
    where
        R: AsyncRead + Unpin,
    {
        let version = reader.read_u8().await?;
        if version != SOCKS5_AUTH_VERSION {
            return Err(Socks5Error::UnsupportedAuthVersion(version).into());
        }

        let username = read_short_string(reader).await?;
        let password = read_short_string(reader).await?;
        Ok(PasswordRequest { username, password })
    }
}

impl std::fmt::Debug for PasswordRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Username/password status: `VER | STATUS`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordReply {
    /// Zero on success
    pub status: u8,
}

impl PasswordReply {
    /// Reply with `status`
    pub fn new(status: u8) -> Self {
        PasswordReply { status }
    }

    /// Whether authentication succeeded
    pub fn is_success(&self) -> bool {
        self.status == SOCKS5_AUTH_STATUS_SUCCESS
    }

    /// Encode the reply
    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(2);
        buf.put_u8(SOCKS5_AUTH_VERSION);
        buf.put_u8(self.status);
        buf
    }

    /// Read a reply
    ///
    /// Only the status byte is interpreted; some proxies answer with the
    /// SOCKS version in the first byte.
    pub async fn read_from<R>(reader: &mut R) -> Result<Self>
    where
        R: AsyncRead + Unpin,
    {
        let mut buf = [0u8; 2];
        reader.read_exact(&mut buf).await?;
        Ok(PasswordReply { status: buf[1] })
    }
}

/// CONNECT request
///
/// ```text
/// +----+-----+-------+------+----------+----------+
/// |VER | CMD |  RSV  | ATYP | DST.ADDR | DST.PORT |
/// +----+-----+-------+------+----------+----------+
/// | 1  |  1  | X'00' |  1   | Variable |    2     |
/// +----+-----+-------+------+----------+----------+
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectRequest {
    /// Destination
    pub target: TargetAddr,
}

impl ConnectRequest {
    /// CONNECT to `target`
    pub fn new(target: TargetAddr) -> Self {
        ConnectRequest { target }
    }

    /// Encode the request
    pub fn encode(&self) -> Result<BytesMut> {
        let mut buf = BytesMut::with_capacity(3 + self.target.encoded_len());
        buf.put_u8(SOCKS5_VERSION);
        buf.put_u8(SOCKS5_CMD_TCP_CONNECT);
        buf.put_u8(SOCKS5_RESERVED);
        self.target.write_to_buf(&mut buf)?;
        Ok(buf)
    }

    /// Read a request
    ///
    /// Version and command are checked before the address type, so an
    /// unknown address type is reported as
    /// [`Socks5Error::AddressTypeNotSupported`] only for well-formed
    /// CONNECT requests.
    pub async fn read_from<R>(reader: &mut R) -> Result<Self>
    where
        R: AsyncRead + Unpin,
    {
        let mut header = [0u8; 4];
        reader.read_exact(&mut header).await?;

        let [version, command, _reserved, addr_type] = header;
        if version != SOCKS5_VERSION {
            return Err(Socks5Error::UnsupportedVersion(version).into());
        }
        if command != SOCKS5_CMD_TCP_CONNECT {
            return Err(Socks5Error::CommandNotSupported(command).into());
        }

        let target = TargetAddr::read_from(reader, addr_type).await?;
        Ok(ConnectRequest { target })
    }
}

/// Reply to a CONNECT request
///
/// ```text
/// +----+-----+-------+------+----------+----------+
/// |VER | REP |  RSV  | ATYP | BND.ADDR | BND.PORT |
/// +----+-----+-------+------+----------+----------+
/// | 1  |  1  | X'00' |  1   | Variable |    2     |
/// +----+-----+-------+------+----------+----------+
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Reply code
    pub code: Socks5ReplyCode,
    /// Bound address
    pub bound: TargetAddr,
}

impl Reply {
    /// Reply with `code` and a `0.0.0.0:0` bound address
    pub fn new(code: Socks5ReplyCode) -> Self {
        Reply {
            code,
            bound: TargetAddr::default(),
        }
    }

    /// Encode the reply
    pub fn encode(&self) -> Result<BytesMut> {
        let mut buf = BytesMut::with_capacity(3 + self.bound.encoded_len());
        buf.put_u8(SOCKS5_VERSION);
        buf.put_u8(self.code.into());
        buf.put_u8(SOCKS5_RESERVED);
        self.bound.write_to_buf(&mut buf)?;
        Ok(buf)
    }

    /// Read a successful reply
    ///
    /// A failure code is returned as [`Socks5Error::ConnectRejected`] as soon
    /// as the header is read, without waiting for the bound address. The
    /// bound address of a successful reply is consumed in full.
    pub async fn read_from<R>(reader: &mut R) -> Result<Self>
    where
        R: AsyncRead + Unpin,
    {
        let mut header = [0u8; 4];
        reader.read_exact(&mut header).await?;

        let [version, code, _reserved, addr_type] = header;
        if version != SOCKS5_VERSION {
            return Err(Socks5Error::UnsupportedVersion(version).into());
        }
        let code = Socks5ReplyCode::try_from(code)?;
        if code != Socks5ReplyCode::Succeeded {
            return Err(Socks5Error::ConnectRejected(code).into());
        }

        let bound = TargetAddr::read_from(reader, addr_type).await?;
        Ok(Reply { code, bound })
    }
}

fn check_field_len(field: &'static str, value: &str) -> Result<()> {
    if value.len() > MAX_FIELD_LEN {
        return Err(Socks5Error::CredentialTooLong {
            field,
            len: value.len(),
        }
        .into());
    }
    Ok(())
}

async fn read_short_string<R>(reader: &mut R) -> Result<String>
where
    R: AsyncRead + Unpin,
{
    let len = reader.read_u8().await? as usize;
    let mut raw = vec![0u8; len];
    reader.read_exact(&mut raw).await?;
    Ok(String::from_utf8_lossy(&raw).into_owned())
}
