//! Client-facing SOCKS5 handshake
//!
//! The local listener speaks a deliberately small subset of SOCKS5: it
//! always selects "no authentication" and accepts only CONNECT.

use super::codec::{write_message, ConnectRequest, MethodRequest, MethodSelection, Reply};
use super::consts::SOCKS5_AUTH_METHOD_NONE;
use super::types::TargetAddr;
use crate::error::{RelayError, Result, Socks5Error, Socks5ReplyCode};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::trace;

/// Run the server side of the handshake and return the requested target
///
/// The "no authentication" method is selected whatever the client offers.
/// Protocol errors other than an unknown address type produce no reply and
/// the caller is expected to close the connection. For an unknown address
/// type an "address type not supported" reply is written first.
pub async fn accept_handshake<S>(stream: &mut S) -> Result<TargetAddr>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let greeting = MethodRequest::read_from(stream).await?;
    trace!("Client offered auth methods {:?}", greeting.methods);

    write_message(stream, &MethodSelection::new(SOCKS5_AUTH_METHOD_NONE).encode()).await?;

    match ConnectRequest::read_from(stream).await {
        Ok(request) => Ok(request.target),
        Err(RelayError::Socks5(Socks5Error::AddressTypeNotSupported(addr_type))) => {
            send_reply(stream, Socks5ReplyCode::AddressTypeNotSupported).await?;
            Err(Socks5Error::AddressTypeNotSupported(addr_type).into())
        }
        Err(e) => Err(e),
    }
}

/// Send a CONNECT reply with a `0.0.0.0:0` bound address
pub async fn send_reply<S>(stream: &mut S, code: Socks5ReplyCode) -> Result<()>
where
    S: AsyncWrite + Unpin,
{
    write_message(stream, &Reply::new(code).encode()?).await
}
