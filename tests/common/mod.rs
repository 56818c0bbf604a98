//! Test utilities and mocks for Resocks
//!
//! This module provides a mock upstream SOCKS5 proxy and client helpers
//! used across integration tests.

#![allow(dead_code)]

use resocks::config::{RelayConfig, Settings, TcpConfig};
use resocks::socks::{
    MethodRequest, MethodSelection, PasswordReply, PasswordRequest, TargetAddr,
    SOCKS5_ADDR_TYPE_DOMAIN, SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE, SOCKS5_AUTH_METHOD_PASSWORD,
};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// Username accepted by the mock upstream
pub const USERNAME: &str = "alice";
/// Password accepted by the mock upstream
pub const PASSWORD: &str = "s3cret";

/// What the mock upstream does once CONNECT has been requested
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Reply success and echo tunnel data
    Echo,
    /// Reply with this failure code
    Reject(u8),
    /// Reply success, send these bytes and close
    SendAndClose(Vec<u8>),
}

/// In-process upstream SOCKS5 proxy requiring username/password
pub struct MockUpstream {
    /// Address the mock listens on
    pub addr: SocketAddr,
    connections: Arc<AtomicUsize>,
    targets: Arc<Mutex<Vec<TargetAddr>>>,
    task: JoinHandle<()>,
}

impl MockUpstream {
    /// Echoing upstream accepting [`USERNAME`] / [`PASSWORD`]
    pub async fn start() -> Self {
        Self::with_behavior(Behavior::Echo).await
    }

    /// Upstream accepting the default credentials with a custom behavior
    pub async fn with_behavior(behavior: Behavior) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let connections = Arc::new(AtomicUsize::new(0));
        let targets = Arc::new(Mutex::new(Vec::new()));

        let task = tokio::spawn({
            let connections = Arc::clone(&connections);
            let targets = Arc::clone(&targets);
            async move {
                loop {
                    let Ok((stream, _)) = listener.accept().await else {
                        break;
                    };
                    connections.fetch_add(1, Ordering::SeqCst);
                    let targets = Arc::clone(&targets);
                    let behavior = behavior.clone();
                    tokio::spawn(async move {
                        let _ = handle_upstream(stream, targets, behavior).await;
                    });
                }
            }
        });

        MockUpstream {
            addr,
            connections,
            targets,
            task,
        }
    }

    /// Number of TCP connections accepted so far
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// CONNECT targets received so far
    pub fn targets(&self) -> Vec<TargetAddr> {
        self.targets.lock().unwrap().clone()
    }

    /// Settings pointing at this mock with the given credentials
    pub fn settings(&self, username: &str, password: &str) -> Settings {
        Settings {
            enabled: false,
            server_address: self.addr.ip().to_string(),
            server_port: self.addr.port(),
            server_login: username.to_string(),
            server_password: password.to_string(),
        }
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn handle_upstream(
    mut stream: TcpStream,
    targets: Arc<Mutex<Vec<TargetAddr>>>,
    behavior: Behavior,
) -> resocks::error::Result<()> {
    let greeting = MethodRequest::read_from(&mut stream).await?;
    if !greeting.offers(SOCKS5_AUTH_METHOD_PASSWORD) {
        stream
            .write_all(&MethodSelection::new(SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE).encode())
            .await?;
        return Ok(());
    }
    stream
        .write_all(&MethodSelection::new(SOCKS5_AUTH_METHOD_PASSWORD).encode())
        .await?;

    let auth = PasswordRequest::read_from(&mut stream).await?;
    let accepted = auth.username == USERNAME && auth.password == PASSWORD;
    let status = if accepted { 0x00 } else { 0x01 };
    stream.write_all(&PasswordReply::new(status).encode()).await?;
    if !accepted {
        return Ok(());
    }

    let mut header = [0u8; 4];
    stream.read_exact(&mut header).await?;
    let target = TargetAddr::read_from(&mut stream, header[3]).await?;
    targets.lock().unwrap().push(target);

    match behavior {
        Behavior::Echo => {
            // Domain bound address, exercises the variable-length skip
            let mut reply = vec![0x05, 0x00, 0x00, SOCKS5_ADDR_TYPE_DOMAIN, 4];
            reply.extend_from_slice(b"mock");
            reply.extend_from_slice(&[0x04, 0x38]);
            stream.write_all(&reply).await?;

            let (mut r, mut w) = stream.split();
            let _ = tokio::io::copy(&mut r, &mut w).await;
        }
        Behavior::Reject(code) => {
            stream
                .write_all(&[0x05, code, 0x00, 0x01, 0, 0, 0, 0, 0, 0])
                .await?;
        }
        Behavior::SendAndClose(data) => {
            stream
                .write_all(&[0x05, 0x00, 0x00, 0x01, 0, 0, 0, 0, 0, 0])
                .await?;
            stream.write_all(&data).await?;
            stream.shutdown().await?;
        }
    }
    Ok(())
}

/// Relay config on an ephemeral loopback port
///
/// Linger is left at the OS default so closes send FIN rather than RST
/// and tests can read everything that was sent before a close.
pub fn relay_config() -> RelayConfig {
    RelayConfig {
        listen_addr: "127.0.0.1:0".parse().unwrap(),
        buffer_size: 64 * 1024,
        max_idle_buffers: 4,
        tcp: TcpConfig {
            no_linger: false,
            recv_buffer_size: 0,
            send_buffer_size: 0,
            ..Default::default()
        },
        ..Default::default()
    }
}

/// CONNECT request bytes for a domain target
pub fn connect_domain(domain: &str, port: u16) -> Vec<u8> {
    let mut request = vec![0x05, 0x01, 0x00, 0x03, domain.len() as u8];
    request.extend_from_slice(domain.as_bytes());
    request.extend_from_slice(&port.to_be_bytes());
    request
}

/// CONNECT request bytes for an IPv4 target
pub fn connect_ipv4(octets: [u8; 4], port: u16) -> Vec<u8> {
    let mut request = vec![0x05, 0x01, 0x00, 0x01];
    request.extend_from_slice(&octets);
    request.extend_from_slice(&port.to_be_bytes());
    request
}

/// Run the client side of the handshake against the relay
///
/// Returns the stream and the 10-byte CONNECT reply.
pub async fn socks5_connect(relay: SocketAddr, request: &[u8]) -> (TcpStream, [u8; 10]) {
    let mut stream = TcpStream::connect(relay).await.unwrap();

    stream.write_all(&[0x05, 0x01, 0x00]).await.unwrap();
    let mut selection = [0u8; 2];
    stream.read_exact(&mut selection).await.unwrap();
    assert_eq!(selection, [0x05, 0x00]);

    stream.write_all(request).await.unwrap();
    let mut reply = [0u8; 10];
    stream.read_exact(&mut reply).await.unwrap();
    (stream, reply)
}

/// Read until EOF or reset, returning what arrived
pub async fn read_to_close(stream: &mut TcpStream) -> Vec<u8> {
    let mut data = Vec::new();
    let mut buf = [0u8; 1024];
    loop {
        match tokio::time::timeout(Duration::from_secs(5), stream.read(&mut buf)).await {
            Ok(Ok(0)) | Ok(Err(_)) => break,
            Ok(Ok(n)) => data.extend_from_slice(&buf[..n]),
            Err(_) => panic!("connection was not closed"),
        }
    }
    data
}

/// Reply bytes for success
pub const REPLY_SUCCEEDED: [u8; 10] = [0x05, 0x00, 0x00, 0x01, 0, 0, 0, 0, 0, 0];
/// Reply bytes for a failed upstream connect
pub const REPLY_HOST_UNREACHABLE: [u8; 10] = [0x05, 0x04, 0x00, 0x01, 0, 0, 0, 0, 0, 0];
/// Reply bytes for an unsupported address type
pub const REPLY_ADDR_TYPE_NOT_SUPPORTED: [u8; 10] = [0x05, 0x08, 0x00, 0x01, 0, 0, 0, 0, 0, 0];
