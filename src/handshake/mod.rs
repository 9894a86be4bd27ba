//! TLS handshake driver.
//!
//! Opens a TCP connection to `(host, port)` and drives a `rustls` client
//! handshake to completion under one absolute deadline covering DNS, TCP
//! connect and the handshake itself.
//!
//! The handshake is not delegated to an opaque `connect().await`. It is an
//! explicit two-state machine over a non-blocking socket:
//! - `WaitingWritable`: flush pending TLS records, awaiting write readiness on
//!   `WouldBlock`
//! - `WaitingReadable`: read and process TLS records, awaiting read readiness
//!   on `WouldBlock`
//!
//! Every iteration checks the deadline, and every readiness wait is bounded by
//! it, so an unresponsive or filtering host costs at most its own budget.
//!
//! The socket and the `rustls` connection are owned by a single value. Every
//! exit path, including timeouts and protocol errors, drops both.

mod io;
mod verifier;

use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::Arc;

use log::{debug, trace};
use rustls::pki_types::{CertificateDer, ServerName};
use rustls::{ClientConfig, ClientConnection};
use tokio::io::Interest;
use tokio::net::{lookup_host, TcpStream};
use tokio::time::{timeout_at, Instant};

use crate::error_handling::FetchError;
use crate::models::FetchTask;

use io::NonBlockingIo;

pub use verifier::AcceptAnyServerCert;

/// Which direction the handshake is blocked on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    WaitingWritable,
    WaitingReadable,
}

impl HandshakeState {
    /// Pending outbound records always go first; otherwise the peer owes us data.
    fn of(conn: &ClientConnection) -> Self {
        if conn.wants_write() {
            HandshakeState::WaitingWritable
        } else {
            HandshakeState::WaitingReadable
        }
    }

    fn interest(self) -> Interest {
        match self {
            HandshakeState::WaitingWritable => Interest::WRITABLE,
            HandshakeState::WaitingReadable => Interest::READABLE,
        }
    }
}

/// An established TLS session, ready for chain extraction.
pub struct TlsSession {
    host: String,
    stream: TcpStream,
    conn: ClientConnection,
}

impl std::fmt::Debug for TlsSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsSession")
            .field("host", &self.host)
            .field("peer_addr", &self.stream.peer_addr().ok())
            .field("protocol_version", &self.conn.protocol_version())
            .finish()
    }
}

impl TlsSession {
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The certificates the peer presented, leaf first, exactly as sent.
    pub fn peer_certificates(&self) -> &[CertificateDer<'static>] {
        self.conn.peer_certificates().unwrap_or(&[])
    }

    /// Negotiated protocol version, e.g. `TLSv1_3`.
    pub fn protocol_version(&self) -> Option<String> {
        self.conn.protocol_version().map(|v| format!("{v:?}"))
    }

    /// Negotiated cipher suite, e.g. `TLS13_AES_128_GCM_SHA256`.
    pub fn cipher_suite(&self) -> Option<String> {
        self.conn
            .negotiated_cipher_suite()
            .map(|cs| format!("{:?}", cs.suite()))
    }

    /// Sends `close_notify` if the socket accepts it right away, then releases
    /// the connection. Never waits on the peer.
    pub fn close(mut self) {
        self.conn.send_close_notify();
        self.flush_best_effort();
    }

    /// Writes whatever records are queued without waiting for readiness.
    fn flush_best_effort(&mut self) {
        while self.conn.wants_write() {
            if self.conn.write_tls(&mut NonBlockingIo(&self.stream)).is_err() {
                break;
            }
        }
    }

    /// Drives the handshake state machine until it completes or `deadline` passes.
    async fn complete_handshake(
        &mut self,
        started: Instant,
        deadline: Instant,
    ) -> Result<(), FetchError> {
        while self.conn.is_handshaking() {
            if Instant::now() >= deadline {
                return Err(self.timeout_error(started));
            }

            let state = HandshakeState::of(&self.conn);
            let progressed = match state {
                HandshakeState::WaitingWritable => self.write_step()?,
                HandshakeState::WaitingReadable => self.read_step()?,
            };
            if progressed {
                continue;
            }

            trace!("{}: {:?}", self.host, state);
            match timeout_at(deadline, self.stream.ready(state.interest())).await {
                Ok(Ok(_)) => {}
                Ok(Err(source)) => {
                    return Err(FetchError::Io {
                        host: self.host.clone(),
                        source,
                    })
                }
                Err(_) => return Err(self.timeout_error(started)),
            }
        }

        // The client's final flight (e.g. TLS 1.3 Finished) is still queued
        self.flush_best_effort();
        Ok(())
    }

    /// One non-blocking write attempt. `Ok(false)` means the socket is not writable yet.
    fn write_step(&mut self) -> Result<bool, FetchError> {
        match self.conn.write_tls(&mut NonBlockingIo(&self.stream)) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(false),
            Err(source) => Err(FetchError::Io {
                host: self.host.clone(),
                source,
            }),
        }
    }

    /// One non-blocking read attempt. `Ok(false)` means no data has arrived yet.
    fn read_step(&mut self) -> Result<bool, FetchError> {
        match self.conn.read_tls(&mut NonBlockingIo(&self.stream)) {
            Ok(0) => Err(FetchError::PeerClosed {
                host: self.host.clone(),
            }),
            Ok(_) => match self.conn.process_new_packets() {
                Ok(_) => Ok(true),
                Err(source) => {
                    // Let the peer see our alert before the socket goes away
                    self.flush_best_effort();
                    Err(FetchError::Tls {
                        host: self.host.clone(),
                        source,
                    })
                }
            },
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(false),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Err(FetchError::PeerClosed {
                host: self.host.clone(),
            }),
            Err(source) => Err(FetchError::Io {
                host: self.host.clone(),
                source,
            }),
        }
    }

    fn timeout_error(&self, started: Instant) -> FetchError {
        FetchError::HandshakeTimeout {
            host: self.host.clone(),
            after: started.elapsed(),
        }
    }
}

/// Connects to `task.host:task.port` and completes a TLS handshake.
///
/// SNI is set to the hostname and peer verification is whatever `config`
/// carries (see `init_tls_config`). The whole call finishes within
/// `task.timeout` plus the scheduler's wake-up latency.
///
/// # Errors
///
/// Returns a connect-family `FetchError` (invalid name, DNS failure, refused,
/// reset, connect timeout) or a handshake-family one (`HandshakeTimeout`,
/// `Tls`, `PeerClosed`, `Io`). All of them are per-host and non-fatal.
pub async fn handshake(
    task: &FetchTask,
    config: Arc<ClientConfig>,
) -> Result<TlsSession, FetchError> {
    let started = Instant::now();
    let deadline = started + task.timeout;

    let server_name =
        ServerName::try_from(task.host.clone()).map_err(|_| FetchError::InvalidHostname {
            host: task.host.clone(),
        })?;

    let stream = connect(task, started, deadline).await?;

    let conn = ClientConnection::new(config, server_name).map_err(|source| FetchError::Tls {
        host: task.host.clone(),
        source,
    })?;

    let mut session = TlsSession {
        host: task.host.clone(),
        stream,
        conn,
    };
    session.complete_handshake(started, deadline).await?;

    debug!(
        "Handshake with {} complete in {:.2}s ({}, {})",
        task.host,
        started.elapsed().as_secs_f64(),
        session.protocol_version().as_deref().unwrap_or("unknown"),
        session.cipher_suite().as_deref().unwrap_or("unknown"),
    );
    Ok(session)
}

/// Resolves the host and connects to the first address that accepts.
///
/// Each address gets at most `task.connect_timeout`, and no attempt outlives
/// the task deadline.
async fn connect(
    task: &FetchTask,
    started: Instant,
    deadline: Instant,
) -> Result<TcpStream, FetchError> {
    let connect_timeout_error = || FetchError::ConnectTimeout {
        host: task.host.clone(),
        port: task.port,
        after: started.elapsed(),
    };

    let addrs: Vec<SocketAddr> =
        match timeout_at(deadline, lookup_host((task.host.as_str(), task.port))).await {
            Ok(Ok(addrs)) => addrs.collect(),
            Ok(Err(source)) => {
                return Err(FetchError::Resolve {
                    host: task.host.clone(),
                    source,
                })
            }
            Err(_) => return Err(connect_timeout_error()),
        };

    if addrs.is_empty() {
        return Err(FetchError::NoAddresses {
            host: task.host.clone(),
        });
    }

    let mut last_error = None;
    for addr in addrs {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        let attempt_deadline = deadline.min(now + task.connect_timeout);

        match timeout_at(attempt_deadline, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => {
                // Handshake flights are small; don't let Nagle hold them back
                let _ = stream.set_nodelay(true);
                return Ok(stream);
            }
            Ok(Err(e)) => {
                trace!("Connect to {} ({addr}) failed: {e}", task.host);
                last_error = Some(e);
            }
            Err(_) => {
                trace!("Connect to {} ({addr}) timed out", task.host);
            }
        }
    }

    match last_error {
        Some(source) => Err(FetchError::Connect {
            host: task.host.clone(),
            port: task.port,
            source,
        }),
        None => Err(connect_timeout_error()),
    }
}
