//! Session engine: connection lifecycle and pending-request correlation.
//!
//! A [`Session`] owns one TLS connection. All connection state (the write
//! half, the buffered read half, the FIFO queue of waiters) lives on a
//! single spawned task; callers talk to it over an mpsc channel and suspend
//! on a oneshot waiter per command. The wire protocol has no correlation
//! identifier, so responses are matched positionally: the order requests are
//! written must equal the order responses are read, and only the session
//! task ever writes, which is what keeps queue-append and wire-write atomic
//! with respect to concurrent dispatchers.
//!
//! The login handshake is the one synchronous exception: `connect` writes
//! `login` and reads exactly one response inline, before the session task
//! exists and before any dispatch is accepted.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use rustls::pki_types::ServerName;
use serde_json::{Value, json};
use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, ReadHalf, WriteHalf,
};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_rustls::TlsConnector;
use tracing::{debug, warn};

use crate::codec::{self, Message};
use crate::config::{PROTOCOL_VERSION, SessionConfig};
use crate::error::SessionError;

/// Waiter resolving one dispatched command.
type ReplyTx = oneshot::Sender<Result<Message, SessionError>>;

/// Commands accepted by the session task.
enum SessionCommand {
    /// Write one framed command and enqueue its waiter.
    Dispatch {
        command: String,
        args: Value,
        reply_tx: ReplyTx,
    },
    /// Tear down the transport, failing queued waiters with `Closed`.
    Close { ack_tx: oneshot::Sender<()> },
}

/// Why a session stopped. Recorded so dispatch calls made after the fact
/// report the original fault instead of a generic channel error.
#[derive(Clone, Debug)]
enum SessionFault {
    Closed,
    ConnectionLost(String),
    Desynchronized,
}

impl SessionFault {
    fn to_error(&self) -> SessionError {
        match self {
            Self::Closed => SessionError::Closed,
            Self::ConnectionLost(reason) => SessionError::ConnectionLost {
                reason: reason.clone(),
            },
            Self::Desynchronized => SessionError::Desynchronized,
        }
    }
}

#[derive(Debug)]
struct SessionShared {
    cmd_tx: mpsc::Sender<SessionCommand>,
    /// Written once by the session task as it exits; read by handles.
    fault: Arc<RwLock<Option<SessionFault>>>,
    _task: JoinHandle<()>,
}

/// Handle to one live session. Cheap to clone; all clones address the same
/// connection, and the connection shuts down when the last clone is dropped.
#[derive(Clone, Debug)]
pub struct Session {
    inner: Arc<SessionShared>,
}

impl Session {
    /// Connect to the configured endpoint, run the login handshake, and
    /// switch the connection into event-driven delivery.
    ///
    /// Any connect, TLS, or handshake failure means no session exists; no
    /// retry is attempted.
    pub async fn connect(config: SessionConfig) -> Result<Self, SessionError> {
        let tcp = TcpStream::connect((config.host.as_str(), config.port)).await?;
        let server_name =
            ServerName::try_from(config.host.clone()).map_err(|_| SessionError::ServerName {
                host: config.host.clone(),
            })?;
        let tls = tls_connector().connect(server_name, tcp).await?;
        Self::handshake(tls, &config).await
    }

    /// Run the login handshake over an already-established stream and start
    /// the session task.
    ///
    /// [`Session::connect`] calls this with the TLS stream; it is public so
    /// alternative transports (and the integration tests, which drive an
    /// in-memory duplex stream) can reuse the whole session engine.
    pub async fn handshake<S>(stream: S, config: &SessionConfig) -> Result<Self, SessionError>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (read_half, mut write_half) = tokio::io::split(stream);
        let mut reader = BufReader::new(read_half);

        write_frame(&mut write_half, &codec::encode("login", &login_payload(config))).await?;

        // Exactly one synchronous read: nothing else is in flight yet, so
        // this response cannot belong to anyone but the handshake.
        let mut frame = Vec::new();
        let _ = reader.read_until(codec::TERMINATOR, &mut frame).await?;
        if !frame.ends_with(&[codec::TERMINATOR]) {
            return Err(SessionError::Handshake {
                reason: "connection closed before the login response".into(),
            });
        }
        match codec::decode(&frame) {
            // Any well-formed response counts as a successful login; the
            // server's verdict is recorded but not interpreted.
            Ok(response) => debug!(keyword = %response.keyword, "login response received"),
            Err(err) => {
                return Err(SessionError::Handshake {
                    reason: err.to_string(),
                });
            }
        }

        let (cmd_tx, cmd_rx) = mpsc::channel(64);
        let fault = Arc::new(RwLock::new(None));
        let task = tokio::spawn(session_task(reader, write_half, cmd_rx, Arc::clone(&fault)));

        Ok(Self {
            inner: Arc::new(SessionShared {
                cmd_tx,
                fault,
                _task: task,
            }),
        })
    }

    /// Send one command and wait for its response.
    ///
    /// Callable concurrently from any number of tasks; each caller suspends
    /// only on its own waiter, so a slow response never blocks further
    /// dispatches. There is no timeout: a command whose response never
    /// arrives waits until the session fails or is closed.
    pub async fn dispatch(
        &self,
        command: impl Into<String>,
        args: Value,
    ) -> Result<Message, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let sent = self
            .inner
            .cmd_tx
            .send(SessionCommand::Dispatch {
                command: command.into(),
                args,
                reply_tx,
            })
            .await;
        if sent.is_err() {
            return Err(self.fault_error());
        }
        match reply_rx.await {
            Ok(result) => result,
            Err(_) => Err(self.fault_error()),
        }
    }

    /// Tear down the connection. Waiters still queued are resolved with
    /// [`SessionError::Closed`]. Closing an already-dead session is a no-op.
    pub async fn close(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self
            .inner
            .cmd_tx
            .send(SessionCommand::Close { ack_tx })
            .await
            .is_ok()
        {
            let _ = ack_rx.await;
        }
    }

    /// The fault that stopped this session, if it has stopped.
    pub fn fault(&self) -> Option<SessionError> {
        self.inner.fault.read().as_ref().map(SessionFault::to_error)
    }

    /// Whether the session still accepts commands.
    pub fn is_alive(&self) -> bool {
        !self.inner.cmd_tx.is_closed()
    }

    fn fault_error(&self) -> SessionError {
        self.fault().unwrap_or(SessionError::Closed)
    }
}

/// The session task: single owner of the transport and the waiter queue.
async fn session_task<S>(
    mut reader: BufReader<ReadHalf<S>>,
    mut writer: WriteHalf<S>,
    mut cmd_rx: mpsc::Receiver<SessionCommand>,
    fault: Arc<RwLock<Option<SessionFault>>>,
) where
    S: AsyncRead + AsyncWrite,
{
    let mut pending: VecDeque<ReplyTx> = VecDeque::new();
    let mut inbound = Vec::new();

    let terminal = loop {
        tokio::select! {
            cmd = cmd_rx.recv() => match cmd {
                Some(SessionCommand::Dispatch { command, args, reply_tx }) => {
                    // Queue-append and wire-write form one atomic unit:
                    // nothing else runs on this task between them, and this
                    // task is the only writer.
                    let frame = codec::encode(&command, &args);
                    pending.push_back(reply_tx);
                    if let Err(err) = write_frame(&mut writer, &frame).await {
                        let reason = err.to_string();
                        warn!(error = %reason, "write failed, failing session");
                        fail_all(&mut pending, || SessionError::ConnectionLost {
                            reason: reason.clone(),
                        });
                        break SessionFault::ConnectionLost(reason);
                    }
                }
                Some(SessionCommand::Close { ack_tx }) => {
                    fail_all(&mut pending, || SessionError::Closed);
                    let _ = ack_tx.send(());
                    break SessionFault::Closed;
                }
                // Every handle dropped: same teardown as an explicit close.
                None => {
                    fail_all(&mut pending, || SessionError::Closed);
                    break SessionFault::Closed;
                }
            },
            read = reader.read_until(codec::TERMINATOR, &mut inbound) => {
                match read {
                    Ok(_) if inbound.ends_with(&[codec::TERMINATOR]) => {
                        let result = codec::decode(&inbound).map_err(SessionError::from);
                        inbound.clear();
                        match pending.pop_front() {
                            // A decode failure resolves this waiter and only
                            // this waiter; the session itself is still in sync.
                            Some(reply_tx) => { let _ = reply_tx.send(result); }
                            None => {
                                match result {
                                    Ok(msg) => warn!(
                                        keyword = %msg.keyword,
                                        "response with no request outstanding"
                                    ),
                                    Err(err) => warn!(
                                        error = %err,
                                        "undecodable response with no request outstanding"
                                    ),
                                }
                                break SessionFault::Desynchronized;
                            }
                        }
                    }
                    // EOF, or EOF in the middle of a frame.
                    Ok(_) => {
                        let reason = "server closed the connection".to_string();
                        fail_all(&mut pending, || SessionError::ConnectionLost {
                            reason: reason.clone(),
                        });
                        break SessionFault::ConnectionLost(reason);
                    }
                    Err(err) => {
                        let reason = err.to_string();
                        warn!(error = %reason, "read failed, failing session");
                        fail_all(&mut pending, || SessionError::ConnectionLost {
                            reason: reason.clone(),
                        });
                        break SessionFault::ConnectionLost(reason);
                    }
                }
            }
        }
    };

    let _ = writer.shutdown().await;

    // Record the fault before rejecting stragglers, so a sender that loses
    // the race sees the real reason rather than a bare channel error.
    *fault.write() = Some(terminal.clone());
    cmd_rx.close();
    while let Ok(cmd) = cmd_rx.try_recv() {
        match cmd {
            SessionCommand::Dispatch { reply_tx, .. } => {
                let _ = reply_tx.send(Err(terminal.to_error()));
            }
            SessionCommand::Close { ack_tx } => {
                let _ = ack_tx.send(());
            }
        }
    }
}

/// Resolve every queued waiter with an error.
fn fail_all(pending: &mut VecDeque<ReplyTx>, error: impl Fn() -> SessionError) {
    for reply_tx in pending.drain(..) {
        let _ = reply_tx.send(Err(error()));
    }
}

async fn write_frame<W>(writer: &mut W, frame: &[u8]) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(frame).await?;
    writer.flush().await
}

/// The fixed login object, with credentials merged in only when present.
fn login_payload(config: &SessionConfig) -> Value {
    let mut payload = serde_json::Map::new();
    let _ = payload.insert("protocol".into(), json!(PROTOCOL_VERSION));
    let _ = payload.insert("client".into(), json!(config.client));
    let _ = payload.insert("clientver".into(), json!(config.clientver));
    if let Some(credentials) = &config.credentials {
        let _ = payload.insert("username".into(), json!(credentials.username));
        let _ = payload.insert("password".into(), json!(credentials.password));
    }
    Value::Object(payload)
}

/// Shared TLS client configuration (webpki roots, no client auth).
fn tls_connector() -> TlsConnector {
    static CONFIG: OnceLock<Arc<rustls::ClientConfig>> = OnceLock::new();
    let config = CONFIG.get_or_init(|| {
        let mut roots = rustls::RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        Arc::new(
            rustls::ClientConfig::builder()
                .with_root_certificates(roots)
                .with_no_client_auth(),
        )
    });
    TlsConnector::from(Arc::clone(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;

    #[test]
    fn login_payload_anonymous() {
        let payload = login_payload(&SessionConfig::default());
        assert_eq!(payload["protocol"], 1);
        assert_eq!(payload["client"], "vndb-rs");
        assert!(payload.get("username").is_none());
        assert!(payload.get("password").is_none());
    }

    #[test]
    fn login_payload_with_credentials() {
        let config = SessionConfig::with_credentials(Credentials::new("alice", "hunter2"));
        let payload = login_payload(&config);
        assert_eq!(payload["username"], "alice");
        assert_eq!(payload["password"], "hunter2");
    }

    #[test]
    fn fault_maps_to_error() {
        assert!(matches!(
            SessionFault::Closed.to_error(),
            SessionError::Closed
        ));
        assert!(matches!(
            SessionFault::Desynchronized.to_error(),
            SessionError::Desynchronized
        ));
        let lost = SessionFault::ConnectionLost("eof".into()).to_error();
        assert!(matches!(lost, SessionError::ConnectionLost { .. }));
    }
}
