//! TCP server answering scheduler requests
//!
//! Each connection reads request frames and writes response frames. Requests on
//! one connection are handled concurrently; responses carry the request id so
//! clients can match them up.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::WriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, RwLock};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::frame::{read_frame, write_frame};
use crate::protocol::{ErrorBody, ErrorKind, NetIdentity, Op, Reply, Request, Response};

/// Maximum number of concurrent connections
const MAX_CONNECTIONS: usize = 256;

/// Answers requests. Called off the async runtime, so it may block.
pub trait RequestHandler: Send + Sync + 'static {
    fn handle(&self, identity: Option<NetIdentity>, op: Op) -> std::result::Result<Reply, ErrorBody>;
}

/// Server state shared across tasks
#[derive(Default)]
struct ServerState {
    connections: usize,
    requests_served: u64,
}

/// Server handle
pub struct Server {
    addr: SocketAddr,
    state: Arc<RwLock<ServerState>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl Server {
    /// Start a new server on loopback at the given port (0 picks a free one)
    pub async fn start<H: RequestHandler>(port: u16, handler: Arc<H>) -> Result<Self> {
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        Self::bind(addr, handler).await
    }

    /// Start a new server on an explicit address
    pub async fn bind<H: RequestHandler>(addr: SocketAddr, handler: Arc<H>) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let bound_addr = listener.local_addr()?;

        info!(addr = %bound_addr, "Server started");

        let (shutdown_tx, _) = broadcast::channel(1);
        let state = Arc::new(RwLock::new(ServerState::default()));

        tokio::spawn(accept_loop(
            listener,
            state.clone(),
            handler,
            shutdown_tx.clone(),
        ));

        Ok(Server {
            addr: bound_addr,
            state,
            shutdown_tx,
        })
    }

    /// Get the server's bound address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Currently open connections
    pub async fn connections(&self) -> usize {
        self.state.read().await.connections
    }

    /// Requests answered since start
    pub async fn requests_served(&self) -> u64 {
        self.state.read().await.requests_served
    }

    /// Stop accepting and close open connections
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
        info!("Server shutdown initiated");
    }
}

/// Accept incoming connections
async fn accept_loop<H: RequestHandler>(
    listener: TcpListener,
    state: Arc<RwLock<ServerState>>,
    handler: Arc<H>,
    shutdown_tx: broadcast::Sender<()>,
) {
    let mut shutdown_rx = shutdown_tx.subscribe();
    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, addr)) => {
                        {
                            let mut s = state.write().await;
                            if s.connections >= MAX_CONNECTIONS {
                                warn!(addr = %addr, error = %Error::ServerFull, "Connection refused");
                                continue;
                            }
                            s.connections += 1;
                        }
                        debug!(addr = %addr, "New connection");
                        tokio::spawn(handle_connection(
                            stream,
                            addr,
                            state.clone(),
                            handler.clone(),
                            shutdown_tx.subscribe(),
                        ));
                    }
                    Err(e) => {
                        error!(error = %e, "Accept failed");
                    }
                }
            }
            _ = shutdown_rx.recv() => {
                info!("Accept loop shutting down");
                break;
            }
        }
    }
}

/// Handle a single client connection
async fn handle_connection<H: RequestHandler>(
    stream: TcpStream,
    addr: SocketAddr,
    state: Arc<RwLock<ServerState>>,
    handler: Arc<H>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let (mut reader, writer) = tokio::io::split(stream);

    let (resp_tx, resp_rx) = mpsc::channel(64);
    let writer_handle = tokio::spawn(writer_task(writer, resp_rx));

    loop {
        tokio::select! {
            result = read_frame::<Request, _>(&mut reader) => {
                match result {
                    Ok(request) => {
                        tokio::spawn(dispatch(request, handler.clone(), resp_tx.clone(), state.clone()));
                    }
                    Err(Error::ConnectionClosed) => {
                        debug!(addr = %addr, "Connection closed");
                        break;
                    }
                    Err(e) => {
                        warn!(addr = %addr, error = %e, "Read error");
                        break;
                    }
                }
            }
            _ = shutdown_rx.recv() => {
                debug!(addr = %addr, "Closing connection for shutdown");
                break;
            }
        }
    }

    // Let in-flight responses drain before the writer stops
    drop(resp_tx);
    if writer_handle.await.is_err() {
        debug!(addr = %addr, "Writer task aborted");
    }

    state.write().await.connections -= 1;
    debug!(addr = %addr, "Peer disconnected");
}

/// Run one request on the blocking pool and queue its response
async fn dispatch<H: RequestHandler>(
    request: Request,
    handler: Arc<H>,
    resp_tx: mpsc::Sender<Response>,
    state: Arc<RwLock<ServerState>>,
) {
    let Request { id, identity, op } = request;
    let op_name = op.name();

    let outcome = tokio::task::spawn_blocking(move || handler.handle(identity, op)).await;
    let response = match outcome {
        Ok(Ok(reply)) => Response::ok(id, reply),
        Ok(Err(body)) => Response::error(id, body),
        Err(e) => {
            let crid = Uuid::new_v4();
            error!(%crid, op = op_name, error = %e, "Request handler panicked");
            Response::error(
                id,
                ErrorBody {
                    kind: ErrorKind::Internal,
                    message: "Internal error".into(),
                    crid,
                },
            )
        }
    };

    state.write().await.requests_served += 1;
    if resp_tx.send(response).await.is_err() {
        debug!(request_id = id, "Connection gone before response");
    }
}

/// Writer task - sends responses to the client
async fn writer_task(mut writer: WriteHalf<TcpStream>, mut rx: mpsc::Receiver<Response>) {
    while let Some(msg) = rx.recv().await {
        if let Err(e) = write_frame(&mut writer, &msg).await {
            debug!(error = %e, "Write failed");
            break;
        }
    }
}
