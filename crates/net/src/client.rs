//! TCP client for the scheduler server

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::io::{ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, RwLock};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::frame::{read_frame, write_frame};
use crate::protocol::{NetIdentity, Op, Outcome, Reply, Request, Response};

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

/// Client handle for network operations
pub struct Client {
    identity: Option<NetIdentity>,
    state: Arc<RwLock<ConnectionState>>,
    cmd_tx: mpsc::Sender<ClientCommand>,
    next_id: AtomicU64,
}

enum ClientCommand {
    Send(Request, oneshot::Sender<Response>),
    Disconnect,
}

impl Client {
    /// Connect to a server, acting as `identity` for every request
    pub async fn connect(addr: SocketAddr, identity: Option<NetIdentity>) -> Result<Self> {
        info!(addr = %addr, "Connecting to server");

        let stream = TcpStream::connect(addr).await?;
        let (reader, writer) = tokio::io::split(stream);

        let state = Arc::new(RwLock::new(ConnectionState::Connected));
        let (cmd_tx, cmd_rx) = mpsc::channel(64);

        tokio::spawn(connection_task(reader, writer, state.clone(), cmd_rx));

        Ok(Client {
            identity,
            state,
            cmd_tx,
            next_id: AtomicU64::new(1),
        })
    }

    /// Send one operation and wait for its reply
    pub async fn call(&self, op: Op) -> Result<Reply> {
        let request = Request {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            identity: self.identity.clone(),
            op,
        };

        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(ClientCommand::Send(request, tx))
            .await
            .map_err(|_| Error::NotConnected)?;

        let response = rx.await.map_err(|_| Error::ConnectionClosed)?;
        match response.outcome {
            Outcome::Ok { data } => Ok(data),
            Outcome::Error(body) => Err(Error::Remote {
                kind: body.kind,
                message: body.message,
                crid: body.crid,
            }),
        }
    }

    /// Send a ping
    pub async fn ping(&self) -> Result<()> {
        match self.call(Op::Ping).await? {
            Reply::Pong => Ok(()),
            other => Err(unexpected(&other)),
        }
    }

    /// Chance as a percentage for a submitter on a date (today when `None`)
    pub async fn selection_chance(&self, submitter_id: &str, date: Option<NaiveDate>) -> Result<f64> {
        match self
            .call(Op::SelectionChance {
                submitter_id: submitter_id.to_string(),
                date,
            })
            .await?
        {
            Reply::Chance { percent, .. } => Ok(percent),
            other => Err(unexpected(&other)),
        }
    }

    /// Disconnect from the server
    pub async fn disconnect(&self) {
        let _ = self.cmd_tx.send(ClientCommand::Disconnect).await;
    }

    /// Get current connection state
    pub async fn connection_state(&self) -> ConnectionState {
        *self.state.read().await
    }
}

fn unexpected(reply: &Reply) -> Error {
    Error::Protocol(format!("Unexpected reply: {reply:?}"))
}

/// Main connection task
async fn connection_task(
    mut reader: ReadHalf<TcpStream>,
    mut writer: WriteHalf<TcpStream>,
    state: Arc<RwLock<ConnectionState>>,
    mut cmd_rx: mpsc::Receiver<ClientCommand>,
) {
    let mut pending: HashMap<u64, oneshot::Sender<Response>> = HashMap::new();

    loop {
        tokio::select! {
            // Incoming response from server
            result = read_frame::<Response, _>(&mut reader) => {
                match result {
                    Ok(response) => match pending.remove(&response.id) {
                        Some(waiter) => {
                            let _ = waiter.send(response);
                        }
                        None => debug!(request_id = response.id, "Response for unknown request"),
                    },
                    Err(Error::ConnectionClosed) => {
                        debug!("Server closed connection");
                        break;
                    }
                    Err(e) => {
                        warn!(error = %e, "Read error");
                        break;
                    }
                }
            }

            // Outgoing command
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(ClientCommand::Send(request, waiter)) => {
                        let id = request.id;
                        if let Err(e) = write_frame(&mut writer, &request).await {
                            warn!(error = %e, "Write error");
                            break;
                        }
                        pending.insert(id, waiter);
                    }
                    Some(ClientCommand::Disconnect) | None => {
                        debug!("Disconnect requested");
                        break;
                    }
                }
            }
        }
    }

    // Dropping the pending senders wakes every waiter with ConnectionClosed
    pending.clear();
    *state.write().await = ConnectionState::Disconnected;
    info!("Disconnected from server");
}
