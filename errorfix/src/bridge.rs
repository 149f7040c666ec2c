//! WebSocket bridge to the editor frontend.
//!
//! The frontend connects here and pushes typed events: structured
//! `execution_error` notifications as the editor raises them, and
//! `error_dialog` snapshots when an error dialog appears on screen. Dialog
//! events are answered with a `fix_action` message carrying the triage URL,
//! which the frontend renders as its Fix button.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::{
    net::TcpListener,
    sync::{mpsc, Mutex},
    task::JoinHandle,
};
use tokio_tungstenite::{accept_async, tungstenite::Message};

use crate::capture::{ErrorSource, ExecutionErrorEvent};
use crate::discovery::UiNode;
use crate::errors::FixerError;
use crate::Fixer;

pub const DEFAULT_WS_ADDR: &str = "127.0.0.1:17465";

type Clients = Arc<Mutex<Vec<Client>>>;

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
enum EditorIncoming {
    #[serde(rename = "hello")]
    Hello { from: Option<String> },
    #[serde(rename = "pong")]
    Pong,
    #[serde(rename = "execution_error")]
    ExecutionError {
        #[serde(default)]
        detail: ExecutionErrorEvent,
    },
    #[serde(rename = "error_dialog")]
    ErrorDialog {
        #[serde(default)]
        snapshot: Option<UiNode>,
        #[serde(default)]
        raw_text: Option<String>,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
enum EditorOutgoing {
    #[serde(rename = "fix_action")]
    FixAction {
        url: String,
        source: ErrorSource,
        #[serde(skip_serializing_if = "Option::is_none")]
        node_id: Option<String>,
    },
}

struct Client {
    sender: mpsc::UnboundedSender<Message>,
}

/// Accepts editor connections and feeds their events into a [`Fixer`].
///
/// Held by the embedding application; dropping it stops the listener. There is
/// no process-wide bridge instance: each bridge owns a handle to the `Fixer`
/// it serves.
pub struct EditorBridge {
    server_task: JoinHandle<()>,
    clients: Clients,
    local_addr: SocketAddr,
}

impl EditorBridge {
    /// Bind `addr` and start serving editor connections.
    ///
    /// A busy port is retried once after a short delay before giving up, since
    /// editor reloads commonly race the old process releasing the socket.
    pub async fn start(addr: &str, fixer: Arc<Fixer>) -> Result<EditorBridge, FixerError> {
        let listener = match TcpListener::bind(addr).await {
            Ok(l) => l,
            Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
                tracing::warn!(%addr, ?e, "port in use, retrying once in 2s");
                tokio::time::sleep(Duration::from_secs(2)).await;
                TcpListener::bind(addr).await.map_err(|e2| {
                    FixerError::BridgeUnavailable(format!("bind {addr} after retry: {e2}"))
                })?
            }
            Err(e) => {
                return Err(FixerError::BridgeUnavailable(format!("bind {addr}: {e}")));
            }
        };
        let local_addr = listener
            .local_addr()
            .map_err(|e| FixerError::BridgeUnavailable(format!("local addr: {e}")))?;
        tracing::info!(%local_addr, "editor bridge listening");

        let clients: Clients = Arc::new(Mutex::new(Vec::new()));
        let accept_clients = clients.clone();
        let server_task = tokio::spawn(async move {
            loop {
                let (stream, _peer) = match listener.accept().await {
                    Ok(v) => v,
                    Err(e) => {
                        tracing::warn!("ws accept error: {}", e);
                        continue;
                    }
                };
                let conn_clients = accept_clients.clone();
                let conn_fixer = fixer.clone();
                tokio::spawn(async move {
                    handle_connection(stream, conn_clients, conn_fixer).await;
                });
            }
        });

        Ok(EditorBridge {
            server_task,
            clients,
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub async fn is_client_connected(&self) -> bool {
        !self.clients.lock().await.is_empty()
    }
}

impl Drop for EditorBridge {
    fn drop(&mut self) {
        self.server_task.abort();
    }
}

async fn handle_connection(stream: tokio::net::TcpStream, clients: Clients, fixer: Arc<Fixer>) {
    let ws_stream = match accept_async(stream).await {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!("ws handshake error: {}", e);
            return;
        }
    };
    let (mut sink, mut stream) = ws_stream.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    // writer task
    let writer = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Err(e) = sink.send(msg).await {
                tracing::warn!("ws send error: {}", e);
                break;
            }
        }
    });

    // register client
    {
        clients.lock().await.push(Client { sender: tx.clone() });
    }

    // reader loop
    while let Some(Ok(msg)) = stream.next().await {
        if !msg.is_text() {
            continue;
        }
        let txt = msg.into_text().unwrap_or_default();
        match serde_json::from_str::<EditorIncoming>(&txt) {
            Ok(EditorIncoming::ExecutionError { detail }) => {
                let record = fixer.record_execution_error(detail).await;
                tracing::info!(id = %record.id, node_id = ?record.node_id, "execution error from editor");
            }
            Ok(EditorIncoming::ErrorDialog { snapshot, raw_text }) => {
                let action = match (snapshot.as_ref(), raw_text.as_deref()) {
                    (Some(snap), _) => fixer.handle_error_dialog(snap),
                    (None, Some(raw)) => fixer.fix_action_from_text(raw),
                    (None, None) => fixer.fix_action_from_text(""),
                };
                tracing::info!(
                    id = %action.record.id,
                    source = ?action.record.source,
                    "error dialog resolved"
                );
                let reply = EditorOutgoing::FixAction {
                    url: action.url,
                    source: action.record.source,
                    node_id: action.record.node_id.clone(),
                };
                match serde_json::to_string(&reply) {
                    Ok(payload) => {
                        if tx.send(Message::Text(payload)).is_err() {
                            break;
                        }
                    }
                    Err(e) => tracing::warn!("fix action serialize error: {}", e),
                }
            }
            Ok(EditorIncoming::Hello { from }) => {
                tracing::info!(from = ?from, "editor connected");
            }
            Ok(EditorIncoming::Pong) => {}
            Err(e) => tracing::warn!("invalid incoming JSON: {}", e),
        }
    }

    writer.abort();
}
