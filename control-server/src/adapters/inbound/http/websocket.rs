//! WebSocket endpoint for snapshot observers
//!
//! Each connection gets a bounded outbound queue drained by a writer task.
//! The hub pushes into the queue without waiting, so one slow observer never
//! stalls a broadcast tick.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        ConnectInfo, State,
    },
    response::Response,
};
use futures_util::{Sink, SinkExt, StreamExt};
use tokio::sync::{mpsc, Notify};

use super::AppState;
use crate::domain::errors::TransportError;
use crate::ports::ObserverTransport;

/// Outbound side of one socket, as seen by the hub
struct ChannelTransport {
    tx: mpsc::Sender<String>,
    close: Arc<Notify>,
    closed: AtomicBool,
}

impl ObserverTransport for ChannelTransport {
    fn send(&self, frame: &str) -> Result<(), TransportError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        self.tx.try_send(frame.to_string()).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => TransportError::Full,
            mpsc::error::TrySendError::Closed(_) => TransportError::Closed,
        })
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.close.notify_one();
        }
    }
}

/// Forward queued frames to the socket until the transport is closed or
/// every sender is gone, then send a Close frame. A failed write ends the
/// loop without one.
async fn write_outbound<S>(sink: &mut S, mut rx: mpsc::Receiver<String>, close: Arc<Notify>)
where
    S: Sink<Message> + Unpin,
{
    loop {
        tokio::select! {
            biased;
            _ = close.notified() => break,
            frame = rx.recv() => match frame {
                Some(text) => {
                    if sink.send(Message::Text(text)).await.is_err() {
                        return;
                    }
                }
                None => break,
            },
        }
    }
    let _ = sink.send(Message::Close(None)).await;
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
) -> Response {
    let remote_addr = connect_info.map(|ConnectInfo(addr)| addr);
    ws.on_upgrade(move |socket| handle_websocket(socket, state, remote_addr))
}

async fn handle_websocket(socket: WebSocket, state: AppState, remote_addr: Option<SocketAddr>) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<String>(state.outbound_buffer.max(1));
    let close = Arc::new(Notify::new());

    let writer = tokio::spawn({
        let close = close.clone();
        async move { write_outbound(&mut sender, rx, close).await }
    });

    let transport = ChannelTransport {
        tx,
        close,
        closed: AtomicBool::new(false),
    };
    let Some(id) = state.hub.on_connect(Box::new(transport), remote_addr) else {
        tracing::debug!(remote_addr = ?remote_addr, "Observer refused, hub is shut down");
        let _ = writer.await;
        return;
    };

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => state.hub.on_message(id, &text),
            Ok(Message::Close(_)) => break,
            // Binary frames are not part of the protocol; control frames are handled by axum
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(observer = %id, "WebSocket receive error: {}", e);
                break;
            }
        }
    }

    state.hub.on_disconnect(id);
    writer.abort();
}
