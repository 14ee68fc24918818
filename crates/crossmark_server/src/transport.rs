//! WebSocket transport.
//!
//! Each socket gets a [`ConnectionId`], an outbound queue, and two tasks: a
//! reader that forwards text frames to the session and a writer that drains
//! the queue. Whichever finishes first ends the connection.

use crate::actor::{Outbound, SessionHandle};
use crate::config::ServerConfig;
use crate::connection::ConnectionId;
use axum::{
    Router,
    body::Body,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::Request,
    response::Response,
    routing::get,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tower::ServiceBuilder;
use tracing::{debug, info, instrument, warn};

/// Builds the HTTP router for a running session.
pub fn router(handle: SessionHandle) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/healthz", get(health))
        .layer(ServiceBuilder::new().map_request(|req: Request<Body>| {
            debug!(method = %req.method(), uri = %req.uri(), "Incoming HTTP request");
            req
        }))
        .with_state(handle)
}

/// Binds and serves until the listener fails.
#[instrument(skip(config), fields(addr = %config.bind_addr()))]
pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let (handle, _worker) = SessionHandle::spawn(config.session().clone());
    let app = router(handle);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    info!(addr = %listener.local_addr()?, "Match server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> &'static str {
    "ok"
}

async fn ws_handler(ws: WebSocketUpgrade, State(handle): State<SessionHandle>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, handle))
}

#[instrument(skip_all, fields(conn = tracing::field::Empty))]
async fn handle_socket(socket: WebSocket, handle: SessionHandle) {
    let conn = handle.next_connection_id();
    tracing::Span::current().record("conn", tracing::field::display(conn));

    let (outbox, outbound) = mpsc::unbounded_channel();
    if handle.connect(conn, outbox).is_err() {
        warn!("Session task gone; dropping socket");
        return;
    }
    info!("Connection opened");

    let (sink, stream) = socket.split();
    let mut writer = tokio::spawn(write_frames(sink, outbound));
    let mut reader = tokio::spawn(read_frames(stream, conn, handle.clone()));

    tokio::select! {
        _ = &mut writer => reader.abort(),
        _ = &mut reader => writer.abort(),
    }

    if handle.disconnect(conn).is_err() {
        debug!("Session task gone before disconnect");
    }
    info!("Connection closed");
}

async fn read_frames(
    mut stream: futures::stream::SplitStream<WebSocket>,
    conn: ConnectionId,
    handle: SessionHandle,
) {
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                if handle.message(conn, text.as_str()).is_err() {
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!(%conn, error = %e, "Socket read failed");
                break;
            }
        }
    }
}

async fn write_frames(
    mut sink: futures::stream::SplitSink<WebSocket, Message>,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
) {
    while let Some(frame) = outbound.recv().await {
        match frame {
            Outbound::Event(event) => {
                let text = match event.to_json() {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(error = %e, "Failed to encode event");
                        continue;
                    }
                };
                if sink.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            Outbound::Close => {
                let _ = sink.send(Message::Close(None)).await;
                break;
            }
        }
    }
}
