use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::State;
use axum::extract::WebSocketUpgrade;
use axum::response::IntoResponse;
use axum::routing::any;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error};
use utoipa_axum::router::OpenApiRouter;

use crate::error::Error;
use crate::metrics::CONNECTIONS_LIVE;
use crate::sync::{Connection, Timeout};
use crate::ServerState;

/// Sync init
///
/// Open a websocket to start syncing
#[utoipa::path(
    get,
    path = "/sync",
    tags = ["sync"],
    responses(
        (status = UPGRADE_REQUIRED, description = "success"),
    )
)]
async fn sync(State(s): State<Arc<ServerState>>, upgrade: WebSocketUpgrade) -> impl IntoResponse {
    upgrade.on_upgrade(move |ws| worker(s, ws))
}

#[tracing::instrument(skip(s, ws))]
async fn worker(s: Arc<ServerState>, mut ws: WebSocket) {
    let mut timeout = Timeout::for_ping();
    let mut events = s.subscribe();
    let mut conn = Connection::new(s.clone());
    CONNECTIONS_LIVE.inc();
    debug!("connection {} open", conn.id());

    loop {
        tokio::select! {
            ws_msg = ws.recv() => {
                match ws_msg {
                    Some(Ok(Message::Close(_))) => break,
                    Some(Ok(ws_msg)) => {
                        if let Err(err) = conn.handle_message(ws_msg, &mut ws, &mut timeout).await {
                            // a failed login ends the connection; anything
                            // else is reported and the session carries on
                            let fatal = matches!(err, Error::MissingAuth);
                            let _ = ws.send(err.into()).await;
                            if fatal {
                                let _ = ws.send(Message::Close(None)).await;
                                break;
                            }
                        }
                    },
                    _ => break,
                }
            }
            event = events.recv() => {
                match event {
                    Ok(event) => {
                        if let Err(err) = conn.queue_message(event).await {
                            error!("{err}");
                        }
                    }
                    // this receiver fell behind the bus; rebuild from a
                    // fresh snapshot instead of replaying a hole
                    Err(RecvError::Lagged(skipped)) => {
                        debug!("connection {} lagged {skipped} events, resyncing", conn.id());
                        if let Err(err) = conn.resync().await {
                            error!("{err}");
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            _ = tokio::time::sleep_until(timeout.get_instant()) => {
                if !handle_timeout(&mut timeout, &mut ws).await {
                    let _ = ws.send(Error::BadStatic("connection timed out").into()).await;
                    let _ = ws.send(Message::Close(None)).await;
                    break;
                }
            }
        }
        let _ = conn.drain(&mut ws).await;
    }

    debug!("connection {} closed", conn.id());
    conn.disconnect().await;
    CONNECTIONS_LIVE.dec();
}

async fn handle_timeout(timeout: &mut Timeout, ws: &mut WebSocket) -> bool {
    match timeout {
        Timeout::Ping(_) => {
            let _ = ws
                .send(crate::types::MessageServer::Ping.into())
                .await;
            *timeout = Timeout::for_close();
            true
        }
        Timeout::Close(_) => false,
    }
}

pub fn routes() -> OpenApiRouter<Arc<ServerState>> {
    OpenApiRouter::new().route("/sync", any(sync))
}
