use crate::error::{AppResult, InfraError};
use crate::hub::Hub;
use crate::net::sink::websocket::{WebSocketSink, WebSocketSource};
use axum::{
    Router,
    extract::{ConnectInfo, State},
    extract::ws::{WebSocket, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
};
use futures::StreamExt;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};

pub fn router(hub: Arc<Hub>) -> Router {
    Router::new()
        .route("/ws", get(ws_upgrade))
        .with_state(hub)
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
}

/// Run the HTTP server with the WebSocket endpoint until `shutdown` fires
pub async fn serve(addr: SocketAddr, hub: Arc<Hub>, shutdown: CancellationToken) -> AppResult<()> {
    let app = router(hub);

    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(InfraError::from)?;
    tracing::info!(%addr, "game server listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(InfraError::from)?;
    Ok(())
}

async fn ws_upgrade(
    ws: WebSocketUpgrade,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    State(hub): State<Arc<Hub>>,
) -> impl IntoResponse {
    tracing::info!(%remote, "new websocket connection");
    ws.on_upgrade(move |socket| ws_handler(socket, hub, remote))
}

async fn ws_handler(socket: WebSocket, hub: Arc<Hub>, remote: SocketAddr) {
    let (ws_write, ws_read) = socket.split();
    hub.serve(WebSocketSource::new(ws_read), WebSocketSink::new(ws_write)).await;
    tracing::info!(%remote, "websocket connection finished");
}
