//! HTTP entry point of the relay

use crate::error::Result;
use crate::payload::Payload;
use crate::publisher::Publisher;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub publisher: Arc<dyn Publisher>,
}

/// Router accepting event payloads on `POST /`
pub fn router(publisher: Arc<dyn Publisher>) -> Router {
    Router::new()
        .route("/", post(relay))
        .with_state(AppState { publisher })
}

/// Decode the payload, re-encode it and publish it to the topic
pub async fn relay(State(state): State<AppState>, body: Bytes) -> Result<StatusCode> {
    let payload = Payload::decode(&body)?;
    let message = payload.encode()?;

    let id = state.publisher.publish(message).await?;
    info!(
        game = %payload.game_name,
        event = %payload.event_name,
        message_id = %id,
        "Published message"
    );
    Ok(StatusCode::OK)
}

pub async fn serve(listener: TcpListener, router: Router) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("Relay listening on {}", addr);
    }
    axum::serve(listener, router).await
}
