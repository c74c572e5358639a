use axum::{Json, Router, extract::Extension, http::StatusCode, routing::post};
use std::sync::Arc;

use super::service::Node;
use crate::protocol::types::{ENDPOINT_MESSAGE, Message};

/// Remote entry point for the election protocol.
///
/// Frames with an unknown kind tag never reach this function; the `Json`
/// extractor rejects them at decode. Reply-only kinds arriving as requests
/// are rejected here.
pub async fn handle_message(
    Extension(node): Extension<Arc<Node>>,
    Json(request): Json<Message>,
) -> Result<Json<Message>, StatusCode> {
    match node.handle_message(request).await {
        Ok(reply) => Ok(Json(reply)),
        Err(e) => {
            tracing::error!("Protocol fault on inbound request: {}", e);
            Err(StatusCode::BAD_REQUEST)
        }
    }
}

/// The node's remote surface: one route, one operation.
pub fn router(node: Arc<Node>) -> Router {
    Router::new()
        .route(ENDPOINT_MESSAGE, post(handle_message))
        .layer(Extension(node))
}
