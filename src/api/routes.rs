use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json,
    body::to_bytes,
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};
use serde_json::json;

use super::state::AppState;
use crate::chat::{ChatError, types::VALIDATION_MESSAGE};

const FALLBACK_IP: &str = "127.0.0.1";

pub async fn chat_handler(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let ip = client_ip(request.headers(), peer);

    let body = match to_bytes(request.into_body(), state.config.server.max_body_bytes).await {
        Ok(body) => body,
        Err(why) => {
            log::info!("event=validation_error ip={ip} reason=\"{why}\"");
            return ChatError::Validation(VALIDATION_MESSAGE.to_string()).into_response();
        }
    };

    match state.chat.handle(&ip, &body).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(why) => why.into_response(),
    }
}

pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let content_path = state.config.content_root();
    let content_exists = tokio::fs::metadata(content_path)
        .await
        .is_ok_and(|meta| meta.is_dir());

    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "provider": state.chat.model_name(),
        "contentPath": content_path.display().to_string(),
        "contentExists": content_exists,
    }))
}

pub async fn fallback_handler() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": { "code": "NOT_FOUND", "message": "Endpoint not found" }
        })),
    )
}

/// First `X-Forwarded-For` hop, then `X-Real-IP`, then the socket peer.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    if let Some(first) = header("x-forwarded-for")
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
    {
        return first.to_string();
    }

    if let Some(real_ip) = header("x-real-ip") {
        return real_ip.to_string();
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| FALLBACK_IP.to_string())
}
