use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::error::ProxyError;
use crate::server::AppState;
use crate::upstream::reshape::{collect_deltas, passthrough};
use crate::upstream::{ChatCompletionResponse, TranslatedRequest};

/// Chat Completions 入口：
/// - 注入 system 消息后转发到上游
/// - `stream=true` 时原样回传上游字节流
/// - 否则聚合上游 SSE 的增量文本，合成一次性响应
pub async fn chat_completions(
    State(app_state): State<Arc<AppState>>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ProxyError> {
    let TranslatedRequest { request, body } = app_state.translator.translate(&body)?;
    tracing::info!(
        model = %request.model,
        stream = request.stream,
        messages = request.messages.len(),
        "chat completion"
    );

    let upstream = app_state
        .upstream
        .send(method, headers.get(header::AUTHORIZATION), body)
        .await?;

    if request.stream {
        return Ok(passthrough(upstream));
    }

    let status = upstream.status();
    if status != StatusCode::OK {
        return Err(ProxyError::UpstreamStatus(status));
    }

    let full_text = collect_deltas(upstream.bytes_stream()).await?;
    let completion = ChatCompletionResponse::from_text(&request.model, full_text);
    Ok(Json(completion).into_response())
}

pub async fn preflight() -> Json<Value> {
    Json(json!({ "message": "pong" }))
}
