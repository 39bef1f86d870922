use axum::{
    Json,
    body::{Body, Bytes},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProxyError {
    /// Inbound body is not a valid chat request.
    #[error("{0}")]
    MalformedRequest(#[source] serde_json::Error),

    #[error("Model is required")]
    MissingModel,

    #[error("{0}")]
    UpstreamUnreachable(#[from] reqwest::Error),

    #[error("upstream responded with status {}", .0.as_u16())]
    UpstreamStatus(StatusCode),

    /// Body read failed after the upstream answered; nothing has been sent yet.
    #[error("upstream stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ProxyError>;

impl ProxyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::MissingModel => StatusCode::BAD_REQUEST,
            ProxyError::UpstreamStatus(status) => *status,
            ProxyError::StreamInterrupted(_) => StatusCode::BAD_GATEWAY,
            ProxyError::MalformedRequest(_)
            | ProxyError::UpstreamUnreachable(_)
            | ProxyError::Json(_)
            | ProxyError::Config(_)
            | ProxyError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!("Proxy error: {} - {}", status, message);
        } else {
            tracing::warn!("Request rejected: {} - {}", status, message);
        }

        if let ProxyError::StreamInterrupted(_) = self {
            // 失败的 body 让 hyper 直接断开连接，客户端收不到 JSON 错误体
            let aborted = futures_util::stream::once(async move {
                Err::<Bytes, _>(std::io::Error::other(message))
            });
            return (status, Body::from_stream(aborted)).into_response();
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}
