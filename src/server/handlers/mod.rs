use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, header},
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::server::AppState;

mod chat;
mod ping;

pub fn routes() -> Router<Arc<AppState>> {
    // 补全接口的每个响应都带宽松的 CORS 头；长对话历史不设请求体上限
    let completions = Router::new()
        .route(
            "/v1/chat/completions",
            post(chat::chat_completions).options(chat::preflight),
        )
        .layer(DefaultBodyLimit::disable())
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("POST"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("*"),
        ));

    Router::new()
        .route("/ping", get(ping::ping))
        .merge(completions)
}
