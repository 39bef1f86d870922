pub mod handlers;

use crate::config::Settings;
use crate::error::Result as AppResult;
use crate::upstream::{Translator, UpstreamClient};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub translator: Translator,
    pub upstream: Arc<UpstreamClient>,
}

impl AppState {
    pub fn new(config: &Settings) -> AppResult<Self> {
        Ok(Self {
            translator: Translator::from_config(&config.prompt),
            upstream: Arc::new(UpstreamClient::new(&config.upstream)?),
        })
    }
}

pub fn create_app(config: Settings) -> AppResult<Router> {
    tracing::info!("Forwarding completions to {}", config.upstream.url);
    if !config.prompt.enabled {
        tracing::warn!("System prompt injection disabled");
    }

    let app_state = AppState::new(&config)?;

    let app = handlers::routes()
        .with_state(Arc::new(app_state))
        .layer(TraceLayer::new_for_http());

    Ok(app)
}
