use std::sync::Arc;
use std::time::Duration;

use reqwest::{ClientBuilder, cookie::Jar, redirect};

use crate::config::UpstreamConfig;
use crate::error::ProxyError;

// Only an explicitly configured proxy is used; ambient *_PROXY variables are ignored.
fn apply_proxy(builder: ClientBuilder, proxy: Option<&str>) -> Result<ClientBuilder, ProxyError> {
    match proxy.map(str::trim).filter(|p| !p.is_empty()) {
        Some(url) => {
            let proxy = reqwest::Proxy::all(url)
                .map_err(|e| ProxyError::Config(format!("invalid proxy url {}: {}", url, e)))?;
            tracing::info!("Proxy set: {}", url);
            Ok(builder.proxy(proxy))
        }
        None => Ok(builder.no_proxy()),
    }
}

/// 进程级共享的上游传输层：clone 出的 client 共用同一个 cookie jar，不跟随重定向
pub fn build_transport(cfg: &UpstreamConfig) -> Result<reqwest::Client, ProxyError> {
    let builder = reqwest::Client::builder()
        .cookie_provider(Arc::new(Jar::default()))
        .redirect(redirect::Policy::none())
        .timeout(Duration::from_secs(cfg.timeout_secs))
        .user_agent(cfg.user_agent.as_str());
    apply_proxy(builder, cfg.proxy.as_deref())?
        .build()
        .map_err(|e| ProxyError::Config(format!("failed to build http client: {}", e)))
}
