use axum::http::{HeaderMap, HeaderValue, Method, header};
use reqwest::Url;

use crate::config::UpstreamConfig;
use crate::error::ProxyError;
use crate::http_client::build_transport;

/// 单一上游端点的调用方，持有共享的传输层
pub struct UpstreamClient {
    client: reqwest::Client,
    url: Url,
    headers: HeaderMap,
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, ProxyError> {
    HeaderValue::from_str(value)
        .map_err(|_| ProxyError::Config(format!("invalid {} header value: {}", name, value)))
}

// Host header defaults to the URL authority, port included when explicit.
fn authority(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

impl UpstreamClient {
    pub fn new(cfg: &UpstreamConfig) -> Result<Self, ProxyError> {
        let url = Url::parse(&cfg.url)
            .map_err(|e| ProxyError::Config(format!("invalid upstream url {}: {}", cfg.url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ProxyError::Config(format!(
                "upstream url must be http or https: {}",
                cfg.url
            )));
        }

        let host = match &cfg.host {
            Some(host) => host.clone(),
            None => authority(&url)
                .ok_or_else(|| ProxyError::Config(format!("upstream url has no host: {}", cfg.url)))?,
        };

        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, header_value("Host", &host)?);
        headers.insert(header::ORIGIN, header_value("Origin", &cfg.origin)?);
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "keep-alive",
            header_value("Keep-Alive", &format!("timeout={}", cfg.timeout_secs))?,
        );
        headers.insert(header::USER_AGENT, header_value("User-Agent", &cfg.user_agent)?);

        Ok(Self {
            client: build_transport(cfg)?,
            url,
            headers,
        })
    }

    /// Issues one call with the caller's method. `authorization` is forwarded
    /// unchecked. The returned response owns the upstream connection until dropped.
    pub async fn send(
        &self,
        method: Method,
        authorization: Option<&HeaderValue>,
        body: Vec<u8>,
    ) -> Result<reqwest::Response, ProxyError> {
        let mut request = self
            .client
            .request(method, self.url.clone())
            .headers(self.headers.clone())
            .body(body);
        if let Some(auth) = authorization {
            request = request.header(header::AUTHORIZATION, auth.clone());
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!("Upstream request to {} failed: {}", self.url, e);
            ProxyError::UpstreamUnreachable(e)
        })?;
        tracing::debug!("Upstream responded with {}", response.status());
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(url: &str) -> UpstreamConfig {
        UpstreamConfig {
            url: url.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn default_headers_match_browser_profile() {
        let client = UpstreamClient::new(&UpstreamConfig::default()).unwrap();
        let headers = &client.headers;
        assert_eq!(headers[header::HOST], "api.jeeves.ai");
        assert_eq!(headers[header::ORIGIN], "https://jeeves.ai/");
        assert_eq!(headers[header::CONNECTION], "keep-alive");
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
        assert_eq!(headers["keep-alive"], "timeout=360");
        assert!(
            headers[header::USER_AGENT]
                .to_str()
                .unwrap()
                .contains("Chrome/112")
        );
        assert!(!headers.contains_key(header::AUTHORIZATION));
    }

    #[test]
    fn keep_alive_follows_configured_timeout() {
        let client = UpstreamClient::new(&UpstreamConfig {
            timeout_secs: 90,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(client.headers["keep-alive"], "timeout=90");
    }

    #[test]
    fn host_header_keeps_explicit_port() {
        let client = UpstreamClient::new(&cfg("http://127.0.0.1:7000/chat")).unwrap();
        assert_eq!(client.headers[header::HOST], "127.0.0.1:7000");
    }

    #[test]
    fn configured_host_wins() {
        let client = UpstreamClient::new(&UpstreamConfig {
            host: Some("chat.example.com".into()),
            ..cfg("http://10.0.0.5/chat")
        })
        .unwrap();
        assert_eq!(client.headers[header::HOST], "chat.example.com");
    }

    #[test]
    fn rejects_bad_urls() {
        assert!(matches!(
            UpstreamClient::new(&cfg("not a url")).err().unwrap(),
            ProxyError::Config(_)
        ));
        assert!(matches!(
            UpstreamClient::new(&cfg("ftp://example.com/chat")).err().unwrap(),
            ProxyError::Config(_)
        ));
    }

    #[tokio::test]
    async fn unreachable_upstream_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = UpstreamClient::new(&cfg(&format!("http://{}/chat", addr))).unwrap();
        let err = client
            .send(Method::POST, None, b"{}".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, ProxyError::UpstreamUnreachable(_)));
        assert_eq!(err.status_code(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }
}
