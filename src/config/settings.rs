use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ProxyError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub prompt: PromptConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9090,
        }
    }
}

pub const DEFAULT_UPSTREAM_URL: &str = "https://api.jeeves.ai/generate/v3/chat";
pub const DEFAULT_ORIGIN: &str = "https://jeeves.ai/";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/112.0.0.0 Safari/537.36";
pub const DEFAULT_TIMEOUT_SECS: u64 = 360;

/// 上游服务与传输层配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub url: String,
    /// 覆盖 `Host` 头；缺省时取 `url` 的 authority
    pub host: Option<String>,
    pub origin: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub proxy: Option<String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_UPSTREAM_URL.to_string(),
            host: None,
            origin: DEFAULT_ORIGIN.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            proxy: None,
        }
    }
}

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// 注入到每个请求首位的 system 消息
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    pub enabled: bool,
    pub system: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            system: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self, ProxyError> {
        let mut settings = match Self::find_config_file() {
            Some(path) => Self::from_file(path)?,
            None => {
                tracing::info!("No config file found, using defaults");
                Settings::default()
            }
        };
        settings.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ProxyError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        toml::from_str(&content).map_err(|e| {
            ProxyError::Config(format!("{}: {}", path.as_ref().display(), e))
        })
    }

    /// `HOST` / `PORT` / `http_proxy` take precedence over the file.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ProxyError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = non_empty("HOST") {
            self.server.host = host;
        }
        if let Some(port) = non_empty("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| ProxyError::Config(format!("PORT 不是合法端口: {}", port)))?;
        }
        if let Some(proxy) = non_empty("http_proxy").or_else(|| non_empty("HTTP_PROXY")) {
            self.upstream.proxy = Some(proxy);
        }
        Ok(())
    }

    fn find_config_file() -> Option<&'static str> {
        let possible_names = ["custom-config.toml", "config.toml"];

        possible_names
            .into_iter()
            .find(|name| Path::new(name).exists())
    }
}
