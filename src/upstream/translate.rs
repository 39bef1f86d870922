use crate::config::PromptConfig;
use crate::error::ProxyError;

use super::types::{ChatRequest, Message};

/// 入站请求 -> 上游请求体
#[derive(Debug, Clone)]
pub struct Translator {
    system: Option<Message>,
}

#[derive(Debug, Clone)]
pub struct TranslatedRequest {
    pub request: ChatRequest,
    pub body: Vec<u8>,
}

impl Translator {
    pub fn new(system: Option<Message>) -> Self {
        Self { system }
    }

    pub fn from_config(cfg: &PromptConfig) -> Self {
        let system = cfg
            .enabled
            .then(|| Message::system(cfg.system.clone()));
        Self::new(system)
    }

    /// Parses the raw body, requires a model and prepends the system message.
    /// A caller-supplied system message is kept as-is after ours.
    pub fn translate(&self, raw: &[u8]) -> Result<TranslatedRequest, ProxyError> {
        let mut request: ChatRequest =
            serde_json::from_slice(raw).map_err(ProxyError::MalformedRequest)?;

        if request.model.is_empty() {
            return Err(ProxyError::MissingModel);
        }

        if let Some(system) = &self.system {
            request.messages.insert(0, system.clone());
        }

        let body = serde_json::to_vec(&request)?;
        Ok(TranslatedRequest { request, body })
    }
}
