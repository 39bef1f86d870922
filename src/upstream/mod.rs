pub mod client;
pub mod reshape;
pub mod translate;
pub mod types;

pub use client::UpstreamClient;
pub use translate::{TranslatedRequest, Translator};
pub use types::ChatCompletionResponse;
