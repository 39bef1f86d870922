pub mod settings;

pub use settings::{PromptConfig, Settings, UpstreamConfig};
