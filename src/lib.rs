//! Relay a photo and a prompt to an image-editing provider and hand back a
//! Ghibli-style rendering, plus a small proxy for provider-hosted results.

pub mod config;
pub mod debug_log;
pub mod error;
pub mod heuristics;
pub mod logger;
pub mod models;
pub mod prompt;
pub mod provider;
pub mod proxy;
pub mod relay;
#[cfg(feature = "server")]
pub mod server;

pub use config::{Config, FallbackImage, ProviderConfig, ProxyConfig};
pub use error::{ErrorBody, RelayError, Result};
pub use models::*;
pub use prompt::{PromptBuilder, PromptMode, PromptOptions};
pub use provider::{ImageProvider, OpenAiImageClient};
pub use proxy::ImageProxy;
pub use relay::{TransformForm, TransformRelay};
