pub mod image_client;
pub mod traits;

use std::sync::Arc;

use crate::{config::ProviderConfig, error::Result};

pub use image_client::OpenAiImageClient;
pub use traits::ImageProvider;

pub fn build_provider(config: &ProviderConfig) -> Result<Arc<dyn ImageProvider>> {
    Ok(Arc::new(OpenAiImageClient::new(config.clone())?))
}
