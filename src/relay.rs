//! The transform relay: validate a caller's prompt and image, forward them to
//! the image provider and normalize what comes back.

use std::sync::Arc;

use crate::{
    config::{Config, FallbackImage, ProviderConfig},
    error::{RelayError, Result},
    models::image::{ImageEditRequest, ImageReference, UploadPayload},
    prompt::PromptBuilder,
    provider::ImageProvider,
};

/// Fields pulled out of an incoming relay request. `None` means the field
/// was absent, which differs from present-but-blank for the prompt.
#[derive(Debug, Clone, Default)]
pub struct TransformForm {
    pub prompt: Option<String>,
    pub image: Option<UploadPayload>,
}

#[derive(Clone)]
pub struct TransformRelay {
    provider: Arc<dyn ImageProvider>,
    provider_config: ProviderConfig,
    fallback_image: FallbackImage,
    prompts: PromptBuilder,
    environment: String,
}

impl TransformRelay {
    pub fn new(config: &Config, provider: Arc<dyn ImageProvider>) -> Self {
        Self {
            provider,
            provider_config: config.provider.clone(),
            fallback_image: config.fallback_image.clone(),
            prompts: PromptBuilder::new(config.prompt_mode),
            environment: config.environment.clone(),
        }
    }

    pub async fn transform(&self, form: TransformForm) -> Result<ImageReference> {
        let result = self.forward(form).await;
        if let Err(err) = &result {
            self.log_failure(err);
        }
        result
    }

    async fn forward(&self, form: TransformForm) -> Result<ImageReference> {
        if self.provider_config.api_key.is_none() {
            return Err(RelayError::ConfigError(
                "OpenAI API key not configured".into(),
            ));
        }

        let prompt = form
            .prompt
            .as_deref()
            .map(|p| self.prompts.resolve(p))
            .ok_or_else(|| RelayError::InvalidInput("Prompt is required".into()))?;

        let image = match form.image {
            Some(image) => image,
            None => self.load_fallback().await?,
        };

        let request = ImageEditRequest {
            image,
            prompt,
            model: self.provider_config.model.clone(),
            n: self.provider_config.n,
            size: self.provider_config.size.clone(),
        };

        let response = self.provider.edit(request).await?;
        let reference = response.into_image_reference()?;
        log::info!(
            "Image edit via {} succeeded ({})",
            self.provider.name(),
            if reference.is_remote() { "hosted url" } else { "inline payload" }
        );
        Ok(reference)
    }

    async fn load_fallback(&self) -> Result<UploadPayload> {
        let missing = || RelayError::InvalidInput("Image file is required".into());

        let path = match &self.fallback_image {
            FallbackImage::Bundled => {
                log::info!("No image supplied, using bundled fallback");
                return Ok(UploadPayload::bundled_fallback());
            }
            FallbackImage::File(path) => path,
            FallbackImage::Disabled => return Err(missing()),
        };
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            log::warn!("No image supplied and fallback {} is missing", path.display());
            return Err(missing());
        }

        log::info!("No image supplied, using fallback {}", path.display());
        UploadPayload::from_path(path).await
    }

    fn log_failure(&self, err: &RelayError) {
        if err.is_unexpected() {
            log::error!(
                "Relay failure: {} | detail: {:?} | has_api_key: {} | api_key_len: {} | environment: {}",
                err,
                err,
                self.provider_config.api_key.is_some(),
                self.provider_config.api_key_len(),
                self.environment
            );
        } else {
            log::warn!("Relay request rejected: {}", err);
        }
    }
}
