use crate::{
    config::ProviderConfig,
    error::{RelayError, Result},
    logger,
    models::image::{ImageEditRequest, ProviderImageResponse},
    provider::traits::ImageProvider,
};
use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client,
};

/// Client for an OpenAI-compatible `images/edits` endpoint.
#[derive(Clone)]
pub struct OpenAiImageClient {
    client: Client,
    config: ProviderConfig,
}

impl OpenAiImageClient {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RelayError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn build_form(request: ImageEditRequest) -> Result<Form> {
        let image = Part::bytes(request.image.bytes)
            .file_name(request.image.file_name)
            .mime_str(&request.image.content_type)
            .map_err(|e| {
                RelayError::InvalidInput(format!("Unsupported image content type: {}", e))
            })?;

        Ok(Form::new()
            .part("image", image)
            .text("prompt", request.prompt)
            .text("model", request.model)
            .text("n", request.n.to_string())
            .text("size", request.size))
    }
}

#[async_trait]
impl ImageProvider for OpenAiImageClient {
    async fn edit(&self, request: ImageEditRequest) -> Result<ProviderImageResponse> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| RelayError::ConfigError("OpenAI API key not configured".into()))?;

        log::info!(
            "Editing image with model: {} ({} bytes, {})",
            request.model,
            request.image.len(),
            request.image.content_type
        );

        let form = Self::build_form(request)?;
        let _timer = logger::timer("provider image edit");

        let response = self
            .client
            .post(self.config.edits_url())
            .bearer_auth(api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| RelayError::from_transport("Image edit failed", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    log::warn!("Failed to read provider error body: {}", e);
                    format!("<unreadable response body: {}>", e)
                }
            };
            log::warn!("Provider rejected image edit: {} {}", status, body);
            return Err(RelayError::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RelayError::from_transport("Image edit failed", e))?;
        let parsed: ProviderImageResponse = serde_json::from_slice(&bytes)?;
        log::debug!("Provider returned {} result item(s)", parsed.data.len());

        Ok(parsed)
    }

    fn name(&self) -> &str {
        "openai"
    }
}
