use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{RelayError, Result};

const BUNDLED_FALLBACK: &[u8] = include_bytes!("../../static/fallback.jpg");
pub const BUNDLED_FALLBACK_NAME: &str = "fallback.jpg";

/// An image handed to the relay, either uploaded or read from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadPayload {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub content_type: String,
}

impl UploadPayload {
    pub fn new(
        bytes: Vec<u8>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            bytes,
            file_name: file_name.into(),
            content_type: content_type.into(),
        }
    }

    /// Content type is guessed from the extension, `image/jpeg` when unknown.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image.jpg".to_string());
        let content_type = mime_guess::from_path(path)
            .first()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_else(|| "image/jpeg".to_string());

        Ok(Self::new(bytes, file_name, content_type))
    }

    pub fn bundled_fallback() -> Self {
        Self::new(BUNDLED_FALLBACK.to_vec(), BUNDLED_FALLBACK_NAME, "image/jpeg")
    }

    /// Decode a `data:<mime>;base64,<payload>` reference, as a browser
    /// produces when it reads a local file.
    pub fn from_data_uri(uri: &str, file_name: impl Into<String>) -> Result<Self> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| RelayError::InvalidInput("Image must be a data URI".into()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| RelayError::InvalidInput("Malformed data URI".into()))?;
        let content_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| RelayError::InvalidInput("Data URI must be base64 encoded".into()))?;
        let bytes = general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| RelayError::InvalidInput(format!("Invalid base64 image: {}", e)))?;

        let content_type = if content_type.is_empty() {
            "application/octet-stream"
        } else {
            content_type
        };
        Ok(Self::new(bytes, file_name, content_type))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Everything the provider's edit endpoint needs for one call.
#[derive(Debug, Clone)]
pub struct ImageEditRequest {
    pub image: UploadPayload,
    pub prompt: String,
    pub model: String,
    pub n: u32,
    pub size: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProviderImageResponse {
    #[serde(default)]
    pub data: Vec<ProviderImage>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProviderImage {
    #[serde(default)]
    pub b64_json: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageReference {
    /// Base64 PNG payload returned inline.
    Inline(String),
    Remote(String),
}

impl ImageReference {
    pub fn to_image_url(&self) -> String {
        match self {
            ImageReference::Inline(b64) => format!("data:image/png;base64,{}", b64),
            ImageReference::Remote(url) => url.clone(),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, ImageReference::Remote(_))
    }
}

impl ProviderImageResponse {
    /// First result wins; an inline payload is preferred over a hosted URL.
    pub fn into_image_reference(self) -> Result<ImageReference> {
        let first = self
            .data
            .into_iter()
            .next()
            .ok_or_else(|| RelayError::MalformedResponse("No image data received".into()))?;

        let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());
        match (non_empty(first.b64_json), non_empty(first.url)) {
            (Some(b64), _) => Ok(ImageReference::Inline(b64)),
            (None, Some(url)) => Ok(ImageReference::Remote(url)),
            (None, None) => Err(RelayError::MalformedResponse(
                "No valid image format received".into(),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub image_url: String,
}

impl From<&ImageReference> for GenerateResponse {
    fn from(reference: &ImageReference) -> Self {
        Self {
            image_url: reference.to_image_url(),
        }
    }
}
