use crate::{
    error::Result,
    models::image::{ImageEditRequest, ProviderImageResponse},
};
use async_trait::async_trait;

#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// One edit call. No retries; a non-success status comes back as
    /// `RelayError::UpstreamStatus`.
    async fn edit(&self, request: ImageEditRequest) -> Result<ProviderImageResponse>;

    fn name(&self) -> &str;
}
