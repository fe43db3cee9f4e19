use crate::{ImageInput, ProviderError, VisionProvider};

/// Used when no vision credential is configured; every analysis fails.
#[derive(Debug, Default)]
pub struct NoopProvider;

#[async_trait::async_trait]
impl VisionProvider for NoopProvider {
    async fn analyze(&self, _image: &ImageInput, _prompt: &str) -> Result<String, ProviderError> {
        Err(ProviderError::NotImplemented)
    }
}
