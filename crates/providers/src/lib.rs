//! Provider abstractions for vision models and the Gobble inference routes.

use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

pub mod gem;
pub mod gemini;
pub mod image;
pub mod noop;
pub mod proxy;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("not implemented")]
    NotImplemented,
    #[error("request failed: {0}")]
    RequestFailed(String),
    #[error("status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        ProviderError::RequestFailed(e.to_string())
    }
}

/// Turns a non-2xx response into `ProviderError::Status` carrying the body text.
pub(crate) async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    Err(ProviderError::Status { status, body })
}

/// One image held in memory, as uploaded.
#[derive(Debug, Clone)]
pub struct ImageInput {
    pub filename: String,
    pub mime_type: String,
    pub data: Bytes,
}

impl ImageInput {
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

#[async_trait::async_trait]
pub trait VisionProvider: Send + Sync {
    /// Runs `prompt` against `image` and returns the model's text.
    async fn analyze(&self, image: &ImageInput, prompt: &str) -> Result<String, ProviderError>;
}

#[derive(Default, Clone)]
pub struct ProviderRegistry {
    vision: HashMap<String, Arc<dyn VisionProvider>>,
    pub preferred_vision: Option<String>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vision(mut self, name: &str, provider: Arc<dyn VisionProvider>) -> Self {
        self.vision.insert(name.to_string(), provider);
        self
    }

    pub fn set_preferred_vision(mut self, name: &str) -> Self {
        self.preferred_vision = Some(name.to_string());
        self
    }

    pub fn vision(&self, name: Option<&str>) -> Result<Arc<dyn VisionProvider>, ProviderError> {
        let key = name
            .map(str::to_string)
            .or_else(|| self.preferred_vision.clone())
            .ok_or_else(|| ProviderError::UnknownProvider("no vision provider configured".into()))?;
        self.vision
            .get(&key)
            .cloned()
            .ok_or_else(|| ProviderError::UnknownProvider(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noop::NoopProvider;

    #[test]
    fn registry_falls_back_to_preferred() {
        let reg = ProviderRegistry::new()
            .with_vision("noop", Arc::new(NoopProvider))
            .set_preferred_vision("noop");
        assert!(reg.vision(None).is_ok());
        assert!(matches!(
            reg.vision(Some("gemini")),
            Err(ProviderError::UnknownProvider(name)) if name == "gemini"
        ));
    }

    #[test]
    fn registry_without_preference_errors() {
        let reg = ProviderRegistry::new().with_vision("noop", Arc::new(NoopProvider));
        assert!(reg.vision(None).is_err());
    }
}
