use crate::image::{read_image, to_part};
use crate::{check_status, ProviderError};
use reqwest::multipart::Form;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAnalysisResult {
    #[serde(default)]
    pub success: bool,
    pub analysis: String,
    pub filename: String,
    pub size: u64,
}

/// One entry of a batch reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedImage {
    pub filename: String,
    pub analysis: String,
    pub size: u64,
}

impl From<ImageAnalysisResult> for AnalyzedImage {
    fn from(r: ImageAnalysisResult) -> Self {
        Self {
            filename: r.filename,
            analysis: r.analysis,
            size: r.size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipleImagesResult {
    pub success: bool,
    pub results: Vec<AnalyzedImage>,
    pub total_images: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
}

/// Client for the image upload proxy (`/api/*`).
#[derive(Clone)]
pub struct ProxyClient {
    client: Client,
    base_url: String,
}

impl ProxyClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    fn url(&self, route: &str) -> String {
        format!("{}/api/{}", self.base_url.trim_end_matches('/'), route)
    }

    pub async fn analyze_image(
        &self,
        image: &Path,
        prompt: Option<&str>,
    ) -> Result<ImageAnalysisResult, ProviderError> {
        let input = read_image(image).await?;
        let mut form = Form::new().part("image", to_part(&input)?);
        if let Some(p) = prompt {
            form = form.text("prompt", p.to_string());
        }
        let resp = self
            .client
            .post(self.url("analyze-image"))
            .multipart(form)
            .send()
            .await?;
        check_status(resp)
            .await?
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }

    pub async fn analyze_images(
        &self,
        images: &[PathBuf],
        prompt: Option<&str>,
    ) -> Result<MultipleImagesResult, ProviderError> {
        let mut form = Form::new();
        for path in images {
            let input = read_image(path).await?;
            form = form.part("images", to_part(&input)?);
        }
        if let Some(p) = prompt {
            form = form.text("prompt", p.to_string());
        }
        let resp = self
            .client
            .post(self.url("analyze-images"))
            .multipart(form)
            .send()
            .await?;
        check_status(resp)
            .await?
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }

    pub async fn check_health(&self) -> Result<HealthStatus, ProviderError> {
        let resp = self.client.get(self.url("health")).send().await?;
        check_status(resp)
            .await?
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }
}
