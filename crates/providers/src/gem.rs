//! Client for the backend's `/gem` inference routes: receipt parsing,
//! food-photo analysis and recipe generation from cooking videos.

use crate::image::{read_image, to_part};
use crate::{check_status, ProviderError};
use reqwest::multipart::Form;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct GemConfig {
    pub base_url: String,
}

/// One line item recognised on a receipt or in a photo.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReceiptItem {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub estimated_expiration: Option<String>,
    #[serde(default)]
    pub shelf_life_days: Option<i64>,
    #[serde(default)]
    pub date_bought: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedReceipt {
    #[serde(default)]
    pub items: Vec<ReceiptItem>,
}

/// `analysis` is structured when the model returned JSON, free text otherwise.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ImageAnalysis {
    Items(ParsedReceipt),
    Text(String),
}

impl ImageAnalysis {
    pub fn items(&self) -> &[ReceiptItem] {
        match self {
            ImageAnalysis::Items(parsed) => &parsed.items,
            ImageAnalysis::Text(_) => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedRecipe {
    pub title: String,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default, alias = "cookTime")]
    pub cook_time: String,
    #[serde(default)]
    pub servings: u32,
    #[serde(default)]
    pub difficulty: String,
}

/// The generation route has been seen returning the recipe wrapped in one or
/// more `{"recipe": ...}` layers.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawRecipeResponse {
    Wrapped { recipe: Box<RawRecipeResponse> },
    Recipe(GeneratedRecipe),
}

impl RawRecipeResponse {
    pub fn into_recipe(self) -> GeneratedRecipe {
        let mut current = self;
        loop {
            match current {
                RawRecipeResponse::Wrapped { recipe } => current = *recipe,
                RawRecipeResponse::Recipe(r) => return r,
            }
        }
    }
}

#[derive(Deserialize)]
struct GenerateRecipeWire {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    recipe: Option<RawRecipeResponse>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    transcript: Option<String>,
}

/// Normalised response of `POST /gem/generate-recipe`.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeGeneration {
    pub success: bool,
    pub recipe: Option<GeneratedRecipe>,
    pub error: Option<String>,
    pub transcript: Option<String>,
}

impl From<GenerateRecipeWire> for RecipeGeneration {
    fn from(w: GenerateRecipeWire) -> Self {
        Self {
            success: w.success,
            recipe: w.recipe.map(RawRecipeResponse::into_recipe),
            error: w.error,
            transcript: w.transcript,
        }
    }
}

#[async_trait::async_trait]
pub trait ReceiptParser: Send + Sync {
    async fn parse_receipt(&self, image: &Path, user_id: &str) -> Result<ParsedReceipt, ProviderError>;
}

#[async_trait::async_trait]
pub trait ImageAnalyzer: Send + Sync {
    async fn analyze_image(&self, image: &Path) -> Result<ImageAnalysis, ProviderError>;
}

#[async_trait::async_trait]
pub trait RecipeGenerator: Send + Sync {
    async fn generate_recipe(
        &self,
        video_url: &str,
        platform: &str,
    ) -> Result<RecipeGeneration, ProviderError>;
}

#[derive(Clone)]
pub struct GemClient {
    client: Client,
    cfg: Arc<GemConfig>,
}

impl GemClient {
    pub fn new(cfg: GemConfig) -> Self {
        Self {
            client: Client::new(),
            cfg: Arc::new(cfg),
        }
    }

    fn url(&self, route: &str) -> String {
        format!("{}/gem/{}", self.cfg.base_url.trim_end_matches('/'), route)
    }
}

#[async_trait::async_trait]
impl ReceiptParser for GemClient {
    async fn parse_receipt(&self, image: &Path, user_id: &str) -> Result<ParsedReceipt, ProviderError> {
        #[derive(Deserialize)]
        struct ParseResponse {
            #[serde(default)]
            parsed: ParsedReceipt,
        }

        let input = read_image(image).await?;
        let form = Form::new()
            .part("file", to_part(&input)?)
            .text("user_uuid", user_id.to_string());
        let resp = self
            .client
            .post(self.url("parse-receipt"))
            .multipart(form)
            .send()
            .await?;
        let parsed: ParseResponse = check_status(resp)
            .await?
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        debug!(items = parsed.parsed.items.len(), "receipt parsed");
        Ok(parsed.parsed)
    }
}

#[async_trait::async_trait]
impl ImageAnalyzer for GemClient {
    async fn analyze_image(&self, image: &Path) -> Result<ImageAnalysis, ProviderError> {
        #[derive(Deserialize)]
        struct AnalyzeResponse {
            analysis: ImageAnalysis,
        }

        let input = read_image(image).await?;
        let form = Form::new().part("file", to_part(&input)?);
        let resp = self
            .client
            .post(self.url("analyze-image"))
            .multipart(form)
            .send()
            .await?;
        let parsed: AnalyzeResponse = check_status(resp)
            .await?
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        Ok(parsed.analysis)
    }
}

#[async_trait::async_trait]
impl RecipeGenerator for GemClient {
    async fn generate_recipe(
        &self,
        video_url: &str,
        platform: &str,
    ) -> Result<RecipeGeneration, ProviderError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct GenerateBody<'a> {
            video_url: &'a str,
            platform: &'a str,
        }

        let resp = self
            .client
            .post(self.url("generate-recipe"))
            .json(&GenerateBody {
                video_url,
                platform,
            })
            .send()
            .await?;
        let wire: GenerateRecipeWire = check_status(resp)
            .await?
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        Ok(wire.into())
    }
}
