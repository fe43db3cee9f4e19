//! Recipe capture from cooking videos, manual entry, bookmarks and saved search.

use providers::gem::{GeneratedRecipe, RecipeGenerator};
use regex::RegexSet;
use std::fmt;
use std::sync::{Arc, OnceLock};
use storage::models::{Difficulty, Recipe, RecipeQuery};
use storage::{RecipeStore, StorageError};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("please enter a video URL")]
    EmptyUrl,
    #[error("not a YouTube, Instagram or TikTok video link: {0}")]
    InvalidUrl(String),
    #[error("please enter a recipe title")]
    MissingTitle,
    #[error("please enter at least one ingredient")]
    MissingIngredients,
    #[error("please enter at least one step")]
    MissingSteps,
    #[error("no line at index {0}")]
    NoSuchLine(usize),
    #[error(transparent)]
    Store(#[from] StorageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    YouTube,
    Instagram,
    TikTok,
    Unknown,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::YouTube => "YouTube",
            Platform::Instagram => "Instagram",
            Platform::TikTok => "TikTok",
            Platform::Unknown => "Unknown",
        }
    }

    pub fn detect(url: &str) -> Self {
        if url.contains("youtube.com") || url.contains("youtu.be") {
            Platform::YouTube
        } else if url.contains("instagram.com") {
            Platform::Instagram
        } else if url.contains("tiktok.com") {
            Platform::TikTok
        } else {
            Platform::Unknown
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static VIDEO_PATTERNS: OnceLock<RegexSet> = OnceLock::new();

fn video_patterns() -> &'static RegexSet {
    VIDEO_PATTERNS.get_or_init(|| {
        RegexSet::new([
            r"^https?://(www\.)?(youtube\.com|youtu\.be)/.+",
            r"^https?://(www\.)?instagram\.com/(reel|p)/.+",
            r"^https?://(www\.)?tiktok\.com/@.+/video/.+",
            r"^https?://(vm\.)?tiktok\.com/.+",
        ])
        .expect("video url patterns compile")
    })
}

/// Checks `url` against the supported platforms without touching the network.
pub fn validate_video_url(url: &str) -> Result<Platform, RecipeError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(RecipeError::EmptyUrl);
    }
    if !video_patterns().is_match(url) {
        return Err(RecipeError::InvalidUrl(url.to_string()));
    }
    Ok(Platform::detect(url))
}

pub fn recipe_from_generated(generated: GeneratedRecipe, url: Option<String>) -> Recipe {
    Recipe {
        id: None,
        user_uuid: None,
        title: generated.title,
        ingredients: generated.ingredients,
        steps: generated.steps,
        cook_time: generated.cook_time,
        difficulty: generated.difficulty.parse().ok(),
        servings: generated.servings,
        url,
    }
}

/// Shown when generation cannot reach the backend.
pub fn sample_recipe() -> Recipe {
    let lines = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    Recipe {
        title: "Chocolate Chip Cookies".to_string(),
        ingredients: lines(&[
            "2¼ cups all-purpose flour",
            "1 cup butter, softened",
            "¾ cup granulated sugar",
            "¾ cup brown sugar",
            "2 large eggs",
            "2 tsp vanilla extract",
            "1 tsp baking soda",
            "1 tsp salt",
            "2 cups chocolate chips",
        ]),
        steps: lines(&[
            "Preheat oven to 375°F (190°C)",
            "Mix butter and sugars until creamy",
            "Beat in eggs and vanilla",
            "Combine flour, baking soda, and salt in separate bowl",
            "Gradually add dry ingredients to wet mixture",
            "Stir in chocolate chips",
            "Drop rounded tablespoons onto ungreased baking sheets",
            "Bake 9-11 minutes until golden brown",
            "Cool on baking sheet for 2 minutes, then transfer to wire rack",
        ]),
        cook_time: "25 minutes".to_string(),
        difficulty: Some(Difficulty::Easy),
        servings: 24,
        ..Recipe::empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    Generated {
        recipe: Recipe,
        transcript: Option<String>,
    },
    /// The backend answered but could not produce a recipe.
    Failed {
        message: String,
        transcript: Option<String>,
        recipe: Recipe,
    },
    /// The backend was unreachable or answered garbage.
    Demo { recipe: Recipe },
}

impl CaptureOutcome {
    pub fn recipe(&self) -> &Recipe {
        match self {
            CaptureOutcome::Generated { recipe, .. }
            | CaptureOutcome::Failed { recipe, .. }
            | CaptureOutcome::Demo { recipe } => recipe,
        }
    }

    pub fn status_message(&self) -> String {
        match self {
            CaptureOutcome::Generated { .. } => "Recipe generated successfully!".to_string(),
            CaptureOutcome::Failed { message, .. } => message.clone(),
            CaptureOutcome::Demo { .. } => "Demo mode, showing sample recipe".to_string(),
        }
    }
}

pub struct RecipeCapture {
    generator: Arc<dyn RecipeGenerator>,
}

impl RecipeCapture {
    pub fn new(generator: Arc<dyn RecipeGenerator>) -> Self {
        Self { generator }
    }

    pub async fn generate(&self, video_url: &str) -> Result<CaptureOutcome, RecipeError> {
        let platform = validate_video_url(video_url)?;
        let video_url = video_url.trim();
        debug!(%platform, "generating recipe");

        let generation = match self.generator.generate_recipe(video_url, platform.as_str()).await {
            Ok(g) => g,
            Err(e) => {
                warn!(error = %e, "recipe generation unavailable, using sample recipe");
                return Ok(CaptureOutcome::Demo {
                    recipe: sample_recipe(),
                });
            }
        };

        match (generation.success, generation.recipe) {
            (true, Some(generated)) => {
                let recipe = recipe_from_generated(generated, Some(video_url.to_string()));
                info!(title = %recipe.title, "recipe generated");
                Ok(CaptureOutcome::Generated {
                    recipe,
                    transcript: generation.transcript,
                })
            }
            _ => Ok(CaptureOutcome::Failed {
                message: generation
                    .error
                    .unwrap_or_else(|| "Failed to generate recipe.".to_string()),
                transcript: generation.transcript,
                recipe: Recipe::empty(),
            }),
        }
    }
}

/// Manually typed recipe. Starts with one blank ingredient and step line.
#[derive(Debug, Clone, PartialEq)]
pub struct ManualRecipeDraft {
    pub title: String,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
    pub cook_time: String,
    pub servings: u32,
    pub difficulty: Option<Difficulty>,
}

impl Default for ManualRecipeDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            ingredients: vec![String::new()],
            steps: vec![String::new()],
            cook_time: String::new(),
            servings: 1,
            difficulty: None,
        }
    }
}

impl ManualRecipeDraft {
    pub fn add_ingredient(&mut self) {
        self.ingredients.push(String::new());
    }

    pub fn add_step(&mut self) {
        self.steps.push(String::new());
    }

    pub fn set_ingredient(&mut self, index: usize, value: impl Into<String>) -> Result<(), RecipeError> {
        let line = self
            .ingredients
            .get_mut(index)
            .ok_or(RecipeError::NoSuchLine(index))?;
        *line = value.into();
        Ok(())
    }

    pub fn set_step(&mut self, index: usize, value: impl Into<String>) -> Result<(), RecipeError> {
        let line = self.steps.get_mut(index).ok_or(RecipeError::NoSuchLine(index))?;
        *line = value.into();
        Ok(())
    }

    /// Non-numeric input falls back to one serving.
    pub fn set_servings(&mut self, raw: &str) {
        self.servings = raw.trim().parse().ok().filter(|n| *n > 0).unwrap_or(1);
    }

    pub fn submit(&self) -> Result<Recipe, RecipeError> {
        if self.title.trim().is_empty() {
            return Err(RecipeError::MissingTitle);
        }
        if self.ingredients.is_empty() || self.ingredients.iter().any(|i| i.trim().is_empty()) {
            return Err(RecipeError::MissingIngredients);
        }
        if self.steps.is_empty() || self.steps.iter().any(|s| s.trim().is_empty()) {
            return Err(RecipeError::MissingSteps);
        }
        Ok(Recipe {
            title: self.title.trim().to_string(),
            ingredients: self.ingredients.iter().map(|i| i.trim().to_string()).collect(),
            steps: self.steps.iter().map(|s| s.trim().to_string()).collect(),
            cook_time: self.cook_time.trim().to_string(),
            difficulty: self.difficulty,
            servings: self.servings,
            ..Recipe::empty()
        })
    }
}

/// Local view of whether the current recipe is saved. Only changes after the
/// store confirms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bookmark {
    saved: bool,
}

impl Bookmark {
    pub fn new(saved: bool) -> Self {
        Self { saved }
    }

    pub fn is_saved(&self) -> bool {
        self.saved
    }

    pub async fn set(
        &mut self,
        store: &dyn RecipeStore,
        user_id: &str,
        recipe: &Recipe,
        saved: bool,
    ) -> Result<&'static str, RecipeError> {
        store.set_bookmark(user_id, recipe, saved).await?;
        self.saved = saved;
        Ok(if saved {
            "Recipe saved!"
        } else {
            "Recipe removed from saved!"
        })
    }

    pub async fn toggle(
        &mut self,
        store: &dyn RecipeStore,
        user_id: &str,
        recipe: &Recipe,
    ) -> Result<&'static str, RecipeError> {
        let target = !self.saved;
        self.set(store, user_id, recipe, target).await
    }
}

pub async fn search_saved(store: &dyn RecipeStore, query: &RecipeQuery) -> Result<Vec<Recipe>, RecipeError> {
    let found = store.search_recipes(query).await?;
    debug!(count = found.len(), search = %query.search, "saved recipes searched");
    Ok(found)
}
