use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Physical storage bucket for a food item. Rows stored without a choice land on the shelf.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageLocation {
    #[default]
    #[serde(rename = "S", alias = "Shelf", alias = "shelf")]
    Shelf,
    #[serde(rename = "R", alias = "Refrigerate", alias = "refrigerate")]
    Refrigerate,
    #[serde(rename = "F", alias = "Freeze", alias = "freeze")]
    Freeze,
}

impl StorageLocation {
    pub const ALL: [StorageLocation; 3] = [
        StorageLocation::Shelf,
        StorageLocation::Refrigerate,
        StorageLocation::Freeze,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            StorageLocation::Shelf => "S",
            StorageLocation::Refrigerate => "R",
            StorageLocation::Freeze => "F",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StorageLocation::Shelf => "Shelf",
            StorageLocation::Refrigerate => "Fridge",
            StorageLocation::Freeze => "Freezer",
        }
    }
}

impl fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for StorageLocation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "s" | "shelf" | "pantry" => Ok(StorageLocation::Shelf),
            "r" | "refrigerate" | "fridge" => Ok(StorageLocation::Refrigerate),
            "f" | "freeze" | "freezer" => Ok(StorageLocation::Freeze),
            other => Err(format!("unknown storage location: {other}")),
        }
    }
}

/// A persisted inventory record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub name: String,
    #[serde(default, deserialize_with = "lenient_date::deserialize")]
    pub date_bought: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_date::deserialize")]
    pub estimated_expiration: Option<NaiveDate>,
    #[serde(default)]
    pub price: f64,
    #[serde(default, deserialize_with = "lenient_location")]
    pub storage_location: StorageLocation,
    pub user_uuid: String,
}

/// One reviewed item inside a finalize request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalizeItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_expiration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_location: Option<StorageLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_bought: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemsJson {
    pub items: Vec<FinalizeItem>,
}

/// Body of `POST {items_prefix}/finalize-items`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalizeRequest {
    pub user_uuid: String,
    pub items_json: ItemsJson,
}

/// Reply to a finalize call. The backend reports insert failures inside a
/// 200 reply as `{"status": "error", "message": ...}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinalizeAck {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, alias = "result")]
    pub items: Vec<serde_json::Value>,
    #[serde(default)]
    pub message: String,
}

impl FinalizeAck {
    pub const NOTHING_INSERTED: &'static str = "no items to insert";

    /// Turns an error-status reply into `StorageError::Rejected`.
    pub fn into_result(self) -> Result<Self, crate::StorageError> {
        if self.status.as_deref() == Some("error") {
            let message = if self.message.is_empty() {
                "finalize failed".to_string()
            } else {
                self.message
            };
            return Err(crate::StorageError::Rejected(message));
        }
        Ok(self)
    }

    pub fn inserted_nothing(&self) -> bool {
        self.status.as_deref() == Some(Self::NOTHING_INSERTED)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_uuid: Option<String>,
    pub title: String,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default, alias = "cookTime")]
    pub cook_time: String,
    #[serde(default, deserialize_with = "lenient_difficulty")]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub servings: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Recipe {
    pub fn empty() -> Self {
        Self {
            id: None,
            user_uuid: None,
            title: String::new(),
            ingredients: Vec::new(),
            steps: Vec::new(),
            cook_time: String::new(),
            difficulty: None,
            servings: 0,
            url: None,
        }
    }

    /// Identity used for bookmarking: the database id when known, else title + source url.
    pub fn same_recipe(&self, other: &Recipe) -> bool {
        match (self.id, other.id) {
            (Some(a), Some(b)) => a == b,
            _ => self.title == other.title && self.url == other.url,
        }
    }
}

/// Saved-recipe search filter. `difficulty: None` means all difficulties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeQuery {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "searchQuery")]
    pub search: String,
    #[serde(with = "difficulty_filter")]
    pub difficulty: Option<Difficulty>,
    #[serde(rename = "minServings")]
    pub min_servings: u32,
}

impl RecipeQuery {
    pub const MIN_SERVINGS_RANGE: (u32, u32) = (1, 10);

    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            search: String::new(),
            difficulty: None,
            min_servings: Self::MIN_SERVINGS_RANGE.0,
        }
    }

    pub fn with_min_servings(mut self, servings: u32) -> Self {
        let (lo, hi) = Self::MIN_SERVINGS_RANGE;
        self.min_servings = servings.clamp(lo, hi);
        self
    }

    pub fn matches(&self, recipe: &Recipe) -> bool {
        if let Some(owner) = &recipe.user_uuid {
            if owner != &self.user_id {
                return false;
            }
        }
        if let Some(d) = self.difficulty {
            if recipe.difficulty != Some(d) {
                return false;
            }
        }
        if recipe.servings < self.min_servings {
            return false;
        }
        let needle = self.search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        recipe.title.to_lowercase().contains(&needle)
            || recipe
                .ingredients
                .iter()
                .any(|i| i.to_lowercase().contains(&needle))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Accepts `YYYY-MM-DD`, a datetime whose prefix is a date, `null`, or an empty string.
pub mod lenient_date {
    use super::*;

    pub fn parse(raw: &str) -> Option<NaiveDate> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Some(d);
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(dt.date());
        }
        if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
            return Some(dt.date_naive());
        }
        raw.get(..10)
            .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(s) if s.trim().is_empty() => Ok(None),
            Some(s) => parse(&s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {s}"))),
        }
    }
}

/// `null`, empty and unknown codes fall back to the default location.
fn lenient_location<'de, D>(deserializer: D) -> Result<StorageLocation, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()).unwrap_or_default())
}

fn lenient_difficulty<'de, D>(deserializer: D) -> Result<Option<Difficulty>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()))
}

mod difficulty_filter {
    use super::Difficulty;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<Difficulty>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(d) => serializer.serialize_str(&d.to_string()),
            None => serializer.serialize_str("All"),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Difficulty>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(raw.parse().ok())
    }
}
