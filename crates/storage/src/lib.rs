//! Storage layer: inventory, recipe and profile persistence.
//!
//! Durable state lives in the hosted backend; this crate holds the shared
//! data model and the gateways that read and write it.

use thiserror::Error;

pub mod backend;
pub mod memory;
pub mod models;

pub use backend::{BackendConfig, BackendStore};
pub use memory::MemoryStore;

use models::{FinalizeAck, FinalizeRequest, Item, Profile, Recipe, RecipeQuery};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("request failed: {0}")]
    RequestFailed(String),
    #[error("status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("rejected by backend: {0}")]
    Rejected(String),
}

impl From<reqwest::Error> for StorageError {
    fn from(e: reqwest::Error) -> Self {
        StorageError::RequestFailed(e.to_string())
    }
}

#[async_trait::async_trait]
pub trait ItemStore: Send + Sync {
    /// Full fetch of a user's inventory.
    async fn get_items(&self, user_uuid: &str) -> Result<Vec<Item>, StorageError>;
    async fn finalize_items(&self, request: &FinalizeRequest) -> Result<FinalizeAck, StorageError>;
}

#[async_trait::async_trait]
pub trait RecipeStore: Send + Sync {
    /// Idempotently sets whether `recipe` is saved for `user_id`.
    async fn set_bookmark(
        &self,
        user_id: &str,
        recipe: &Recipe,
        saved: bool,
    ) -> Result<(), StorageError>;
    async fn search_recipes(&self, query: &RecipeQuery) -> Result<Vec<Recipe>, StorageError>;
}

#[async_trait::async_trait]
pub trait ProfileStore: Send + Sync {
    async fn create_profile(&self, profile: &Profile) -> Result<serde_json::Value, StorageError>;
}
