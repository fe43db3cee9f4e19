use crate::models::{FinalizeAck, FinalizeRequest, Item, Profile, Recipe, RecipeQuery};
use crate::{ItemStore, ProfileStore, RecipeStore, StorageError};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub base_url: String,
    /// Route prefix of the item endpoints (`/items` or `/item` depending on deployment).
    pub items_prefix: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            items_prefix: "/items".to_string(),
        }
    }
}

/// Gateway to the hosted backend's item, recipe and profile routes.
#[derive(Clone)]
pub struct BackendStore {
    client: Client,
    cfg: Arc<BackendConfig>,
}

impl BackendStore {
    pub fn new(cfg: BackendConfig) -> Self {
        Self {
            client: Client::new(),
            cfg: Arc::new(cfg),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.cfg.base_url.trim_end_matches('/'), path)
    }

    fn items_url(&self, route: &str) -> String {
        let prefix = self.cfg.items_prefix.trim_end_matches('/');
        self.url(&format!("{prefix}/{route}"))
    }
}

async fn check(resp: Response) -> Result<Response, StorageError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    Err(StorageError::Status { status, body })
}

#[derive(Serialize)]
struct BookmarkBody<'a> {
    recipe: &'a Recipe,
    #[serde(rename = "userId")]
    user_id: &'a str,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SearchResponse {
    List(Vec<Recipe>),
    Wrapped { recipes: Vec<Recipe> },
}

#[async_trait::async_trait]
impl ItemStore for BackendStore {
    async fn get_items(&self, user_uuid: &str) -> Result<Vec<Item>, StorageError> {
        let resp = self
            .client
            .get(self.items_url("get-items"))
            .query(&[("user_uuid", user_uuid)])
            .send()
            .await?;
        let value: serde_json::Value = check(resp).await?.json().await?;
        if !value.is_array() {
            return Err(StorageError::InvalidResponse(format!(
                "expected an item array, got {value}"
            )));
        }
        let items: Vec<Item> = serde_json::from_value(value)
            .map_err(|e| StorageError::InvalidResponse(e.to_string()))?;
        debug!(count = items.len(), "fetched items");
        Ok(items)
    }

    async fn finalize_items(&self, request: &FinalizeRequest) -> Result<FinalizeAck, StorageError> {
        let resp = self
            .client
            .post(self.items_url("finalize-items"))
            .json(request)
            .send()
            .await?;
        let ack: FinalizeAck = check(resp).await?.json().await?;
        ack.into_result()
    }
}

#[async_trait::async_trait]
impl RecipeStore for BackendStore {
    async fn set_bookmark(
        &self,
        user_id: &str,
        recipe: &Recipe,
        saved: bool,
    ) -> Result<(), StorageError> {
        let route = if saved {
            "/user/save_recipe"
        } else {
            "/user/delete_recipe"
        };
        let resp = self
            .client
            .post(self.url(route))
            .json(&BookmarkBody { recipe, user_id })
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }

    async fn search_recipes(&self, query: &RecipeQuery) -> Result<Vec<Recipe>, StorageError> {
        let resp = self
            .client
            .post(self.url("/user/search_recipes"))
            .json(query)
            .send()
            .await?;
        let parsed: SearchResponse = check(resp).await?.json().await?;
        Ok(match parsed {
            SearchResponse::List(recipes) => recipes,
            SearchResponse::Wrapped { recipes } => recipes,
        })
    }
}

#[async_trait::async_trait]
impl ProfileStore for BackendStore {
    async fn create_profile(&self, profile: &Profile) -> Result<serde_json::Value, StorageError> {
        let resp = self
            .client
            .post(self.url("/user/create_profile"))
            .json(profile)
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }
}
