use crate::models::{
    lenient_date, FinalizeAck, FinalizeRequest, Item, Profile, Recipe, RecipeQuery,
};
use crate::{ItemStore, ProfileStore, RecipeStore, StorageError};
use chrono::{Local, NaiveDate};
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    items: Vec<Item>,
    next_item_id: i64,
    saved: Vec<(String, Recipe)>,
    next_recipe_id: i64,
    profiles: Vec<Profile>,
}

/// In-process store applying the same rules as the hosted backend.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn profiles(&self) -> Vec<Profile> {
        self.tables.read().await.profiles.clone()
    }
}

#[async_trait::async_trait]
impl ItemStore for MemoryStore {
    async fn get_items(&self, user_uuid: &str) -> Result<Vec<Item>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables
            .items
            .iter()
            .filter(|i| i.user_uuid == user_uuid)
            .cloned()
            .collect())
    }

    async fn finalize_items(&self, request: &FinalizeRequest) -> Result<FinalizeAck, StorageError> {
        let today = Local::now().date_naive();
        let mut rows = Vec::new();
        for item in &request.items_json.items {
            if item.name.trim().is_empty() {
                continue;
            }
            rows.push((
                item,
                strict_date(item.date_bought.as_deref())?,
                strict_date(item.estimated_expiration.as_deref())?,
            ));
        }

        if rows.is_empty() {
            return Ok(FinalizeAck {
                status: Some(FinalizeAck::NOTHING_INSERTED.to_string()),
                items: Vec::new(),
                message: String::new(),
            });
        }

        // Every row is validated before the first insert, so a bad row inserts nothing.
        let mut tables = self.tables.write().await;
        let mut values = Vec::with_capacity(rows.len());
        for (item, bought, expires) in rows {
            tables.next_item_id += 1;
            let row = Item {
                id: tables.next_item_id,
                name: item.name.clone(),
                date_bought: Some(bought.unwrap_or(today)),
                estimated_expiration: expires,
                price: item.price.unwrap_or(0.0),
                storage_location: item.storage_location.unwrap_or_default(),
                user_uuid: request.user_uuid.clone(),
            };
            values.push(serde_json::to_value(&row).unwrap_or_default());
            tables.items.push(row);
        }
        Ok(FinalizeAck {
            status: Some("success".to_string()),
            items: values,
            message: String::new(),
        })
    }
}

/// Blank is absent; anything else must be a date, as the backend's date columns require.
fn strict_date(raw: Option<&str>) -> Result<Option<NaiveDate>, StorageError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => lenient_date::parse(value)
            .map(Some)
            .ok_or_else(|| StorageError::Rejected(format!("invalid input syntax for type date: \"{value}\""))),
    }
}

#[async_trait::async_trait]
impl RecipeStore for MemoryStore {
    async fn set_bookmark(
        &self,
        user_id: &str,
        recipe: &Recipe,
        saved: bool,
    ) -> Result<(), StorageError> {
        let mut tables = self.tables.write().await;
        let existing = tables
            .saved
            .iter()
            .position(|(owner, r)| owner == user_id && r.same_recipe(recipe));
        match (saved, existing) {
            (true, None) => {
                tables.next_recipe_id += 1;
                let mut stored = recipe.clone();
                stored.id = Some(stored.id.unwrap_or(tables.next_recipe_id));
                stored.user_uuid = Some(user_id.to_string());
                tables.saved.push((user_id.to_string(), stored));
            }
            (false, Some(idx)) => {
                tables.saved.remove(idx);
            }
            _ => {}
        }
        Ok(())
    }

    async fn search_recipes(&self, query: &RecipeQuery) -> Result<Vec<Recipe>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables
            .saved
            .iter()
            .filter(|(owner, r)| owner == &query.user_id && query.matches(r))
            .map(|(_, r)| r.clone())
            .collect())
    }
}

#[async_trait::async_trait]
impl ProfileStore for MemoryStore {
    async fn create_profile(&self, profile: &Profile) -> Result<serde_json::Value, StorageError> {
        let mut tables = self.tables.write().await;
        if tables.profiles.iter().any(|p| p.id == profile.id) {
            return Err(StorageError::Status {
                status: 409,
                body: format!("profile {} already exists", profile.id),
            });
        }
        tables.profiles.push(profile.clone());
        serde_json::to_value(vec![profile]).map_err(|e| StorageError::InvalidResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Difficulty, FinalizeItem, ItemsJson, StorageLocation};

    fn request(items: Vec<FinalizeItem>) -> FinalizeRequest {
        FinalizeRequest {
            user_uuid: "user-1".into(),
            items_json: ItemsJson { items },
        }
    }

    fn finalize_item(name: &str) -> FinalizeItem {
        FinalizeItem {
            name: name.into(),
            estimated_expiration: None,
            storage_location: None,
            date_bought: None,
            price: None,
        }
    }

    #[tokio::test]
    async fn finalize_skips_nameless_items_and_defaults_fields() {
        let store = MemoryStore::new();
        let mut milk = finalize_item("milk");
        milk.estimated_expiration = Some("2025-10-20".into());
        milk.storage_location = Some(StorageLocation::Refrigerate);
        let ack = store
            .finalize_items(&request(vec![milk, finalize_item("  ")]))
            .await
            .unwrap();
        assert_eq!(ack.status.as_deref(), Some("success"));
        assert_eq!(ack.items.len(), 1);

        let items = store.get_items("user-1").await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].price, 0.0);
        assert!(items[0].date_bought.is_some());
        assert_eq!(items[0].storage_location, StorageLocation::Refrigerate);
        assert_eq!(items[0].estimated_expiration, NaiveDate::from_ymd_opt(2025, 10, 20));
        assert!(store.get_items("someone-else").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn finalize_rejects_unparseable_dates_without_inserting() {
        let store = MemoryStore::new();
        let mut milk = finalize_item("milk");
        milk.estimated_expiration = Some("about a week".into());
        let err = store
            .finalize_items(&request(vec![finalize_item("eggs"), milk]))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Rejected(ref m) if m.contains("about a week")));
        assert!(store.get_items("user-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn finalize_without_storage_choice_lands_on_shelf() {
        let store = MemoryStore::new();
        store
            .finalize_items(&request(vec![finalize_item("rice")]))
            .await
            .unwrap();
        let items = store.get_items("user-1").await.unwrap();
        assert_eq!(items[0].storage_location, StorageLocation::Shelf);
    }

    #[tokio::test]
    async fn finalize_with_nothing_insertable_reports_status() {
        let store = MemoryStore::new();
        let ack = store.finalize_items(&request(vec![])).await.unwrap();
        assert_eq!(ack.status.as_deref(), Some("no items to insert"));
    }

    #[tokio::test]
    async fn bookmark_is_idempotent_both_ways() {
        let store = MemoryStore::new();
        let mut recipe = Recipe::empty();
        recipe.title = "Soup".into();
        recipe.servings = 4;
        recipe.difficulty = Some(Difficulty::Easy);

        store.set_bookmark("u", &recipe, true).await.unwrap();
        store.set_bookmark("u", &recipe, true).await.unwrap();
        let found = store.search_recipes(&RecipeQuery::new("u")).await.unwrap();
        assert_eq!(found.len(), 1);

        store.set_bookmark("u", &recipe, false).await.unwrap();
        store.set_bookmark("u", &recipe, false).await.unwrap();
        assert!(store.search_recipes(&RecipeQuery::new("u")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_profile_is_rejected() {
        let store = MemoryStore::new();
        let profile = Profile {
            id: "abc".into(),
            username: "sam".into(),
            avatar: None,
        };
        store.create_profile(&profile).await.unwrap();
        let err = store.create_profile(&profile).await.unwrap_err();
        assert!(matches!(err, StorageError::Status { status: 409, .. }));
    }
}
