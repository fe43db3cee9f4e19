use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use storage::models::{
    FinalizeItem, FinalizeRequest, ItemsJson, Recipe, RecipeQuery, StorageLocation,
};
use storage::{BackendConfig, BackendStore, ItemStore, RecipeStore, StorageError};

type Seen = Arc<Mutex<Vec<(String, serde_json::Value)>>>;

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn stub(seen: Seen) -> Router {
    Router::new()
        .route(
            "/items/get-items",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                if q.get("user_uuid").map(String::as_str) != Some("user-1") {
                    return (StatusCode::BAD_REQUEST, "unknown user".to_string());
                }
                (
                    StatusCode::OK,
                    serde_json::json!([{
                        "id": 1,
                        "name": "yogurt",
                        "date_bought": "2025-10-01",
                        "estimated_expiration": "2025-10-09",
                        "price": 1.25,
                        "storage_location": "R",
                        "user_uuid": "user-1"
                    }])
                    .to_string(),
                )
            }),
        )
        .route(
            "/items/finalize-items",
            post(
                |State(seen): State<Seen>, Json(body): Json<serde_json::Value>| async move {
                    seen.lock().unwrap().push(("finalize".into(), body));
                    Json(serde_json::json!({"status": "success", "items": [], "message": ""}))
                },
            ),
        )
        .route(
            "/user/save_recipe",
            post(
                |State(seen): State<Seen>, Json(body): Json<serde_json::Value>| async move {
                    seen.lock().unwrap().push(("save".into(), body));
                    Json(serde_json::json!({"success": true}))
                },
            ),
        )
        .route(
            "/user/delete_recipe",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "db down") }),
        )
        .route(
            "/user/search_recipes",
            post(|| async {
                Json(serde_json::json!({"recipes": [{
                    "id": 3, "title": "Stew", "ingredients": [], "steps": [],
                    "cook_time": "1h", "difficulty": "Hard", "servings": 6
                }]}))
            }),
        )
        .with_state(seen)
}

fn store(base_url: String) -> BackendStore {
    BackendStore::new(BackendConfig {
        base_url,
        items_prefix: "/items".into(),
    })
}

#[tokio::test]
async fn get_items_decodes_inventory() {
    let seen: Seen = Arc::default();
    let store = store(spawn(stub(seen)).await);
    let items = store.get_items("user-1").await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].storage_location, StorageLocation::Refrigerate);

    let err = store.get_items("nobody").await.unwrap_err();
    match err {
        StorageError::Status { status, body } => {
            assert_eq!(status, 400);
            assert_eq!(body, "unknown user");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn finalize_posts_items_json_envelope() {
    let seen: Seen = Arc::default();
    let store = store(spawn(stub(seen.clone())).await);
    let request = FinalizeRequest {
        user_uuid: "user-1".into(),
        items_json: ItemsJson {
            items: vec![FinalizeItem {
                name: "bread".into(),
                estimated_expiration: None,
                storage_location: Some(StorageLocation::Shelf),
                date_bought: None,
                price: None,
            }],
        },
    };
    let ack = store.finalize_items(&request).await.unwrap();
    assert_eq!(ack.status.as_deref(), Some("success"));

    let seen = seen.lock().unwrap();
    let (kind, body) = &seen[0];
    assert_eq!(kind, "finalize");
    assert_eq!(body["user_uuid"], "user-1");
    assert_eq!(body["items_json"]["items"][0]["storage_location"], "S");
}

#[tokio::test]
async fn finalize_error_status_in_ok_reply_is_rejected() {
    let app = Router::new().route(
        "/item/finalize-items",
        post(|| async {
            Json(serde_json::json!({
                "status": "error",
                "message": "invalid input syntax for type date"
            }))
        }),
    );
    let store = BackendStore::new(BackendConfig {
        base_url: spawn(app).await,
        items_prefix: "/item/".into(),
    });
    let request = FinalizeRequest {
        user_uuid: "user-1".into(),
        items_json: ItemsJson {
            items: vec![FinalizeItem {
                name: "milk".into(),
                estimated_expiration: Some("2025-10-20".into()),
                storage_location: None,
                date_bought: None,
                price: None,
            }],
        },
    };
    let err = store.finalize_items(&request).await.unwrap_err();
    match err {
        StorageError::Rejected(message) => assert!(message.contains("type date")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn bookmark_routes_by_desired_state() {
    let seen: Seen = Arc::default();
    let store = store(spawn(stub(seen.clone())).await);
    let mut recipe = Recipe::empty();
    recipe.title = "Stew".into();

    store.set_bookmark("user-1", &recipe, true).await.unwrap();
    assert_eq!(seen.lock().unwrap()[0].1["userId"], "user-1");

    let err = store.set_bookmark("user-1", &recipe, false).await.unwrap_err();
    assert!(matches!(err, StorageError::Status { status: 500, .. }));
}

#[tokio::test]
async fn search_accepts_wrapped_recipe_list() {
    let seen: Seen = Arc::default();
    let store = store(spawn(stub(seen)).await);
    let found = store
        .search_recipes(&RecipeQuery::new("user-1"))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].title, "Stew");
}
