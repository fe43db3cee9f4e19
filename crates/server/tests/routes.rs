use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use gobble_proxy::config::ServerConfig;
use gobble_proxy::routes::DEFAULT_PROMPT;
use gobble_proxy::state::AppState;
use providers::proxy::ProxyClient;
use providers::{ImageInput, ProviderError, VisionProvider};
use reqwest::multipart::{Form, Part};
use serde_json::Value;

#[derive(Default)]
struct FakeVision {
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

#[async_trait::async_trait]
impl VisionProvider for FakeVision {
    async fn analyze(&self, image: &ImageInput, prompt: &str) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        if image.filename.starts_with("broken") {
            return Err(ProviderError::Status {
                status: 400,
                body: "unsupported image".into(),
            });
        }
        Ok(format!("{} bytes of food", image.size()))
    }
}

async fn spawn(config: ServerConfig) -> (String, Arc<FakeVision>) {
    let vision = Arc::new(FakeVision::default());
    let state = AppState::with_provider(vision.clone(), config);
    let app = gobble_proxy::router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), vision)
}

fn jpeg(name: &str) -> Part {
    Part::bytes(b"\xFF\xD8\xFF\xE0fake-jpeg".to_vec())
        .file_name(name.to_string())
        .mime_str("image/jpeg")
        .unwrap()
}

#[tokio::test]
async fn single_image_without_prompt_uses_default() {
    let (base, vision) = spawn(ServerConfig::default()).await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("groceries.jpg");
    std::fs::write(&path, b"\xFF\xD8\xFF\xE0fake-jpeg").unwrap();

    let result = ProxyClient::new(&base).analyze_image(&path, None).await.unwrap();
    assert!(result.success);
    assert!(!result.analysis.is_empty());
    assert_eq!(result.filename, "groceries.jpg");
    assert_eq!(result.size, 13);
    assert_eq!(*vision.prompts.lock().unwrap(), vec![DEFAULT_PROMPT.to_string()]);
}

#[tokio::test]
async fn non_image_upload_never_reaches_provider() {
    let (base, vision) = spawn(ServerConfig::default()).await;
    let part = Part::bytes(b"hello".to_vec())
        .file_name("notes.txt")
        .mime_str("text/plain")
        .unwrap();
    let resp = reqwest::Client::new()
        .post(format!("{base}/api/analyze-image"))
        .multipart(Form::new().part("image", part))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Only image files are allowed");
    assert_eq!(vision.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_file_is_bad_request() {
    let (base, vision) = spawn(ServerConfig::default()).await;
    let resp = reqwest::Client::new()
        .post(format!("{base}/api/analyze-image"))
        .multipart(Form::new().text("prompt", "what is this"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "No image file provided");
    assert_eq!(vision.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn eleven_files_are_rejected() {
    let (base, vision) = spawn(ServerConfig::default()).await;
    let mut form = Form::new();
    for i in 0..11 {
        form = form.part("images", jpeg(&format!("photo-{i}.jpg")));
    }
    let resp = reqwest::Client::new()
        .post(format!("{base}/api/analyze-images"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(vision.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn oversized_file_is_rejected() {
    let config = ServerConfig {
        max_file_bytes: 8,
        ..ServerConfig::default()
    };
    let (base, vision) = spawn(config).await;
    let resp = reqwest::Client::new()
        .post(format!("{base}/api/analyze-image"))
        .multipart(Form::new().part("image", jpeg("big.jpg")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 413);
    assert_eq!(vision.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn upload_far_above_the_cap_is_cut_off() {
    let config = ServerConfig {
        max_file_bytes: 1024,
        ..ServerConfig::default()
    };
    let (base, vision) = spawn(config).await;
    let part = Part::bytes(vec![0xAB; 48 * 1024])
        .file_name("huge.jpg")
        .mime_str("image/jpeg")
        .unwrap();
    let resp = reqwest::Client::new()
        .post(format!("{base}/api/analyze-image"))
        .multipart(Form::new().part("image", part))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 413);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "File too large, limit is 1024 bytes");
    assert_eq!(vision.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn single_route_body_limit_is_one_file() {
    let config = ServerConfig {
        max_file_bytes: 1024,
        max_files: 10,
        ..ServerConfig::default()
    };
    let long_prompt = "x".repeat(config.single_body_limit());
    let (base, vision) = spawn(config).await;
    let client = reqwest::Client::new();

    let single = client
        .post(format!("{base}/api/analyze-image"))
        .multipart(
            Form::new()
                .text("prompt", long_prompt.clone())
                .part("image", jpeg("plate.jpg")),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(single.status(), 413);
    assert_eq!(vision.calls.load(Ordering::SeqCst), 0);

    let batch = client
        .post(format!("{base}/api/analyze-images"))
        .multipart(
            Form::new()
                .text("prompt", long_prompt)
                .part("images", jpeg("plate.jpg")),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(batch.status(), 200);
}

#[tokio::test]
async fn empty_prompt_is_passed_through() {
    let (base, vision) = spawn(ServerConfig::default()).await;
    let resp = reqwest::Client::new()
        .post(format!("{base}/api/analyze-image"))
        .multipart(Form::new().text("prompt", "").part("image", jpeg("plate.jpg")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(*vision.prompts.lock().unwrap(), vec![String::new()]);
}

#[tokio::test]
async fn batch_returns_results_in_upload_order() {
    let (base, vision) = spawn(ServerConfig::default()).await;
    let dir = tempfile::tempdir().unwrap();
    let paths: Vec<_> = ["a.jpg", "b.png"]
        .iter()
        .map(|name| {
            let p = dir.path().join(name);
            std::fs::write(&p, b"pixels").unwrap();
            p
        })
        .collect();

    let result = ProxyClient::new(&base)
        .analyze_images(&paths, Some("list the food"))
        .await
        .unwrap();
    assert!(result.success);
    assert_eq!(result.total_images, 2);
    let names: Vec<&str> = result.results.iter().map(|r| r.filename.as_str()).collect();
    assert_eq!(names, vec!["a.jpg", "b.png"]);
    assert!(result.results.iter().all(|r| r.size == 6));
    assert!(vision
        .prompts
        .lock()
        .unwrap()
        .iter()
        .all(|p| p == "list the food"));
}

#[tokio::test]
async fn one_failing_image_fails_the_batch() {
    let (base, _vision) = spawn(ServerConfig::default()).await;
    let form = Form::new()
        .part("images", jpeg("ok.jpg"))
        .part("images", jpeg("broken.jpg"));
    let resp = reqwest::Client::new()
        .post(format!("{base}/api/analyze-images"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Failed to analyze images");
    assert!(body["details"].as_str().unwrap().contains("unsupported image"));
    assert!(body.get("results").is_none());
}

#[tokio::test]
async fn health_reports_ok() {
    let (base, _) = spawn(ServerConfig::default()).await;
    let health = ProxyClient::new(&base).check_health().await.unwrap();
    assert_eq!(health.status, "ok");
    assert!(chrono::DateTime::parse_from_rfc3339(&health.timestamp).is_ok());
}
