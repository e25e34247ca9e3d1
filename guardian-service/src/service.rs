use axum::{
    Router,
    body::{Body, Bytes},
    extract::{DefaultBodyLimit, Multipart, State},
    http::{HeaderValue, Request, StatusCode},
    middleware::{Next, from_fn},
    response::{Json, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use std::path::Path;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::{Instrument, error, info, warn};
use uuid::Uuid;

use crate::advice::{AdviceRequest, AdviceResponse, AdviceService};
use crate::config::ServiceConfig;
use crate::error::ServiceError;
use crate::inventory_store::InventoryStore;
use crate::keys::KeyManager;
use crate::knowledge::KnowledgeBase;
use crate::model::{GeminiClient, GenerativeModel, InlineImage};

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<Value>)>;
type ApiError = (StatusCode, Json<Value>);

/// Upper bound for a chat upload (message fields plus one photo).
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

pub const CORRELATION_HEADER: &str = "x-correlation-id";

fn bad_request_error(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

fn internal_error(message: &str) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": message })),
    )
}

#[derive(Clone)]
pub struct AppState {
    pub advice: Arc<AdviceService>,
    pub inventory: Arc<InventoryStore>,
}

impl AppState {
    pub fn new(
        model: Arc<dyn GenerativeModel>,
        keys: KeyManager,
        knowledge: KnowledgeBase,
        inventory: InventoryStore,
    ) -> Self {
        let inventory = Arc::new(inventory);
        let advice = AdviceService::new(model, Arc::new(keys), Arc::new(knowledge), inventory.clone());
        Self {
            advice: Arc::new(advice),
            inventory,
        }
    }
}

pub fn create_app(config: &ServiceConfig) -> Router {
    let model = Arc::new(GeminiClient::new(
        config.gemini_api_base.clone(),
        config.gemini_model.clone(),
    ));
    let state = AppState::new(
        model,
        KeyManager::from_env(),
        KnowledgeBase::load(&config.knowledge_base_path),
        InventoryStore::new(&config.inventory_path),
    );
    build_router(state, &config.static_dir)
}

pub fn build_router(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/chat", post(chat))
        .route("/api/inventory", get(get_inventory).post(update_inventory))
        .fallback_service(ServeDir::new(static_dir))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(from_fn(correlation_id_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Tags each request with a fresh correlation id and runs it inside a span carrying it.
async fn correlation_id_middleware(mut request: Request<Body>, next: Next) -> Response {
    let correlation_id = Uuid::new_v4().to_string();
    let header = HeaderValue::from_str(&correlation_id).ok();

    if let Some(value) = header.clone() {
        request.headers_mut().insert(CORRELATION_HEADER, value);
    }

    let span = tracing::info_span!("http_request", correlation_id = %correlation_id);
    let mut response = next.run(request).instrument(span).await;

    if let Some(value) = header {
        response.headers_mut().insert(CORRELATION_HEADER, value);
    }
    response
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn chat(State(state): State<AppState>, multipart: Multipart) -> ApiResult<AdviceResponse> {
    let request = read_chat_form(multipart).await?;

    if request.message.is_empty() && request.image.is_none() {
        return Err(bad_request_error("No message or image provided"));
    }

    match state.advice.advise(request).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            error!(error = %e, "Chat request failed");
            Err(internal_error(&e.to_string()))
        }
    }
}

async fn read_chat_form(mut multipart: Multipart) -> Result<AdviceRequest, ApiError> {
    let mut request = AdviceRequest::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!(error = %e, "Malformed chat form");
        bad_request_error(&format!("Malformed form data: {}", e))
    })? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "image" {
            let declared = field.content_type().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| bad_request_error(&format!("Could not read image: {}", e)))?;
            if !bytes.is_empty() {
                request.image = Some(decode_image(&bytes, declared).map_err(|e| {
                    warn!(error = %e, "Rejected chat image");
                    bad_request_error(&e.to_string())
                })?);
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| bad_request_error(&format!("Could not read field '{}': {}", name, e)))?;
        match name.as_str() {
            "message" => request.message = value,
            "language" => request.language = value,
            "api_key" => request.api_key = Some(value).filter(|k| !k.trim().is_empty()),
            "age" => request.patient.age = value,
            "gender" => request.patient.gender = value,
            "location" => request.patient.location = value,
            "duration" => request.patient.duration = value,
            "history" => request.history = value,
            other => warn!(field = %other, "Ignoring unknown chat form field"),
        }
    }

    Ok(request)
}

/// Check that the upload really is an image and work out its MIME type from the content.
fn decode_image(bytes: &Bytes, declared: Option<String>) -> Result<InlineImage, ServiceError> {
    let format =
        image::guess_format(bytes).map_err(|e| ServiceError::InvalidImage(e.to_string()))?;
    image::load_from_memory_with_format(bytes, format)
        .map_err(|e| ServiceError::InvalidImage(e.to_string()))?;

    let mime_type = format.to_mime_type().to_string();
    if let Some(declared) = declared.filter(|d| d != &mime_type) {
        info!(declared = %declared, detected = %mime_type, "Image type differs from the declared one");
    }
    Ok(InlineImage {
        mime_type,
        data: bytes.to_vec(),
    })
}

async fn get_inventory(State(state): State<AppState>) -> Json<Value> {
    Json(state.inventory.load().await)
}

async fn update_inventory(State(state): State<AppState>, body: Bytes) -> ApiResult<Value> {
    let document: Value = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, "Inventory update is not valid JSON");
        internal_error(&e.to_string())
    })?;

    state.inventory.save(&document).await.map_err(|e| {
        error!(error = %e, "Failed to save inventory");
        internal_error(&e.to_string())
    })?;

    Ok(Json(json!({ "status": "success" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advice::testing::FakeModel;
    use axum::body::to_bytes;
    use std::io::Cursor;
    use tower::ServiceExt;

    const BOUNDARY: &str = "guardian-test-boundary";

    struct Harness {
        app: Router,
        model: Arc<FakeModel>,
        dir: tempfile::TempDir,
    }

    fn harness(model: FakeModel, keys: Vec<&str>) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>Guardian</h1>").unwrap();
        let model = Arc::new(model);
        let state = AppState::new(
            model.clone(),
            KeyManager::with_keys(keys.into_iter().map(String::from).collect()),
            KnowledgeBase::default(),
            InventoryStore::new(dir.path().join("inventory.json")),
        );
        Harness {
            app: build_router(state, dir.path()),
            model,
            dir,
        }
    }

    fn multipart_body(fields: &[(&str, &str)], image: Option<&[u8]>) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some(image) = image {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"photo.png\"\r\nContent-Type: image/png\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(image);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn chat_request(body: Vec<u8>) -> Request<Body> {
        Request::post("/api/chat")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn tiny_png() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(2, 2, image::Rgb([200, 30, 30]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[tokio::test]
    async fn test_health_reports_healthy_with_correlation_id() {
        let h = harness(FakeModel::default(), vec![]);
        let response = h
            .app
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(CORRELATION_HEADER));
    }

    #[tokio::test]
    async fn test_empty_chat_is_a_bad_request() {
        let h = harness(FakeModel::default(), vec!["k"]);
        let (status, body) = send(&h.app, chat_request(multipart_body(&[("language", "English")], None))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No message or image provided");
    }

    #[tokio::test]
    async fn test_chat_returns_model_text_and_forwards_fields() {
        let h = harness(FakeModel::replying("Apply pressure.\n[SPOT_ID: 8]"), vec!["k"]);
        let body = multipart_body(
            &[
                ("message", "cut on chest"),
                ("language", "Tamil"),
                ("api_key", ""),
                ("age", "9"),
                ("gender", "Female"),
                ("location", "N/A"),
                ("duration", "N/A"),
                ("history", r#"[{"role":"user","text":"earlier"}]"#),
            ],
            None,
        );
        let (status, value) = send(&h.app, chat_request(body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["response"], "Apply pressure.\n[SPOT_ID: 8]");
        assert_eq!(value["context_used"], false);

        let calls = h.model.calls.lock().unwrap();
        let (key, parts) = &calls[0];
        assert_eq!(key, "k");
        let crate::model::Part::Text(prompt) = &parts[0] else {
            panic!("prompt should be text");
        };
        assert!(prompt.contains("Patient: earlier"));
        assert!(prompt.contains("Age: 9, Gender: Female"));
        assert!(prompt.contains("respond in Tamil"));
    }

    #[tokio::test]
    async fn test_chat_with_image_only_is_accepted() {
        let h = harness(
            FakeModel {
                reply: "Looks like a graze.".to_string(),
                vision_keywords: Some("graze, knee".to_string()),
                ..Default::default()
            },
            vec!["k"],
        );
        let (status, value) = send(&h.app, chat_request(multipart_body(&[], Some(&tiny_png())))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["response"], "Looks like a graze.");
    }

    #[tokio::test]
    async fn test_undecodable_image_is_a_bad_request() {
        let h = harness(FakeModel::replying("unused"), vec!["k"]);
        let (status, value) = send(
            &h.app,
            chat_request(multipart_body(&[("message", "hi")], Some(b"definitely not a picture"))),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(value["error"].as_str().unwrap().starts_with("Invalid image"));
        assert!(h.model.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_keys_are_a_server_error_with_message() {
        let h = harness(FakeModel::default(), vec![]);
        let (status, value) = send(&h.app, chat_request(multipart_body(&[("message", "help")], None))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            value["error"],
            "No API Key provided. Please enter your Gemini API Key in the top header."
        );
    }

    #[tokio::test]
    async fn test_inventory_defaults_then_round_trips() {
        let h = harness(FakeModel::default(), vec![]);
        let (status, value) = send(&h.app, Request::get("/api/inventory").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value, json!({ "medicines": [], "equipment": [] }));

        let update = json!({ "medicines": ["Gauze", "Paracetamol"] });
        let (status, value) = send(
            &h.app,
            Request::post("/api/inventory")
                .header("content-type", "application/json")
                .body(Body::from(update.to_string()))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value, json!({ "status": "success" }));

        let (_, value) = send(&h.app, Request::get("/api/inventory").body(Body::empty()).unwrap()).await;
        assert_eq!(value, update);
        assert!(h.dir.path().join("inventory.json").exists());
    }

    #[tokio::test]
    async fn test_invalid_inventory_update_is_a_server_error() {
        let h = harness(FakeModel::default(), vec![]);
        let (status, value) = send(
            &h.app,
            Request::post("/api/inventory")
                .header("content-type", "application/json")
                .body(Body::from("{oops"))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(value["error"].is_string());
    }

    #[tokio::test]
    async fn test_static_front_end_is_served() {
        let h = harness(FakeModel::default(), vec![]);
        let response = h
            .app
            .clone()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"<h1>Guardian</h1>");
    }
}
