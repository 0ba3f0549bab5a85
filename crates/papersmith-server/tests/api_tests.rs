//! HTTP surface tests driving the router in-process

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    response::Response,
};
use papersmith::{DocumentRenderer, RenderError};
use papersmith_registry::{
    CacheSettings, MemoryStore, StorageError, StoredTemplate, TemplateRegistry, TemplateStore,
};
use papersmith_server::{AppState, create_router, models::ErrorBody};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "papersmith-test-boundary";

/// Echoes the HTML back behind a PDF header
struct EchoRenderer;

#[async_trait]
impl DocumentRenderer for EchoRenderer {
    async fn render_pdf(&self, html: &str) -> Result<Vec<u8>, RenderError> {
        let mut pdf = b"%PDF-".to_vec();
        pdf.extend_from_slice(html.as_bytes());
        Ok(pdf)
    }

    fn name(&self) -> &'static str {
        "echo"
    }
}

struct BrokenRenderer;

#[async_trait]
impl DocumentRenderer for BrokenRenderer {
    async fn render_pdf(&self, _html: &str) -> Result<Vec<u8>, RenderError> {
        Err(RenderError::Failed {
            status: 1,
            stderr: "renderer crashed".into(),
        })
    }

    fn name(&self) -> &'static str {
        "broken"
    }
}

struct DownStore;

#[async_trait]
impl TemplateStore for DownStore {
    async fn get_by_name(&self, _name: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable("connection refused".into()))
    }

    async fn get_all(&self) -> Result<Vec<StoredTemplate>, StorageError> {
        Err(StorageError::Unavailable("connection refused".into()))
    }

    async fn add(&self, _name: &str, _content: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("connection refused".into()))
    }

    fn backend_name(&self) -> &'static str {
        "down"
    }
}

fn app_with(store: Arc<dyn TemplateStore>, renderer: Arc<dyn DocumentRenderer>) -> Router {
    let registry = Arc::new(TemplateRegistry::new(store, CacheSettings::default()));
    create_router(AppState::new(registry, renderer), 1024 * 1024)
}

fn app() -> Router {
    app_with(Arc::new(MemoryStore::new()), Arc::new(EchoRenderer))
}

fn multipart_body(fields: &[(&str, &str)]) -> String {
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!("--{}\r\n", BOUNDARY));
        if *name == "file" {
            body.push_str(
                "Content-Disposition: form-data; name=\"file\"; filename=\"template.html\"\r\n\
                 Content-Type: text/html\r\n\r\n",
            );
        } else {
            body.push_str(&format!(
                "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                name
            ));
        }
        body.push_str(value);
        body.push_str("\r\n");
    }
    body.push_str(&format!("--{}--\r\n", BOUNDARY));
    body
}

fn register_request(fields: &[(&str, &str)]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/templates")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(fields)))
        .unwrap()
}

fn export_request(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/export")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn error_body(response: Response) -> ErrorBody {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

#[tokio::test]
async fn test_health() {
    let response = app()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"ok");
}

#[tokio::test]
async fn test_register_and_duplicate() {
    let app = app();
    let fields = [("template", "invoice"), ("file", "Hello {{Name}}")];

    let response = app.clone().oneshot(register_request(&fields)).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app.oneshot(register_request(&fields)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = error_body(response).await;
    assert_eq!(body.code, "01");
    assert!(body.message.contains("invoice"));
}

#[tokio::test]
async fn test_only_post_is_allowed() {
    let app = app();

    for uri in ["/templates", "/export"] {
        let response = app
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "{}", uri);
        assert_eq!(error_body(response).await.code, "04", "{}", uri);
    }
}

#[tokio::test]
async fn test_register_requires_multipart_body() {
    let request = Request::builder()
        .method("POST")
        .uri("/templates")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"template":"invoice"}"#))
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = error_body(response).await;
    assert_eq!(body.code, "04");
    assert!(body.message.contains("multipart"));
}

#[tokio::test]
async fn test_register_missing_fields() {
    let app = app();

    let response = app
        .clone()
        .oneshot(register_request(&[("template", "invoice")]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_body(response).await.code, "04");

    let response = app
        .oneshot(register_request(&[("file", "Hello")]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_body(response).await.code, "04");
}

#[tokio::test]
async fn test_register_invalid_template() {
    let response = app()
        .oneshot(register_request(&[
            ("template", "broken"),
            ("file", "{{#each items}}{{/if}}"),
        ]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_body(response).await.code, "03");
}

#[tokio::test]
async fn test_export_invoice() {
    let app = app();
    let response = app
        .clone()
        .oneshot(register_request(&[
            ("template", "invoice"),
            ("file", "Hello {{Name}}"),
        ]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(export_request(json!({
            "template": "invoice",
            "file_name": "invoice.pdf",
            "data": { "Name": "Ada" }
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/pdf"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=invoice.pdf"
    );
    assert_eq!(body_bytes(response).await, b"%PDF-Hello Ada");
}

#[tokio::test]
async fn test_export_unknown_template_is_client_error() {
    let response = app()
        .oneshot(export_request(json!({
            "template": "missing",
            "file_name": "x.pdf",
            "data": {}
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_body(response).await.code, "02");
}

#[tokio::test]
async fn test_export_malformed_body() {
    let request = Request::builder()
        .method("POST")
        .uri("/export")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_body(response).await.code, "04");
}

#[tokio::test]
async fn test_backend_outage_is_server_error() {
    let app = app_with(Arc::new(DownStore), Arc::new(EchoRenderer));

    let response = app
        .clone()
        .oneshot(export_request(json!({
            "template": "x",
            "file_name": "x.pdf",
            "data": {}
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_body(response).await.code, "05");

    let response = app
        .oneshot(register_request(&[("template", "x"), ("file", "Hi")]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_body(response).await.code, "05");
}

#[tokio::test]
async fn test_renderer_failure_is_server_error() {
    let store = Arc::new(MemoryStore::with_templates([("invoice", "Hello")]));
    let app = app_with(store, Arc::new(BrokenRenderer));

    let response = app
        .oneshot(export_request(json!({
            "template": "invoice",
            "file_name": "invoice.pdf",
            "data": {}
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = error_body(response).await;
    assert_eq!(body.code, "06");
    assert!(!body.message.contains("crashed"));
}
