// Integration tests: validation and pagination through an axum router

use axum::{
    body::Body,
    extract::Path,
    http::{Request, StatusCode},
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use http_body_util::BodyExt;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tollgate_api::{
    capture_original_url, request_logger, AppState, ResponseContext, ValidatedJson,
    ValidatedPagination,
};
use tollgate_shared::{Annotated, EngineConfig, FieldAnnotation, RuleDescriptor, RuleRegistry};
use tower::ServiceExt;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Widget {
    name: String,
    contact: String,
    #[serde(default)]
    homepage: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

impl Annotated for Widget {
    fn sanitize(&mut self) {
        self.name = self.name.trim().to_string();
    }

    fn annotations(&self) -> Vec<FieldAnnotation<'_>> {
        vec![
            FieldAnnotation::new("name", &self.name, "required,maxlen=20,alphanumchar"),
            FieldAnnotation::new("contact", &self.contact, "required,email"),
            FieldAnnotation::new("homepage", &self.homepage, "url"),
            FieldAnnotation::new("tags", &self.tags, "notempty"),
        ]
    }
}

#[derive(Debug, Deserialize)]
struct Broken {
    name: String,
}

impl Annotated for Broken {
    fn annotations(&self) -> Vec<FieldAnnotation<'_>> {
        vec![FieldAnnotation::with_rules(
            "name",
            &self.name,
            vec![RuleDescriptor::bare("sparkly")],
        )]
    }
}

const TOTAL_WIDGETS: i64 = 25;

async fn list_widgets(
    ValidatedPagination(query): ValidatedPagination,
    ctx: ResponseContext,
) -> impl IntoResponse {
    let widgets: Vec<String> = (query.offset()..TOTAL_WIDGETS)
        .take(query.limit() as usize)
        .map(|n| format!("widget-{n}"))
        .collect();
    ctx.respond(Some(widgets), TOTAL_WIDGETS)
}

async fn create_widget(ValidatedJson(widget): ValidatedJson<Widget>) -> impl IntoResponse {
    (StatusCode::CREATED, Json(widget))
}

async fn get_widget(Path(id): Path<u32>, ctx: ResponseContext) -> impl IntoResponse {
    ctx.respond(Some(format!("widget-{id}")), 1)
}

async fn create_broken(ValidatedJson(broken): ValidatedJson<Broken>) -> impl IntoResponse {
    broken.name
}

fn app() -> Router {
    let config = EngineConfig {
        domain: "https://api.example.com".to_string(),
        ..EngineConfig::default()
    };
    let state = AppState::new(config, RuleRegistry::default());

    let paged = Router::new()
        .route("/widgets", get(list_widgets).post(create_widget))
        .route_layer(middleware::from_fn(capture_original_url));

    Router::new()
        .merge(paged)
        .route("/widgets/:id", get(get_widget))
        .route("/broken", axum::routing::post(create_broken))
        .layer(middleware::from_fn(request_logger))
        .with_state(state)
}

async fn send(request: Request<Body>) -> (StatusCode, Value) {
    let response = app().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn get_json(uri: &str) -> (StatusCode, Value) {
    send(Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn post_json(uri: &str, payload: Value) -> (StatusCode, Value) {
    send(
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap(),
    )
    .await
}

#[tokio::test]
async fn test_list_first_page_links() {
    let (status, body) = get_json("/widgets?page=1&records_per_page=10").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 10);

    let pagination = &body["pagination"];
    assert_eq!(pagination["total_records"], 25);
    assert_eq!(pagination["records_per_page"], 10);
    assert_eq!(pagination["total_pages"], 3);
    assert_eq!(
        pagination["links"]["self"],
        "https://api.example.com/widgets?page=1&records_per_page=10"
    );
    assert_eq!(
        pagination["links"]["next"],
        "https://api.example.com/widgets?page=2&records_per_page=10"
    );
    assert!(pagination["links"].get("previous").is_none());
}

#[tokio::test]
async fn test_list_last_page() {
    let (status, body) = get_json("/widgets?page=3&records_per_page=10&sort_order=DESC").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 5);
    let links = &body["pagination"]["links"];
    assert!(links.get("next").is_none());
    assert_eq!(
        links["previous"],
        "https://api.example.com/widgets?page=2&records_per_page=10&sort_order=DESC"
    );
}

#[tokio::test]
async fn test_list_without_query_uses_defaults() {
    let (status, body) = get_json("/widgets").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["records_per_page"], 10);
    assert_eq!(
        body["pagination"]["links"]["self"],
        "https://api.example.com/widgets?page=1&records_per_page=10"
    );
}

#[tokio::test]
async fn test_list_with_largest_page_is_empty() {
    let (status, body) = get_json(&format!("/widgets?page={}", i64::MAX)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
    let links = &body["pagination"]["links"];
    assert!(links.get("next").is_none());
    assert!(links["previous"].is_string());
}

#[tokio::test]
async fn test_invalid_pagination_is_rejected() {
    let (status, body) = get_json("/widgets?page=abc&records_per_page=100&condition=XOR").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_model");
    assert_eq!(body["code"], 400);
    assert!(body["correlation_id"].is_string());
    assert_eq!(
        body["details"],
        json!({
            "page": ["should be a number"],
            "records_per_page": ["should be less than or equal to 50"],
            "condition": ["values supported: [AND|OR]"],
        })
    );
}

#[tokio::test]
async fn test_single_resource_has_no_pagination() {
    let (status, body) = get_json("/widgets/7").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "data": "widget-7" }));
}

#[tokio::test]
async fn test_create_valid_widget() {
    let (status, body) = post_json(
        "/widgets",
        json!({
            "name": "  Desk Lamp  ",
            "contact": "sales@example.com",
            "homepage": "https://example.com/lamp",
            "tags": ["lighting"],
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "Desk Lamp");
}

#[tokio::test]
async fn test_create_reports_every_failing_field() {
    let (status, body) = post_json(
        "/widgets",
        json!({
            "name": "",
            "contact": "not-an-email",
            "homepage": "example",
            "tags": [],
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_model");
    assert_eq!(body["message"], "Validation failed for 4 fields");

    let details = body["details"].as_object().unwrap();
    assert_eq!(details.len(), 4);
    assert_eq!(details["name"], json!(["required field"]));
    assert_eq!(details["contact"], json!(["invalid email format"]));
    assert_eq!(details["homepage"], json!(["should be a valid url"]));
    assert_eq!(details["tags"], json!(["at least one String is required"]));
}

#[tokio::test]
async fn test_malformed_body_is_keyed_under_body() {
    let (status, body) = send(
        Request::post("/widgets")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_model");
    assert!(body["details"]["body"][0]
        .as_str()
        .unwrap()
        .starts_with("JSON syntax error"));
}

#[tokio::test]
async fn test_unknown_rule_is_a_server_error() {
    let (status, body) = post_json("/broken", json!({ "name": "x" })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "validation_error");
    assert!(body.get("details").is_none());
    assert!(body["message"].as_str().unwrap().contains("sparkly"));
}
