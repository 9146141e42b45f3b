use axum::{extract::Request, middleware::Next, response::Response};

/// The request target as the client sent it, path plus query.
///
/// Its presence in the request extensions marks a response as paginated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginalUrl(pub String);

impl OriginalUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Store the incoming URL for [`crate::extractors::ResponseContext`].
///
/// Attach it with `route_layer` to list routes only:
///
/// ```ignore
/// Router::new()
///     .route("/widgets", get(list_widgets))
///     .route_layer(middleware::from_fn(capture_original_url))
/// ```
pub async fn capture_original_url(mut req: Request, next: Next) -> Response {
    let original = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    req.extensions_mut().insert(OriginalUrl(original));
    next.run(req).await
}

pub async fn request_logger(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let start = std::time::Instant::now();

    let response = next.run(req).await;

    let elapsed = start.elapsed().as_millis();
    let status = response.status().as_u16();

    tracing::info!("{method} {uri} {status} {elapsed}ms");

    response
}
