//! Custom Axum extractors for validated input
//!
//! - `ValidatedJson<T>`: a drop-in replacement for `Json<T>` that sanitizes
//!   the payload and runs it through the state's [`Validator`].
//! - `ValidatedPagination`: parses and validates the paging query string.
//! - `ResponseContext`: builds the `{ data, pagination }` response body.
//!
//! [`Validator`]: tollgate_shared::Validator

use axum::{
    async_trait,
    extract::{FromRef, FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    Json,
};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tollgate_shared::{
    format_response, Annotated, EngineConfig, PageQuery, PaginationRequest, ResponseEnvelope,
    ValidationResult,
};

use crate::error::ApiError;
use crate::middleware::OriginalUrl;
use crate::state::AppState;

/// JSON body that has already been sanitized and validated
///
/// ```ignore
/// pub async fn create_item(
///     ValidatedJson(req): ValidatedJson<CreateRequest>,
/// ) -> impl IntoResponse {
///     // req passed every rule declared in its `Annotated` impl
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Annotated + Send,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        // Step 1: Parse JSON
        let Json(mut data) = Json::<T>::from_request(req, state)
            .await
            .map_err(|err| {
                let message = match err {
                    axum::extract::rejection::JsonRejection::JsonDataError(e) => {
                        format!("Invalid JSON data: {}", e.body_text())
                    }
                    axum::extract::rejection::JsonRejection::JsonSyntaxError(e) => {
                        format!("JSON syntax error: {}", e.body_text())
                    }
                    axum::extract::rejection::JsonRejection::MissingJsonContentType(_) => {
                        "Content-Type must be application/json".to_string()
                    }
                    axum::extract::rejection::JsonRejection::BytesRejection(_) => {
                        "Failed to read request body".to_string()
                    }
                    _ => "Invalid JSON payload".to_string(),
                };
                let mut details = ValidationResult::new();
                details.push("body", message);
                ApiError::invalid_model(details)
            })?;

        // Step 2: Sanitize the data
        data.sanitize();

        // Step 3: Validate the data
        let app = AppState::from_ref(state);
        app.validator.check(&data)?;

        Ok(ValidatedJson(data))
    }
}

impl<T> std::ops::Deref for ValidatedJson<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> std::ops::DerefMut for ValidatedJson<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

/// Paging parameters that passed validation, with defaults applied
#[derive(Debug, Clone, Copy)]
pub struct ValidatedPagination(pub PageQuery);

#[async_trait]
impl<S> FromRequestParts<S> for ValidatedPagination
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(request) = Query::<PaginationRequest>::from_request_parts(parts, state)
            .await
            .map_err(|err| ApiError::bad_request("invalid_query", err.body_text()))?;

        let app = AppState::from_ref(state);
        let query = app.pagination.check(&request)?;
        Ok(ValidatedPagination(query))
    }
}

/// Everything needed to shape a response body for the current request
#[derive(Debug, Clone)]
pub struct ResponseContext {
    config: Arc<EngineConfig>,
    original_url: Option<OriginalUrl>,
}

impl ResponseContext {
    /// `Json({ data, pagination })`; pagination only when the route captured
    /// its original URL.
    pub fn respond<T: Serialize>(&self, data: Option<T>, count: i64) -> Json<ResponseEnvelope<T>> {
        Json(format_response(
            &self.config,
            self.original_url.as_ref().map(OriginalUrl::as_str),
            data,
            count,
        ))
    }

    pub fn is_paginated(&self) -> bool {
        self.original_url.is_some()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ResponseContext
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app = AppState::from_ref(state);
        Ok(ResponseContext {
            config: app.config,
            original_url: parts.extensions.get::<OriginalUrl>().cloned(),
        })
    }
}
