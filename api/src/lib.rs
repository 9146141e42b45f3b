pub mod error;
pub mod extractors;
pub mod middleware;
pub mod observability;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use extractors::{ResponseContext, ValidatedJson, ValidatedPagination};
pub use middleware::{capture_original_url, request_logger, OriginalUrl};
pub use state::AppState;

/// Load `.env`, install tracing and build state from the environment.
pub fn bootstrap() -> anyhow::Result<AppState> {
    dotenv::dotenv().ok();
    observability::init_tracing()?;
    Ok(AppState::from_env())
}
