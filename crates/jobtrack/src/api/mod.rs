//! HTTP surface: health check, gated pages, and the upstream proxy.

mod error;
mod handlers;
mod proxy;
mod routes;
mod state;

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use handlers::HealthResponse;
pub use routes::{create_router, create_router_with_pages};
pub use state::{AppState, Upstream};
