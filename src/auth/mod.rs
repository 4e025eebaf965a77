use crate::state::AppState;
use axum::Router;

pub(crate) mod claims;
mod cookies;
mod dto;
pub(crate) mod extractors;
pub mod handlers;
pub mod services;
pub mod session;

pub use extractors::{session_middleware, CurrentSession, RequireSession};
pub use session::ActiveSession;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::auth_routes())
}

/// JSON routes mounted under `/api/v1`.
pub fn api_router() -> Router<AppState> {
    Router::new().merge(handlers::me_routes())
}
