pub mod handlers;
mod templates;

use axum::{routing::get, Router};

use crate::state::AppState;
pub use templates::{Templates, Viewer};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(handlers::home))
}
