mod dto;
pub mod handlers;

use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(handlers::list_users))
        .route("/users/:id", post(handlers::update_user))
        .route("/users/:id/edit", get(handlers::edit_user))
        .route("/users/:id/delete", post(handlers::delete_user))
}
