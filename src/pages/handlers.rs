use axum::{extract::State, response::Html};
use minijinja::context;
use tracing::instrument;

use super::Viewer;
use crate::{auth::CurrentSession, error::AppError, state::AppState};

#[instrument(skip_all)]
pub async fn home(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Html<String>, AppError> {
    let viewer = Viewer::from_session(session.as_ref());
    state
        .templates
        .render("home.html", context! { viewer })
}
