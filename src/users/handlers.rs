use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use minijinja::context;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::dto::{EditProfileRequest, ProfileRow, UsersQuery};
use crate::{
    auth::{ActiveSession, RequireSession},
    backend::BackendError,
    error::AppError,
    pages::Viewer,
    profiles::{filter_profiles, ProfileChanges},
    state::AppState,
};

fn failure_status(e: &BackendError) -> StatusCode {
    if e.is_unauthorized() {
        StatusCode::FORBIDDEN
    } else {
        StatusCode::BAD_GATEWAY
    }
}

/// Renders the members table, fetching rows fresh from the backend.
/// `status` is what the caller's own outcome warrants; a failed listing overrides it.
async fn render_list(
    state: &AppState,
    session: &ActiveSession,
    q: &str,
    banner: Option<String>,
    status: StatusCode,
) -> Result<Response, AppError> {
    let (users, error, status): (Vec<ProfileRow>, Option<String>, StatusCode) =
        match state.backend.list_profiles(Some(&session.access_token)).await {
            Ok(rows) => (
                filter_profiles(rows, q)
                    .into_iter()
                    .map(ProfileRow::from)
                    .collect(),
                banner,
                status,
            ),
            Err(e) => {
                error!(error = %e, "listing profiles failed");
                let message = match banner {
                    Some(b) => b,
                    None => format!("Could not load users: {}", e.user_message()),
                };
                (Vec::new(), Some(message), failure_status(&e))
            }
        };

    let viewer = Viewer::from_session(Some(session));
    let page = state
        .templates
        .render("users.html", context! { viewer, users, q, error })?;
    Ok((status, page).into_response())
}

fn render_edit(
    state: &AppState,
    session: &ActiveSession,
    id: Uuid,
    name: &str,
    role: &str,
    error: Option<&str>,
) -> Result<Response, AppError> {
    let viewer = Viewer::from_session(Some(session));
    let page = state
        .templates
        .render("user_edit.html", context! { viewer, id, name, role, error })?;
    let status = if error.is_some() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::OK
    };
    Ok((status, page).into_response())
}

fn render_failure(
    state: &AppState,
    session: &ActiveSession,
    status: StatusCode,
    heading: &str,
    message: &str,
) -> Result<Response, AppError> {
    let viewer = Viewer::from_session(Some(session));
    let page = state
        .templates
        .render("error.html", context! { viewer, heading, message })?;
    Ok((status, page).into_response())
}

#[instrument(skip(state, session))]
pub async fn list_users(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
    Query(query): Query<UsersQuery>,
) -> Result<Response, AppError> {
    render_list(&state, &session, &query.q, None, StatusCode::OK).await
}

#[instrument(skip(state, session))]
pub async fn edit_user(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    match state
        .backend
        .get_profile(Some(&session.access_token), id)
        .await
    {
        Ok(Some(profile)) => {
            render_edit(&state, &session, id, &profile.name, profile.role.as_str(), None)
        }
        Ok(None) => render_failure(
            &state,
            &session,
            StatusCode::NOT_FOUND,
            "Member not found",
            "No member with this id exists, or you may not view it.",
        ),
        Err(e) => {
            error!(error = %e, profile_id = %id, "profile lookup failed");
            let message = format!("Could not load member: {}", e.user_message());
            render_failure(&state, &session, failure_status(&e), "Edit Member", &message)
        }
    }
}

#[instrument(skip(state, session, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
    Path(id): Path<Uuid>,
    Form(payload): Form<EditProfileRequest>,
) -> Result<Response, AppError> {
    let changes = ProfileChanges {
        name: payload.name.trim().to_string(),
        role: payload.role,
    };
    if changes.name.is_empty() {
        warn!(profile_id = %id, "update rejected: empty name");
        return render_edit(
            &state,
            &session,
            id,
            &changes.name,
            changes.role.as_str(),
            Some("Name is required"),
        );
    }

    match state
        .backend
        .update_profile(Some(&session.access_token), id, &changes)
        .await
    {
        Ok(()) => {
            info!(profile_id = %id, by = %session.user_id, "member updated");
            Ok(Redirect::to("/users").into_response())
        }
        Err(e) => {
            error!(error = %e, profile_id = %id, "update failed");
            let message = format!("Action failed: {}", e.user_message());
            render_edit(
                &state,
                &session,
                id,
                &changes.name,
                changes.role.as_str(),
                Some(&message),
            )
        }
    }
}

#[instrument(skip(state, session))]
pub async fn delete_user(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    match state
        .backend
        .delete_profile(Some(&session.access_token), id)
        .await
    {
        Ok(()) => {
            info!(profile_id = %id, by = %session.user_id, "member removed");
            Ok(Redirect::to("/users").into_response())
        }
        Err(e) => {
            error!(error = %e, profile_id = %id, "delete failed");
            let banner = format!("Deletion failed: {}", e.user_message());
            render_list(&state, &session, "", Some(banner), failure_status(&e)).await
        }
    }
}
