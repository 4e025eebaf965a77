use axum::{
    extract::State,
    http::StatusCode,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use minijinja::context;
use tracing::{error, info, instrument, warn};

use super::{
    cookies::{cleared_cookies, session_cookies},
    dto::{LoginRequest, MeResponse, RegisterRequest},
    extractors::CurrentSession,
    services::{normalize_login, register_member, validate_registration},
};
use crate::{error::AppError, pages::Viewer, state::AppState};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", get(register_page).post(register))
        .route("/login", get(login_page).post(login))
        .route("/logout", post(logout))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

fn or_default(message: String, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

fn render_register(
    state: &AppState,
    session: &CurrentSession,
    name: &str,
    email: &str,
    error: Option<&str>,
) -> Result<Response, AppError> {
    let viewer = Viewer::from_session(session.0.as_ref());
    let page = state
        .templates
        .render("register.html", context! { viewer, name, email, error })?;
    let status = if error.is_some() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::OK
    };
    Ok((status, page).into_response())
}

fn render_login(
    state: &AppState,
    session: &CurrentSession,
    email: &str,
    error: Option<&str>,
) -> Result<Response, AppError> {
    let viewer = Viewer::from_session(session.0.as_ref());
    let page = state
        .templates
        .render("login.html", context! { viewer, email, error })?;
    let status = if error.is_some() {
        StatusCode::UNAUTHORIZED
    } else {
        StatusCode::OK
    };
    Ok((status, page).into_response())
}

#[instrument(skip_all)]
pub async fn register_page(
    State(state): State<AppState>,
    session: CurrentSession,
) -> Result<Response, AppError> {
    render_register(&state, &session, "", "", None)
}

#[instrument(skip(state, session, payload))]
pub async fn register(
    State(state): State<AppState>,
    session: CurrentSession,
    Form(mut payload): Form<RegisterRequest>,
) -> Result<Response, AppError> {
    if let Err(message) = validate_registration(&mut payload) {
        warn!(email = %payload.email, reason = message, "registration rejected");
        return render_register(&state, &session, &payload.name, &payload.email, Some(message));
    }

    match register_member(state.backend.as_ref(), &payload).await {
        Ok(Some(fresh)) => {
            let cookies = session_cookies(&fresh, state.config.session.secure_cookies);
            Ok((AppendHeaders(cookies), Redirect::to("/")).into_response())
        }
        Ok(None) => {
            info!(email = %payload.email, "registered; confirmation pending");
            Ok(Redirect::to("/").into_response())
        }
        Err(e) => {
            error!(error = %e, email = %payload.email, "registration failed");
            let message = or_default(e.user_message(), "Registration failed");
            render_register(&state, &session, &payload.name, &payload.email, Some(&message))
        }
    }
}

#[instrument(skip_all)]
pub async fn login_page(
    State(state): State<AppState>,
    session: CurrentSession,
) -> Result<Response, AppError> {
    render_login(&state, &session, "", None)
}

#[instrument(skip(state, session, payload))]
pub async fn login(
    State(state): State<AppState>,
    session: CurrentSession,
    Form(mut payload): Form<LoginRequest>,
) -> Result<Response, AppError> {
    if let Err(message) = normalize_login(&mut payload) {
        warn!(email = %payload.email, "login rejected");
        return render_login(&state, &session, &payload.email, Some(message));
    }

    match state
        .backend
        .sign_in_with_password(&payload.email, &payload.password)
        .await
    {
        Ok(fresh) => {
            info!(user_id = %fresh.user.id, "user logged in");
            let cookies = session_cookies(&fresh, state.config.session.secure_cookies);
            Ok((AppendHeaders(cookies), Redirect::to("/users")).into_response())
        }
        Err(e) => {
            warn!(error = %e, email = %payload.email, "login failed");
            let message = or_default(e.user_message(), "Login failed");
            render_login(&state, &session, &payload.email, Some(&message))
        }
    }
}

#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> impl IntoResponse {
    if let Some(active) = session {
        if let Err(e) = state.backend.sign_out(&active.access_token).await {
            warn!(error = %e, user_id = %active.user_id, "remote sign-out failed");
        } else {
            info!(user_id = %active.user_id, "user logged out");
        }
    }
    let cookies = cleared_cookies(state.config.session.secure_cookies);
    (AppendHeaders(cookies), Redirect::to("/login"))
}

#[instrument(skip_all)]
pub async fn get_me(
    CurrentSession(session): CurrentSession,
) -> Result<Json<MeResponse>, (StatusCode, String)> {
    let session = session.ok_or((StatusCode::UNAUTHORIZED, "Not signed in".to_string()))?;
    let profile = session.profile.ok_or_else(|| {
        warn!(user_id = %session.user_id, "session has no profile row");
        (StatusCode::NOT_FOUND, "Profile not found".to_string())
    })?;
    Ok(Json(MeResponse::from(profile)))
}
