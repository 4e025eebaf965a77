use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use super::{
    cookies::{cleared_cookies, read_cookie, session_cookies, ACCESS_COOKIE, REFRESH_COOKIE},
    session::{load_profile, resolve_session, ActiveSession, CookieUpdate, SessionKeys},
};
use crate::state::AppState;

/// Session resolved by [`session_middleware`]; `None` for anonymous visitors.
#[derive(Debug, Clone, Default)]
pub struct CurrentSession(pub Option<ActiveSession>);

/// Resolves the cookie session once per request and keeps the cookies in sync.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let access = read_cookie(request.headers(), ACCESS_COOKIE);
    let refresh = read_cookie(request.headers(), REFRESH_COOKIE);
    let keys = SessionKeys::from_ref(&state);

    let (mut session, update) =
        resolve_session(&keys, state.backend.as_ref(), access, refresh).await;
    if let Some(active) = session.as_mut() {
        load_profile(state.backend.as_ref(), active).await;
    }
    request.extensions_mut().insert(CurrentSession(session));

    let mut response = next.run(request).await;

    // Handlers that log in or out write their own cookies.
    if response.headers().contains_key(header::SET_COOKIE) {
        return response;
    }
    let secure = state.config.session.secure_cookies;
    let cookies = match update {
        CookieUpdate::Keep => return response,
        CookieUpdate::Store(fresh) => session_cookies(&fresh, secure),
        CookieUpdate::Clear => cleared_cookies(secure),
    };
    for (name, value) in cookies {
        match value.parse() {
            Ok(v) => {
                response.headers_mut().append(name, v);
            }
            Err(e) => tracing::error!(error = %e, "invalid session cookie value"),
        }
    }
    response
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<CurrentSession>()
            .cloned()
            .unwrap_or_default())
    }
}

/// Signed-in user or a redirect to the login page.
pub struct RequireSession(pub ActiveSession);

#[async_trait]
impl<S> FromRequestParts<S> for RequireSession
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<CurrentSession>() {
            Some(CurrentSession(Some(session))) => Ok(RequireSession(session.clone())),
            _ => {
                tracing::debug!(uri = %parts.uri, "session required");
                Err(Redirect::to("/login").into_response())
            }
        }
    }
}
