use axum::http::{header, HeaderMap, HeaderName};

use crate::backend::AuthSession;

pub const ACCESS_COOKIE: &str = "userhub_access";
pub const REFRESH_COOKIE: &str = "userhub_refresh";

const REFRESH_MAX_AGE_SECS: i64 = 30 * 24 * 60 * 60;

pub type SetCookies = Vec<(HeaderName, String)>;

/// Value of a named cookie from the request's `Cookie` headers.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

fn cookie(name: &str, value: &str, max_age: i64, secure: bool) -> String {
    let mut out = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        name, value, max_age
    );
    if secure {
        out.push_str("; Secure");
    }
    out
}

pub fn session_cookies(session: &AuthSession, secure: bool) -> SetCookies {
    vec![
        (
            header::SET_COOKIE,
            cookie(
                ACCESS_COOKIE,
                &session.access_token,
                session.expires_in.max(0),
                secure,
            ),
        ),
        (
            header::SET_COOKIE,
            cookie(
                REFRESH_COOKIE,
                &session.refresh_token,
                REFRESH_MAX_AGE_SECS,
                secure,
            ),
        ),
    ]
}

pub fn cleared_cookies(secure: bool) -> SetCookies {
    vec![
        (header::SET_COOKIE, cookie(ACCESS_COOKIE, "", 0, secure)),
        (header::SET_COOKIE, cookie(REFRESH_COOKIE, "", 0, secure)),
    ]
}
