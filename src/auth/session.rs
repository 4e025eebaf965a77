use axum::extract::FromRef;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use super::claims::{AccessClaims, AUTHENTICATED_AUDIENCE};
use crate::{
    backend::{AuthSession, BackendClient},
    profiles::Profile,
    state::AppState,
};

/// Verifies (or, without a shared secret, only decodes) remote access tokens.
#[derive(Clone)]
pub struct SessionKeys {
    decoding: Option<DecodingKey>,
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(state: &AppState) -> Self {
        SessionKeys::new(state.config.backend.jwt_secret.as_deref())
    }
}

impl SessionKeys {
    pub fn new(secret: Option<&str>) -> Self {
        Self {
            decoding: secret.map(|s| DecodingKey::from_secret(s.as_bytes())),
        }
    }

    /// Expiry is left to the caller so an expired token can still name its user.
    pub fn decode(&self, token: &str) -> anyhow::Result<AccessClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = match &self.decoding {
            Some(key) => {
                validation.set_audience(&[AUTHENTICATED_AUDIENCE]);
                decode::<AccessClaims>(token, key, &validation)?
            }
            None => {
                // The remote service re-checks the token on every row call.
                validation.insecure_disable_signature_validation();
                validation.validate_aud = false;
                decode::<AccessClaims>(token, &DecodingKey::from_secret(&[]), &validation)?
            }
        };
        debug!(
            user_id = %data.claims.sub,
            aud = ?data.claims.aud,
            role = ?data.claims.role,
            "access token decoded"
        );
        Ok(data.claims)
    }
}

pub fn is_expired(claims: &AccessClaims, now: OffsetDateTime) -> bool {
    (claims.exp as i64) <= now.unix_timestamp()
}

/// Signed-in user for the current request.
#[derive(Debug, Clone)]
pub struct ActiveSession {
    pub access_token: String,
    pub user_id: Uuid,
    pub email: Option<String>,
    pub profile: Option<Profile>,
}

impl ActiveSession {
    pub fn display_name(&self) -> String {
        match (&self.profile, &self.email) {
            (Some(p), _) => p.name.clone(),
            (None, Some(email)) => email.clone(),
            (None, None) => "Member".to_string(),
        }
    }
}

/// What the response must do with the session cookies.
#[derive(Debug, Clone)]
pub enum CookieUpdate {
    Keep,
    Store(AuthSession),
    Clear,
}

/// Turns the raw cookie tokens into a session, refreshing once when the access token lapsed.
pub async fn resolve_session(
    keys: &SessionKeys,
    backend: &dyn BackendClient,
    access: Option<String>,
    refresh: Option<String>,
) -> (Option<ActiveSession>, CookieUpdate) {
    let now = OffsetDateTime::now_utc();
    let had_access = access.is_some();

    if let Some(token) = access {
        match keys.decode(&token) {
            Ok(claims) if !is_expired(&claims, now) => {
                let session = ActiveSession {
                    access_token: token,
                    user_id: claims.sub,
                    email: claims.email,
                    profile: None,
                };
                return (Some(session), CookieUpdate::Keep);
            }
            Ok(_) => debug!("access token expired"),
            Err(e) => tracing::warn!(error = %e, "access token rejected"),
        }
    }

    let Some(refresh_token) = refresh.filter(|t| !t.is_empty()) else {
        let update = if had_access {
            CookieUpdate::Clear
        } else {
            CookieUpdate::Keep
        };
        return (None, update);
    };

    match backend.refresh_session(&refresh_token).await {
        Ok(fresh) => {
            let session = ActiveSession {
                access_token: fresh.access_token.clone(),
                user_id: fresh.user.id,
                email: fresh.user.email.clone(),
                profile: None,
            };
            (Some(session), CookieUpdate::Store(fresh))
        }
        Err(e) => {
            tracing::warn!(error = %e, "session refresh failed");
            (None, CookieUpdate::Clear)
        }
    }
}

/// Loads the profile row of the signed-in user; a failure just leaves it empty.
pub async fn load_profile(backend: &dyn BackendClient, session: &mut ActiveSession) {
    match backend
        .get_profile(Some(&session.access_token), session.user_id)
        .await
    {
        Ok(profile) => session.profile = profile,
        Err(e) => tracing::warn!(error = %e, user_id = %session.user_id, "profile lookup failed"),
    }
}
