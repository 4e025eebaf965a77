use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use super::dto::{LoginRequest, RegisterRequest};
use crate::{
    backend::{AuthSession, BackendClient, BackendError},
    profiles::{NewProfile, Role},
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Normalizes the form in place and returns the first problem found, if any.
pub fn validate_registration(req: &mut RegisterRequest) -> Result<(), &'static str> {
    req.name = req.name.trim().to_string();
    req.email = req.email.trim().to_lowercase();

    if req.name.is_empty()
        || req.email.is_empty()
        || req.password.is_empty()
        || req.confirm_password.is_empty()
    {
        return Err("All fields are required");
    }
    if !is_valid_email(&req.email) {
        return Err("Invalid email");
    }
    if req.password != req.confirm_password {
        return Err("Passwords do not match");
    }
    Ok(())
}

pub fn normalize_login(req: &mut LoginRequest) -> Result<(), &'static str> {
    req.email = req.email.trim().to_lowercase();
    if req.email.is_empty() || req.password.is_empty() {
        return Err("Email and password are required");
    }
    Ok(())
}

/// Creates the auth user, then its `User` profile row. Returns the session when one was issued.
pub async fn register_member(
    backend: &dyn BackendClient,
    req: &RegisterRequest,
) -> Result<Option<AuthSession>, BackendError> {
    let outcome = backend.sign_up(&req.email, &req.password).await?;

    match &outcome.user {
        Some(user) => {
            let profile = NewProfile {
                id: user.id,
                name: req.name.clone(),
                email: req.email.clone(),
                role: Role::User,
            };
            let token = outcome.session.as_ref().map(|s| s.access_token.as_str());
            backend.insert_profile(token, &profile).await?;
            info!(user_id = %user.id, email = %req.email, "member registered");
        }
        None => warn!(email = %req.email, "sign-up returned no user; profile not created"),
    }

    Ok(outcome.session)
}
