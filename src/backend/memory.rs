//! In-process stand-in for the hosted service, used by tests.

use std::sync::Mutex;

use async_trait::async_trait;
use jsonwebtoken::{encode, EncodingKey, Header};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use super::{AuthSession, BackendClient, BackendError, RemoteUser, Result, SignUpOutcome};
use crate::auth::claims::{AccessClaims, AUTHENTICATED_AUDIENCE};
use crate::profiles::{NewProfile, Profile, ProfileChanges, Role};

pub const TEST_JWT_SECRET: &str = "test-jwt-secret";

struct Account {
    user: RemoteUser,
    password: String,
}

#[derive(Default)]
struct Inner {
    accounts: Vec<Account>,
    profiles: Vec<Profile>,
    refresh_tokens: Vec<(String, Uuid)>,
    refresh_calls: usize,
    sign_out_calls: usize,
    profile_write_error: Option<String>,
    list_error: Option<String>,
    auth_error: Option<String>,
    confirmation_required: bool,
    row_tokens: Vec<(&'static str, Option<String>)>,
}

impl Inner {
    fn record_row_call(&mut self, op: &'static str, access_token: Option<&str>) {
        self.row_tokens.push((op, access_token.map(str::to_string)));
    }
}

#[derive(Default)]
pub struct MemoryBackend {
    inner: Mutex<Inner>,
}

fn api(status: u16, message: &str) -> BackendError {
    BackendError::Api {
        status,
        message: message.to_string(),
    }
}

fn issue(inner: &mut Inner, user: &RemoteUser) -> AuthSession {
    let exp = OffsetDateTime::now_utc() + Duration::hours(1);
    let claims = AccessClaims {
        sub: user.id,
        exp: exp.unix_timestamp() as usize,
        aud: Some(AUTHENTICATED_AUDIENCE.to_string()),
        email: user.email.clone(),
        role: Some("authenticated".into()),
    };
    let access_token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("encode test token");
    let refresh_token = Uuid::new_v4().simple().to_string();
    inner.refresh_tokens.push((refresh_token.clone(), user.id));
    AuthSession {
        access_token,
        refresh_token,
        expires_in: 3600,
        user: user.clone(),
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an account with a profile row and returns a session for it.
    pub fn seed_user(&self, email: &str, password: &str, name: &str, role: Role) -> AuthSession {
        let mut inner = self.inner.lock().unwrap();
        let user = RemoteUser {
            id: Uuid::new_v4(),
            email: Some(email.to_string()),
        };
        inner.accounts.push(Account {
            user: user.clone(),
            password: password.to_string(),
        });
        let created_at = OffsetDateTime::now_utc() + Duration::seconds(inner.profiles.len() as i64);
        inner.profiles.push(Profile {
            id: user.id,
            name: name.to_string(),
            email: email.to_string(),
            role,
            created_at,
        });
        issue(&mut inner, &user)
    }

    /// Profiles in listing order (newest first).
    pub fn profiles(&self) -> Vec<Profile> {
        let mut rows = self.inner.lock().unwrap().profiles.clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows
    }

    pub fn refresh_calls(&self) -> usize {
        self.inner.lock().unwrap().refresh_calls
    }

    pub fn sign_out_calls(&self) -> usize {
        self.inner.lock().unwrap().sign_out_calls
    }

    pub fn fail_profile_writes(&self, message: &str) {
        self.inner.lock().unwrap().profile_write_error = Some(message.to_string());
    }

    pub fn fail_listing(&self, message: &str) {
        self.inner.lock().unwrap().list_error = Some(message.to_string());
    }

    /// Sign-up and sign-in answer with a 500 carrying `message`.
    pub fn fail_auth(&self, message: &str) {
        self.inner.lock().unwrap().auth_error = Some(message.to_string());
    }

    /// Sign-up returns the new user without a session, as with email confirmation on.
    pub fn require_confirmation(&self) {
        self.inner.lock().unwrap().confirmation_required = true;
    }

    /// Token passed to the most recent row call named `op`; `None` if there was no such call.
    pub fn last_row_token(&self, op: &str) -> Option<Option<String>> {
        self.inner
            .lock()
            .unwrap()
            .row_tokens
            .iter()
            .rev()
            .find(|(name, _)| *name == op)
            .map(|(_, token)| token.clone())
    }
}

#[async_trait]
impl BackendClient for MemoryBackend {
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(message) = inner.auth_error.clone() {
            return Err(api(500, &message));
        }
        if inner
            .accounts
            .iter()
            .any(|a| a.user.email.as_deref() == Some(email))
        {
            return Err(api(422, "User already registered"));
        }
        let user = RemoteUser {
            id: Uuid::new_v4(),
            email: Some(email.to_string()),
        };
        inner.accounts.push(Account {
            user: user.clone(),
            password: password.to_string(),
        });
        if inner.confirmation_required {
            return Ok(SignUpOutcome {
                user: Some(user),
                session: None,
            });
        }
        let session = issue(&mut inner, &user);
        Ok(SignUpOutcome {
            user: Some(user),
            session: Some(session),
        })
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(message) = inner.auth_error.clone() {
            return Err(api(500, &message));
        }
        let user = inner
            .accounts
            .iter()
            .find(|a| a.user.email.as_deref() == Some(email) && a.password == password)
            .map(|a| a.user.clone())
            .ok_or_else(|| api(400, "Invalid login credentials"))?;
        Ok(issue(&mut inner, &user))
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession> {
        let mut inner = self.inner.lock().unwrap();
        inner.refresh_calls += 1;
        let pos = inner
            .refresh_tokens
            .iter()
            .position(|(t, _)| t == refresh_token)
            .ok_or_else(|| api(400, "Invalid Refresh Token: Refresh Token Not Found"))?;
        let (_, user_id) = inner.refresh_tokens.remove(pos);
        let user = inner
            .accounts
            .iter()
            .find(|a| a.user.id == user_id)
            .map(|a| a.user.clone())
            .ok_or_else(|| api(400, "User not found"))?;
        Ok(issue(&mut inner, &user))
    }

    async fn sign_out(&self, _access_token: &str) -> Result<()> {
        self.inner.lock().unwrap().sign_out_calls += 1;
        Ok(())
    }

    async fn list_profiles(&self, access_token: Option<&str>) -> Result<Vec<Profile>> {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.record_row_call("list", access_token);
            if let Some(message) = inner.list_error.clone() {
                return Err(api(500, &message));
            }
        }
        Ok(self.profiles())
    }

    async fn get_profile(&self, access_token: Option<&str>, id: Uuid) -> Result<Option<Profile>> {
        let mut inner = self.inner.lock().unwrap();
        inner.record_row_call("get", access_token);
        Ok(inner.profiles.iter().find(|p| p.id == id).cloned())
    }

    async fn insert_profile(&self, access_token: Option<&str>, profile: &NewProfile) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.record_row_call("insert", access_token);
        if let Some(message) = inner.profile_write_error.clone() {
            return Err(api(403, &message));
        }
        let created_at = OffsetDateTime::now_utc() + Duration::seconds(inner.profiles.len() as i64);
        inner.profiles.push(Profile {
            id: profile.id,
            name: profile.name.clone(),
            email: profile.email.clone(),
            role: profile.role,
            created_at,
        });
        Ok(())
    }

    async fn update_profile(
        &self,
        access_token: Option<&str>,
        id: Uuid,
        changes: &ProfileChanges,
    ) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.record_row_call("update", access_token);
        if let Some(message) = inner.profile_write_error.clone() {
            return Err(api(403, &message));
        }
        // Filtered updates that match nothing succeed silently, like the remote row API.
        if let Some(row) = inner.profiles.iter_mut().find(|p| p.id == id) {
            row.name = changes.name.clone();
            row.role = changes.role;
        }
        Ok(())
    }

    async fn delete_profile(&self, access_token: Option<&str>, id: Uuid) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.record_row_call("delete", access_token);
        if let Some(message) = inner.profile_write_error.clone() {
            return Err(api(403, &message));
        }
        inner.profiles.retain(|p| p.id != id);
        Ok(())
    }
}
