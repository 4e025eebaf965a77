//! Seam to the hosted auth + database service.
//!
//! Every UI action maps to exactly one call here; the remote service owns
//! persistence, authentication and row-level access rules.

mod error;
#[cfg(test)]
pub mod memory;
mod supabase;

use async_trait::async_trait;
use serde::Deserialize;
use uuid::Uuid;

use crate::profiles::{NewProfile, Profile, ProfileChanges};

pub use error::{BackendError, Result};
pub use supabase::SupabaseClient;

/// Auth user as returned by the remote auth API.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RemoteUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// Token pair issued by the remote auth API.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: i64, // seconds
    pub user: RemoteUser,
}

fn default_expires_in() -> i64 {
    3600
}

/// Sign-up yields a session when email confirmation is off, a bare user otherwise.
#[derive(Debug, Clone, Default)]
pub struct SignUpOutcome {
    pub user: Option<RemoteUser>,
    pub session: Option<AuthSession>,
}

#[async_trait]
pub trait BackendClient: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome>;
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession>;
    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession>;
    async fn sign_out(&self, access_token: &str) -> Result<()>;

    /// All profiles, newest first.
    async fn list_profiles(&self, access_token: Option<&str>) -> Result<Vec<Profile>>;
    async fn get_profile(&self, access_token: Option<&str>, id: Uuid) -> Result<Option<Profile>>;
    async fn insert_profile(&self, access_token: Option<&str>, profile: &NewProfile) -> Result<()>;
    async fn update_profile(
        &self,
        access_token: Option<&str>,
        id: Uuid,
        changes: &ProfileChanges,
    ) -> Result<()>;
    /// Removes the profile row only; the auth user is left in place.
    async fn delete_profile(&self, access_token: Option<&str>, id: Uuid) -> Result<()>;
}
