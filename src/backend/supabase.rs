use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::error::{extract_message, BackendError, Result};
use super::{AuthSession, BackendClient, RemoteUser, SignUpOutcome};
use crate::config::BackendConfig;
use crate::profiles::{NewProfile, Profile, ProfileChanges};

/// HTTP client for a Supabase project: GoTrue under `/auth/v1`, PostgREST under `/rest/v1`.
pub struct SupabaseClient {
    http: Client,
    base_url: String,
    anon_key: String,
    table: String,
}

impl SupabaseClient {
    pub fn new(cfg: &BackendConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("userhub/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: cfg.url.trim_end_matches('/').to_string(),
            anon_key: cfg.anon_key.clone(),
            table: cfg.profiles_table.clone(),
        })
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn rest_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    /// Row requests act as the signed-in user when there is one, else as anon.
    fn rest(&self, builder: RequestBuilder, access_token: Option<&str>) -> RequestBuilder {
        builder
            .header("apikey", self.anon_key.as_str())
            .bearer_auth(access_token.unwrap_or(self.anon_key.as_str()))
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                BackendError::Unreachable(e.to_string())
            } else {
                BackendError::Request(e)
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = extract_message(&body);
        warn!(status = %status, error = %message, "backend call failed");
        Err(BackendError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn read_json<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| BackendError::Parse(format!("{}: {}", what, e)))
    }

    async fn token_grant(&self, grant_type: &str, body: Value) -> Result<AuthSession> {
        let builder = self
            .http
            .post(self.auth_url("token"))
            .query(&[("grant_type", grant_type)])
            .header("apikey", self.anon_key.as_str())
            .json(&body);
        let response = self.send(builder).await?;
        Self::read_json(response, "token response").await
    }
}

/// Sign-up answers with a session or, when confirmation is pending, with the user alone.
fn parse_sign_up(body: Value) -> Result<SignUpOutcome> {
    if body.get("access_token").is_some() {
        let session: AuthSession = serde_json::from_value(body)
            .map_err(|e| BackendError::Parse(format!("sign-up session: {}", e)))?;
        return Ok(SignUpOutcome {
            user: Some(session.user.clone()),
            session: Some(session),
        });
    }

    let nested = body.get("user").filter(|u| !u.is_null()).cloned();
    let user_value = match nested {
        Some(user) => user,
        None if body.get("id").is_some() => body,
        None => return Ok(SignUpOutcome::default()),
    };
    let user: RemoteUser = serde_json::from_value(user_value)
        .map_err(|e| BackendError::Parse(format!("sign-up user: {}", e)))?;
    Ok(SignUpOutcome {
        user: Some(user),
        session: None,
    })
}

#[async_trait]
impl BackendClient for SupabaseClient {
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome> {
        debug!(email = %email, "signing up");
        let builder = self
            .http
            .post(self.auth_url("signup"))
            .header("apikey", self.anon_key.as_str())
            .json(&json!({ "email": email, "password": password }));
        let response = self.send(builder).await?;
        let body: Value = Self::read_json(response, "sign-up response").await?;
        let outcome = parse_sign_up(body)?;
        info!(
            email = %email,
            confirmed = outcome.session.is_some(),
            "sign-up accepted"
        );
        Ok(outcome)
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession> {
        debug!(email = %email, "signing in");
        let session = self
            .token_grant("password", json!({ "email": email, "password": password }))
            .await?;
        info!(user_id = %session.user.id, "signed in");
        Ok(session)
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession> {
        let session = self
            .token_grant("refresh_token", json!({ "refresh_token": refresh_token }))
            .await?;
        debug!(user_id = %session.user.id, "session refreshed");
        Ok(session)
    }

    async fn sign_out(&self, access_token: &str) -> Result<()> {
        let builder = self
            .http
            .post(self.auth_url("logout"))
            .header("apikey", self.anon_key.as_str())
            .bearer_auth(access_token);
        self.send(builder).await?;
        Ok(())
    }

    async fn list_profiles(&self, access_token: Option<&str>) -> Result<Vec<Profile>> {
        let builder = self
            .rest(self.http.get(self.rest_url()), access_token)
            .query(&[("select", "*"), ("order", "created_at.desc")]);
        let response = self.send(builder).await?;
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&body).map_err(|e| BackendError::Parse(format!("profiles: {}", e)))
    }

    async fn get_profile(&self, access_token: Option<&str>, id: Uuid) -> Result<Option<Profile>> {
        let filter = format!("eq.{}", id);
        let builder = self
            .rest(self.http.get(self.rest_url()), access_token)
            .query(&[("select", "*"), ("id", filter.as_str()), ("limit", "1")]);
        let response = self.send(builder).await?;
        let rows: Vec<Profile> = Self::read_json(response, "profile").await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_profile(&self, access_token: Option<&str>, profile: &NewProfile) -> Result<()> {
        let builder = self
            .rest(self.http.post(self.rest_url()), access_token)
            .header("Prefer", "return=minimal")
            .json(profile);
        self.send(builder).await?;
        info!(profile_id = %profile.id, "profile inserted");
        Ok(())
    }

    async fn update_profile(
        &self,
        access_token: Option<&str>,
        id: Uuid,
        changes: &ProfileChanges,
    ) -> Result<()> {
        let filter = format!("eq.{}", id);
        let builder = self
            .rest(self.http.patch(self.rest_url()), access_token)
            .query(&[("id", filter.as_str())])
            .header("Prefer", "return=minimal")
            .json(changes);
        self.send(builder).await?;
        info!(profile_id = %id, role = changes.role.as_str(), "profile updated");
        Ok(())
    }

    async fn delete_profile(&self, access_token: Option<&str>, id: Uuid) -> Result<()> {
        let filter = format!("eq.{}", id);
        let builder = self
            .rest(self.http.delete(self.rest_url()), access_token)
            .query(&[("id", filter.as_str())]);
        self.send(builder).await?;
        info!(profile_id = %id, "profile deleted");
        Ok(())
    }
}
