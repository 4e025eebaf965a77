use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Audience the hosted auth service stamps on user access tokens.
pub const AUTHENTICATED_AUDIENCE: &str = "authenticated";

/// Payload of an access token issued by the hosted auth service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: Uuid,                 // auth user ID
    pub exp: usize,                // expires at (unix timestamp)
    #[serde(default)]
    pub aud: Option<String>,       // "authenticated"
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,      // database role, not the profile role
}
