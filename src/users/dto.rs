use serde::{Deserialize, Serialize};
use time::macros::format_description;
use uuid::Uuid;

use crate::profiles::{Profile, Role};

#[derive(Debug, Default, Deserialize)]
pub struct UsersQuery {
    #[serde(default)]
    pub q: String,
}

/// Edit form body; only these columns are ever written back.
#[derive(Debug, Deserialize)]
pub struct EditProfileRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: Role,
}

/// One table row as the dashboard renders it.
#[derive(Debug, Serialize)]
pub struct ProfileRow {
    pub id: Uuid,
    pub initial: String,
    pub name: String,
    pub email: String,
    pub role: &'static str,
    pub joined: String,
}

impl From<Profile> for ProfileRow {
    fn from(p: Profile) -> Self {
        let joined = p
            .created_at
            .format(format_description!("[year]-[month]-[day]"))
            .unwrap_or_default();
        Self {
            id: p.id,
            initial: p.initial(),
            role: p.role.as_str(),
            joined,
            name: p.name,
            email: p.email,
        }
    }
}
