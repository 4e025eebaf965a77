mod repo_types;
mod services;

pub use repo_types::{NewProfile, Profile, ProfileChanges, Role};
pub use services::filter_profiles;
