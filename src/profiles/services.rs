use super::Profile;

/// Case-insensitive search over name and email. A blank term keeps every row.
pub fn filter_profiles(profiles: Vec<Profile>, term: &str) -> Vec<Profile> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return profiles;
    }
    profiles
        .into_iter()
        .filter(|p| {
            p.name.to_lowercase().contains(&needle) || p.email.to_lowercase().contains(&needle)
        })
        .collect()
}
