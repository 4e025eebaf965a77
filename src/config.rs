use serde::Deserialize;

/// Connection details for the hosted auth + database service.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    pub url: String,
    pub anon_key: String,
    pub jwt_secret: Option<String>,
    pub profiles_table: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub secure_cookies: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub session: SessionConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let url = normalize_url(&std::env::var("SUPABASE_URL")?)?;
        let backend = BackendConfig {
            url,
            anon_key: std::env::var("SUPABASE_ANON_KEY")?,
            jwt_secret: std::env::var("SUPABASE_JWT_SECRET")
                .ok()
                .filter(|v| !v.is_empty()),
            profiles_table: std::env::var("PROFILES_TABLE").unwrap_or_else(|_| "profiles".into()),
            timeout_secs: std::env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(30),
        };
        let session = SessionConfig {
            secure_cookies: std::env::var("SESSION_COOKIE_SECURE")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        };
        Ok(Self { backend, session })
    }
}

fn normalize_url(raw: &str) -> anyhow::Result<String> {
    let url = raw.trim().trim_end_matches('/');
    if url.is_empty() {
        anyhow::bail!("SUPABASE_URL cannot be empty");
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        anyhow::bail!("SUPABASE_URL must start with http:// or https://");
    }
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_url_trims_trailing_slash() {
        let url = normalize_url("https://abc.supabase.co/").unwrap();
        assert_eq!(url, "https://abc.supabase.co");
    }

    #[test]
    fn normalize_url_rejects_missing_scheme() {
        let err = normalize_url("abc.supabase.co").unwrap_err();
        assert!(err.to_string().contains("http://"));
    }

    #[test]
    fn normalize_url_rejects_empty() {
        assert!(normalize_url("  ").is_err());
    }
}
