use crate::backend::{BackendClient, SupabaseClient};
use crate::config::AppConfig;
use crate::pages::Templates;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub backend: Arc<dyn BackendClient>,
    pub templates: Arc<Templates>,
}

impl AppState {
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let backend = Arc::new(SupabaseClient::new(&config.backend)?) as Arc<dyn BackendClient>;
        tracing::info!(
            url = %config.backend.url,
            table = %config.backend.profiles_table,
            verify_tokens = config.backend.jwt_secret.is_some(),
            "backend configured"
        );

        Ok(Self::from_parts(config, backend, Arc::new(Templates::new()?)))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        backend: Arc<dyn BackendClient>,
        templates: Arc<Templates>,
    ) -> Self {
        Self {
            config,
            backend,
            templates,
        }
    }

    #[cfg(test)]
    pub fn fake(backend: Arc<crate::backend::memory::MemoryBackend>) -> Self {
        use crate::backend::memory::TEST_JWT_SECRET;
        use crate::config::{BackendConfig, SessionConfig};

        let config = Arc::new(AppConfig {
            backend: BackendConfig {
                url: "http://backend.test".into(),
                anon_key: "test-anon".into(),
                jwt_secret: Some(TEST_JWT_SECRET.into()),
                profiles_table: "profiles".into(),
                timeout_secs: 5,
            },
            session: SessionConfig {
                secure_cookies: false,
            },
        });
        let templates = Arc::new(Templates::new().expect("templates compile"));
        Self::from_parts(config, backend as Arc<dyn BackendClient>, templates)
    }
}
