use axum::response::Html;
use minijinja::Environment;
use serde::Serialize;

use crate::{auth::ActiveSession, error::AppError};

const TEMPLATES: &[(&str, &str)] = &[
    ("layout.html", include_str!("../../templates/layout.html")),
    ("home.html", include_str!("../../templates/home.html")),
    ("register.html", include_str!("../../templates/register.html")),
    ("login.html", include_str!("../../templates/login.html")),
    ("users.html", include_str!("../../templates/users.html")),
    ("user_edit.html", include_str!("../../templates/user_edit.html")),
    ("error.html", include_str!("../../templates/error.html")),
];

/// Page templates, compiled once at startup. `.html` names are auto-escaped.
pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        for &(name, source) in TEMPLATES {
            env.add_template(name, source)?;
        }
        Ok(Self { env })
    }

    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<Html<String>, AppError> {
        let html = self.env.get_template(name)?.render(ctx)?;
        Ok(Html(html))
    }
}

/// Signed-in user as the layout shows it.
#[derive(Debug, Serialize)]
pub struct Viewer {
    pub name: String,
    pub role: Option<&'static str>,
}

impl Viewer {
    pub fn from_session(session: Option<&ActiveSession>) -> Option<Self> {
        session.map(|s| Viewer {
            name: s.display_name(),
            role: s.profile.as_ref().map(|p| p.role.as_str()),
        })
    }
}
