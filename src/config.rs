use crate::error::AppError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const URL_MODEL_FILE: &str = "url_model.json";
pub const URL_VECTORIZER_FILE: &str = "url_tfidf.json";
pub const EMAIL_MODEL_FILE: &str = "email_model.json";
pub const EMAIL_VECTORIZER_FILE: &str = "email_tfidf.json";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub bind_addr: String,
    pub models_dir: PathBuf,
    /// Prometheus scrape listener; disabled when unset.
    #[serde(default)]
    pub metrics_addr: Option<String>,
}

/// Resolved locations of the four model artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub url_model: PathBuf,
    pub url_vectorizer: PathBuf,
    pub email_model: PathBuf,
    pub email_vectorizer: PathBuf,
}

impl ArtifactPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            url_model: dir.join(URL_MODEL_FILE),
            url_vectorizer: dir.join(URL_VECTORIZER_FILE),
            email_model: dir.join(EMAIL_MODEL_FILE),
            email_vectorizer: dir.join(EMAIL_VECTORIZER_FILE),
        }
    }
}

impl Config {
    /// Defaults, then an optional `phishguard.toml`, then `PHISHGUARD_*` env vars.
    pub fn load() -> Result<Self, AppError> {
        let settings = config::Config::builder()
            .set_default("bind_addr", "0.0.0.0:5000")?
            .set_default("models_dir", "models")?
            .add_source(config::File::with_name("phishguard").required(false))
            .add_source(config::Environment::with_prefix("PHISHGUARD"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn artifact_paths(&self) -> ArtifactPaths {
        ArtifactPaths::in_dir(&self.models_dir)
    }
}
