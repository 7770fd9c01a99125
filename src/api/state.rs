use std::{sync::Arc, time::Duration};

use crate::{
    config::Config,
    error::AppResult,
    models::Catalog,
    services::{providers::AdvisorProvider, providers::GeminiProvider, Advisor},
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub advisor: Arc<Advisor>,
}

impl AppState {
    /// Creates state around an advisor using the given provider and catalog
    pub fn new(provider: Arc<dyn AdvisorProvider>, catalog: Catalog) -> Self {
        Self {
            advisor: Arc::new(Advisor::new(provider, catalog)),
        }
    }

    /// Builds the Gemini-backed state described by `config`
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let catalog = match &config.catalog_path {
            Some(path) => Catalog::from_json_file(path)?,
            None => Catalog::sample(),
        };
        let provider = Arc::new(GeminiProvider::new(config)?);
        let advisor = Advisor::new(provider, catalog)
            .with_deadline(Duration::from_secs(config.request_timeout_secs));

        Ok(Self {
            advisor: Arc::new(advisor),
        })
    }

    pub fn catalog(&self) -> &Catalog {
        self.advisor.catalog()
    }
}
