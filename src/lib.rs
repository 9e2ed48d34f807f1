pub mod api;
pub mod collaborator;
pub mod config;
pub mod error;
pub mod llm;
pub mod scraper;
pub mod storage;

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, ClientBuilder};

use crate::collaborator::ScrapeCollaborator;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::scraper::SmartScraper;
use crate::storage::ImageStore;

/// Application state that will be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub collaborator: Arc<dyn ScrapeCollaborator>,
    pub images: Arc<ImageStore>,
    pub http: Client,
}

impl AppState {
    pub fn new(config: Config, collaborator: Arc<dyn ScrapeCollaborator>, http: Client) -> Self {
        let images = ImageStore::new(&config.static_dir);
        Self {
            config: Arc::new(config),
            collaborator,
            images: Arc::new(images),
            http,
        }
    }

    /// State wired to the built-in [`SmartScraper`] collaborator.
    pub fn with_smart_scraper(config: Config) -> Result<Self> {
        let http = build_http_client()?;
        let scraper = SmartScraper::new(http.clone(), config.openai_api_base.clone());
        Ok(Self::new(config, Arc::new(scraper), http))
    }
}

/// One pooled client shared by the image downloads and the collaborator.
pub fn build_http_client() -> Result<Client> {
    ClientBuilder::new()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(5))
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {}", e)))
}
