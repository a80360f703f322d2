use reqwest::Client;

use crate::config::AppConfig;

/// Shared by every request; nothing in here is mutated after startup.
pub struct AppState {
    pub config: AppConfig,
    pub client: Client,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.fetch_timeout).build()?;
        Ok(Self { config, client })
    }
}
