// Client settings, loaded with the 'config' crate after '.env'

use anyhow::Result;
use config::{Config, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Base URL of the listing API (`/api/listing/...` is appended).
    pub api_base_url: String,
    /// Endpoint of the object-storage upload API.
    pub storage_base_url: String,
    pub page_size: usize,
    pub max_images: usize,
    pub showcase_limit: usize,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub user_agent: String,
    // Signed-in user id, handed over by the auth layer
    pub owner_ref: Option<String>,
}

impl Settings {
    pub fn new() -> Result<Self> {
        dotenv::dotenv().ok(); // Load .env file if present

        let builder = Config::builder()
            .set_default("api_base_url", "http://127.0.0.1:3000")?
            .set_default("storage_base_url", "http://127.0.0.1:9000/upload")?
            .set_default("page_size", 8)?
            .set_default("max_images", 6)?
            .set_default("showcase_limit", 4)?
            .set_default("max_retries", 3)?
            .set_default("retry_delay_ms", 250)?
            .set_default("user_agent", concat!("estate-client/", env!("CARGO_PKG_VERSION")))?
            // Load from a configuration file (e.g., config.toml)
            .add_source(File::with_name("config").required(false))
            // Load from environment variables (e.g., APP_API_BASE_URL)
            .add_source(Environment::with_prefix("APP").try_parsing(true));

        let settings = builder.build()?.try_deserialize()?;
        Ok(settings)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:3000".to_string(),
            storage_base_url: "http://127.0.0.1:9000/upload".to_string(),
            page_size: 8,
            max_images: 6,
            showcase_limit: 4,
            max_retries: 3,
            retry_delay_ms: 250,
            user_agent: concat!("estate-client/", env!("CARGO_PKG_VERSION")).to_string(),
            owner_ref: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_listing_limits() {
        let settings = Settings::default();
        assert_eq!(settings.page_size, 8);
        assert_eq!(settings.max_images, 6);
        assert_eq!(settings.showcase_limit, 4);
        assert!(settings.owner_ref.is_none());
    }
}
