use std::env;
use std::time::Duration;

use crate::sdk::error::GaodeError;

/// Connection settings for the Amap web service. Built once at startup and
/// passed by reference into every call; there is no global client state.
#[derive(Debug, Clone)]
pub struct AmapConfig {
    pub api_key: String,
    pub geocode_url: String,
    pub direction_v3_url: String,
    pub direction_v5_url: String,
    pub timeout: Duration,
}

impl AmapConfig {
    /// Reads `AMAP_API_KEY` from the environment (call `dotenvy::dotenv()`
    /// first if a `.env` file should be honoured).
    pub fn from_env() -> Result<Self, GaodeError> {
        let api_key = env::var("AMAP_API_KEY").map_err(|_| GaodeError::MissingApiKey)?;
        Ok(Self::with_key(api_key))
    }

    pub fn with_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            geocode_url: "http://restapi.amap.com/v3/geocode/geo".to_string(),
            direction_v3_url: "http://restapi.amap.com/v3/direction/driving".to_string(),
            direction_v5_url: "http://restapi.amap.com/v5/direction/driving".to_string(),
            timeout: Duration::from_secs(15),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_comes_from_environment() {
        env::remove_var("AMAP_API_KEY");
        assert!(matches!(
            AmapConfig::from_env(),
            Err(GaodeError::MissingApiKey)
        ));

        env::set_var("AMAP_API_KEY", "test-key");
        let config = AmapConfig::from_env().unwrap();
        assert_eq!(config.api_key, "test-key");
        assert!(config.direction_v3_url.contains("/v3/"));
        assert!(config.direction_v5_url.contains("/v5/"));
    }
}
