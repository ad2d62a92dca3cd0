//! API configuration.

use std::time::Duration;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Request timeout
    pub request_timeout: Duration,
    /// Max request body size
    pub max_body_size: usize,
    /// HMAC secret for bearer tokens
    pub jwt_secret: String,
    /// Upper bound on variations per request
    pub max_variations: usize,
    /// Keyword cap when extracting search tags from seed metadata
    pub metadata_keyword_cap: usize,
    /// Images fetched per keyword
    pub images_per_keyword: u32,
    /// Environment (development/production)
    pub environment: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            request_timeout: Duration::from_secs(30),
            max_body_size: 2 * 1024 * 1024, // 2MB
            jwt_secret: String::new(),
            max_variations: 9,
            metadata_keyword_cap: 3,
            images_per_keyword: 10,
            environment: "development".to_string(),
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            request_timeout: Duration::from_secs(
                std::env::var("REQUEST_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_size),
            jwt_secret: std::env::var("JWT_SECRET").unwrap_or_default(),
            max_variations: std::env::var("MAX_VARIATIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_variations),
            metadata_keyword_cap: std::env::var("METADATA_KEYWORD_CAP")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.metadata_keyword_cap),
            images_per_keyword: std::env::var("IMAGES_PER_KEYWORD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.images_per_keyword),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}
