use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Deserialize, Clone)]
pub struct Config {
    /// Gemini API key (`GEMINI_API_KEY`)
    #[serde(default)]
    pub gemini_api_key: Option<String>,

    /// Public build alias for the Gemini API key (`EXPO_PUBLIC_GEMINI_API_KEY`)
    #[serde(default)]
    pub expo_public_gemini_api_key: Option<String>,

    /// Gemini API base URL
    #[serde(default = "default_gemini_api_url")]
    pub gemini_api_url: String,

    /// Gemini model used for generateContent
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,

    /// Sampling temperature sent with every request
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Upper bound on generated tokens
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Deadline for a single remote call, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Optional JSON catalog file; the built-in sample catalog is used otherwise
    #[serde(default)]
    pub catalog_path: Option<String>,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_gemini_api_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_output_tokens() -> u32 {
    512
}

fn default_request_timeout_secs() -> u64 {
    20
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            expo_public_gemini_api_key: None,
            gemini_api_url: default_gemini_api_url(),
            gemini_model: default_gemini_model(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            request_timeout_secs: default_request_timeout_secs(),
            catalog_path: None,
            host: default_host(),
            port: default_port(),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("gemini_api_key", &self.api_key().map(|_| "<redacted>"))
            .field("gemini_api_url", &self.gemini_api_url)
            .field("gemini_model", &self.gemini_model)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("catalog_path", &self.catalog_path)
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Resolves the Gemini credential, preferring `GEMINI_API_KEY`.
    ///
    /// Blank values count as missing.
    pub fn api_key(&self) -> Option<String> {
        [&self.gemini_api_key, &self.expo_public_gemini_api_key]
            .into_iter()
            .flatten()
            .map(|key| key.trim())
            .find(|key| !key.is_empty())
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_prefers_primary_variable() {
        let config = Config {
            gemini_api_key: Some("primary".to_string()),
            expo_public_gemini_api_key: Some("public".to_string()),
            ..Config::default()
        };
        assert_eq!(config.api_key(), Some("primary".to_string()));
    }

    #[test]
    fn test_api_key_falls_back_to_public_alias() {
        let config = Config {
            gemini_api_key: Some("   ".to_string()),
            expo_public_gemini_api_key: Some("public".to_string()),
            ..Config::default()
        };
        assert_eq!(config.api_key(), Some("public".to_string()));
    }

    #[test]
    fn test_api_key_missing() {
        assert_eq!(Config::default().api_key(), None);
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = Config {
            gemini_api_key: Some("super-secret".to_string()),
            ..Config::default()
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
