use anyhow::Result;
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub download: DownloadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub user_agent: String,
    pub accept_invalid_certs: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    pub dir: String,
}

impl AppConfig {
    pub fn new() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let config = Self {
            api: ApiConfig {
                base_url: normalize_base_url(
                    &std::env::var("FILEVAULT_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
                ),
                user_agent: std::env::var("FILEVAULT_USER_AGENT")
                    .unwrap_or_else(|_| format!("filevault/{}", env!("CARGO_PKG_VERSION"))),
                accept_invalid_certs: std::env::var("FILEVAULT_ACCEPT_INVALID_CERTS")
                    .map(|v| v.to_lowercase() == "true")
                    .unwrap_or(false),
            },
            download: DownloadConfig {
                dir: std::env::var("FILEVAULT_DOWNLOAD_DIR").unwrap_or_else(|_| ".".to_string()),
            },
        };

        Ok(config)
    }

    /// Override the API base URL, e.g. from a command line flag
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.api.base_url = normalize_base_url(base_url);
        self
    }
}

impl ApiConfig {
    pub fn for_base_url(base_url: &str) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            user_agent: format!("filevault/{}", env!("CARGO_PKG_VERSION")),
            accept_invalid_certs: false,
        }
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slashes_are_stripped() {
        assert_eq!(normalize_base_url("http://host:8000/api/"), "http://host:8000/api");
        assert_eq!(normalize_base_url(" http://host/api// "), "http://host/api");
    }

    #[test]
    fn base_url_override_is_normalized() {
        let config = AppConfig {
            api: ApiConfig::for_base_url(DEFAULT_API_URL),
            download: DownloadConfig { dir: ".".into() },
        }
        .with_base_url("https://files.example.com/api/");

        assert_eq!(config.api.base_url, "https://files.example.com/api");
        assert!(!config.api.accept_invalid_certs);
    }
}
