use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Language preference used when neither the command line nor the config names one
pub const DEFAULT_LANGUAGES: [&str; 3] = ["en", "en-US", "en-GB"];

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Ordered language preference for fetching
    pub languages: Vec<String>,

    /// HTTP client settings
    pub http: HttpConfig,

    /// YouTube endpoint settings
    pub youtube: YoutubeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HttpConfig {
    /// User-Agent header sent with every request
    pub user_agent: String,

    /// Accept-Language header sent with every request
    pub accept_language: String,

    /// Optional proxy URL applied to all requests
    pub proxy: Option<String>,

    /// Optional request timeout; none means the client's own default
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct YoutubeConfig {
    /// Base URL of the video platform
    pub base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            languages: DEFAULT_LANGUAGES.iter().map(|l| l.to_string()).collect(),
            http: HttpConfig::default(),
            youtube: YoutubeConfig::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: "en-US".to_string(),
            proxy: None,
            timeout_secs: None,
        }
    }
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.youtube.com".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from an explicit path, the usual locations, or defaults.
    ///
    /// Nothing is written to disk when no file exists.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::config_path(),
        };

        match path {
            Some(path) => Self::from_file(&path),
            None => {
                tracing::debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Read and validate a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs_err::read_to_string(path).context("Failed to read config file")?;
        let config = Self::from_yaml(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parse and validate a YAML document
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Config =
            serde_yaml::from_str(content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    /// First existing config file among the usual locations
    fn config_path() -> Option<PathBuf> {
        let local_config = PathBuf::from("transcript-fetcher.yaml");
        if local_config.exists() {
            return Some(local_config);
        }

        dirs::config_dir()
            .map(|dir| dir.join("transcript-fetcher").join("config.yaml"))
            .filter(|path| path.exists())
    }

    fn validate(&self) -> Result<()> {
        if self.languages.is_empty() {
            anyhow::bail!("At least one language must be configured");
        }
        if self.languages.iter().any(|l| l.trim().is_empty()) {
            anyhow::bail!("Language codes must not be empty");
        }

        let base = Url::parse(&self.youtube.base_url)
            .map_err(|_| anyhow::anyhow!("Invalid YouTube base URL: {}", self.youtube.base_url))?;
        if !matches!(base.scheme(), "http" | "https") {
            anyhow::bail!("YouTube base URL must use HTTP or HTTPS protocol");
        }

        if let Some(proxy) = &self.http.proxy {
            Url::parse(proxy).map_err(|_| anyhow::anyhow!("Invalid proxy URL: {}", proxy))?;
        }

        Ok(())
    }

    /// Language preference, with command-line codes taking precedence
    pub fn languages_or(&self, overrides: &[String]) -> Vec<String> {
        if overrides.is_empty() {
            self.languages.clone()
        } else {
            overrides.to_vec()
        }
    }
}
