use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::prompt::PromptMode;

pub const DEFAULT_PROVIDER_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_IMAGE_MODEL: &str = "gpt-image-1";
pub const DEFAULT_IMAGE_SIZE: &str = "1024x1024";
pub const DEFAULT_PROXY_HOST: &str = "oaidalleapiprodscus.blob.core.windows.net";

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub size: String,
    pub n: u32,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub allowed_hosts: Vec<String>,
    pub timeout: Duration,
}

/// Image sent to the provider when a request carries none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackImage {
    /// The JPEG compiled into the binary.
    Bundled,
    File(PathBuf),
    Disabled,
}

impl FallbackImage {
    /// `FALLBACK_IMAGE_PATH`: unset keeps the bundled image, blank disables it.
    fn from_env_value(value: Option<String>) -> Self {
        match value {
            None => FallbackImage::Bundled,
            Some(path) if path.trim().is_empty() => FallbackImage::Disabled,
            Some(path) => FallbackImage::File(PathBuf::from(path.trim())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub provider: ProviderConfig,
    pub proxy: ProxyConfig,
    pub fallback_image: FallbackImage,
    pub prompt_mode: PromptMode,
    pub debug_log_capacity: usize,
    pub max_upload_bytes: usize,
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            api_key: None,
            base_url: DEFAULT_PROVIDER_BASE_URL.to_string(),
            model: DEFAULT_IMAGE_MODEL.to_string(),
            size: DEFAULT_IMAGE_SIZE.to_string(),
            n: 1,
            timeout: Duration::from_secs(120),
        }
    }
}

impl ProviderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        let api_key = env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
        let base_url = env::var("OPENAI_BASE_URL").unwrap_or(defaults.base_url);
        let model = env::var("OPENAI_IMAGE_MODEL").unwrap_or(defaults.model);
        let size = env::var("OPENAI_IMAGE_SIZE").unwrap_or(defaults.size);
        let timeout = env_parse::<u64>("PROVIDER_TIMEOUT_SECS")
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        ProviderConfig {
            api_key,
            base_url,
            model,
            size,
            n: defaults.n,
            timeout,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Length of the configured key, for diagnostics that must not print it.
    pub fn api_key_len(&self) -> usize {
        self.api_key.as_ref().map_or(0, |k| k.len())
    }

    pub fn edits_url(&self) -> String {
        format!("{}/images/edits", self.base_url.trim_end_matches('/'))
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        ProxyConfig {
            allowed_hosts: vec![DEFAULT_PROXY_HOST.to_string()],
            timeout: Duration::from_secs(30),
        }
    }
}

impl ProxyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        let allowed_hosts = env::var("PROXY_ALLOWED_HOSTS")
            .ok()
            .map(|raw| parse_host_list(&raw))
            .unwrap_or(defaults.allowed_hosts);
        let timeout = env_parse::<u64>("PROXY_TIMEOUT_SECS")
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        ProxyConfig {
            allowed_hosts,
            timeout,
        }
    }

    pub fn with_allowed_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_hosts = hosts
            .into_iter()
            .map(|h| h.into().to_ascii_lowercase())
            .collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

fn parse_host_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|h| h.trim().to_ascii_lowercase())
        .filter(|h| !h.is_empty())
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            environment: "development".to_string(),
            provider: ProviderConfig::default(),
            proxy: ProxyConfig::default(),
            fallback_image: FallbackImage::Bundled,
            prompt_mode: PromptMode::Fixed,
            debug_log_capacity: 50,
            max_upload_bytes: 20 * 1024 * 1024,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        let host = env::var("HOST").unwrap_or(defaults.host);
        let port = env_parse("PORT").unwrap_or(defaults.port);
        let environment = env::var("APP_ENV").unwrap_or(defaults.environment);
        let fallback_image = FallbackImage::from_env_value(env::var("FALLBACK_IMAGE_PATH").ok());
        let prompt_mode = env::var("PROMPT_MODE")
            .ok()
            .and_then(|mode| mode.parse().ok())
            .unwrap_or(defaults.prompt_mode);
        let debug_log_capacity =
            env_parse("DEBUG_LOG_CAPACITY").unwrap_or(defaults.debug_log_capacity);
        let max_upload_bytes = env_parse("MAX_UPLOAD_BYTES").unwrap_or(defaults.max_upload_bytes);

        Config {
            host,
            port,
            environment,
            provider: ProviderConfig::from_env(),
            proxy: ProxyConfig::from_env(),
            fallback_image,
            prompt_mode,
            debug_log_capacity,
            max_upload_bytes,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_provider(mut self, config: ProviderConfig) -> Self {
        self.provider = config;
        self
    }

    pub fn with_proxy(mut self, config: ProxyConfig) -> Self {
        self.proxy = config;
        self
    }

    pub fn with_fallback_image(mut self, path: impl Into<PathBuf>) -> Self {
        self.fallback_image = FallbackImage::File(path.into());
        self
    }

    pub fn without_fallback_image(mut self) -> Self {
        self.fallback_image = FallbackImage::Disabled;
        self
    }

    pub fn with_prompt_mode(mut self, mode: PromptMode) -> Self {
        self.prompt_mode = mode;
        self
    }

    pub fn with_max_upload_bytes(mut self, limit: usize) -> Self {
        self.max_upload_bytes = limit;
        self
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_provider_contract() {
        let config = Config::new();
        assert_eq!(config.provider.model, "gpt-image-1");
        assert_eq!(config.provider.size, "1024x1024");
        assert_eq!(config.provider.n, 1);
        assert_eq!(config.provider.api_key_len(), 0);
        assert_eq!(config.prompt_mode, PromptMode::Fixed);
        assert_eq!(config.proxy.allowed_hosts, vec![DEFAULT_PROXY_HOST]);
    }

    #[test]
    fn edits_url_ignores_trailing_slash() {
        let provider = ProviderConfig::new().with_base_url("http://127.0.0.1:9000/v1/");
        assert_eq!(provider.edits_url(), "http://127.0.0.1:9000/v1/images/edits");
    }

    #[test]
    fn host_list_is_trimmed_and_lowercased() {
        assert_eq!(
            parse_host_list(" Example.com, ,cdn.example.org "),
            vec!["example.com", "cdn.example.org"]
        );
    }

    #[test]
    fn builder_overrides() {
        let config = Config::new()
            .with_port(9090)
            .without_fallback_image()
            .with_provider(ProviderConfig::new().with_api_key("sk-test"));
        assert_eq!(config.bind_address(), "127.0.0.1:9090");
        assert_eq!(config.fallback_image, FallbackImage::Disabled);
        assert_eq!(config.provider.api_key_len(), 7);
    }

    #[test]
    fn fallback_defaults_to_bundled_image() {
        assert_eq!(Config::new().fallback_image, FallbackImage::Bundled);
        assert_eq!(FallbackImage::from_env_value(None), FallbackImage::Bundled);
        assert_eq!(
            FallbackImage::from_env_value(Some(" ".into())),
            FallbackImage::Disabled
        );
        assert_eq!(
            FallbackImage::from_env_value(Some("/srv/ghibli/default.jpg".into())),
            FallbackImage::File(PathBuf::from("/srv/ghibli/default.jpg"))
        );
    }
}
