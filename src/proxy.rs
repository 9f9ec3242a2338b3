//! Result proxy: fetch a provider-hosted image on the browser's behalf.
//!
//! Only hosts on the allow-list are fetched. An entry matches the host itself
//! and any subdomain of it; `*` matches everything. Redirects are followed
//! only while every hop stays on the allow-list.

use std::sync::Arc;

use reqwest::{redirect, Client, Response, Url};

use crate::{
    config::ProxyConfig,
    error::{RelayError, Result},
};

pub const DEFAULT_CONTENT_TYPE: &str = "image/png";
pub const MAX_REDIRECTS: usize = 5;

#[derive(Clone)]
pub struct ImageProxy {
    client: Client,
    allowed_hosts: Arc<Vec<String>>,
}

/// Raised from the redirect policy when a hop leaves the allow-list.
#[derive(Debug, thiserror::Error)]
#[error("Redirect to host not allowed: {0}")]
struct BlockedRedirect(String);

fn host_allowed(allowed_hosts: &[String], host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    allowed_hosts.iter().any(|allowed| {
        allowed == "*"
            || host == *allowed
            || host
                .strip_suffix(allowed.as_str())
                .map_or(false, |prefix| prefix.ends_with('.'))
    })
}

fn redirect_policy(allowed_hosts: Arc<Vec<String>>) -> redirect::Policy {
    redirect::Policy::custom(move |attempt| {
        if attempt.previous().len() > MAX_REDIRECTS {
            return attempt.error("too many redirects");
        }
        let host = attempt.url().host_str().unwrap_or_default().to_string();
        if host_allowed(&allowed_hosts, &host) {
            attempt.follow()
        } else {
            log::warn!("Refusing to follow proxy redirect to {}", host);
            attempt.error(BlockedRedirect(host))
        }
    })
}

fn blocked_redirect(err: &reqwest::Error) -> Option<&BlockedRedirect> {
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        if let Some(blocked) = cause.downcast_ref::<BlockedRedirect>() {
            return Some(blocked);
        }
        source = std::error::Error::source(cause);
    }
    None
}

/// A successful upstream response whose body has not been read yet.
pub struct ProxiedImage {
    pub content_type: String,
    pub response: Response,
}

impl ImageProxy {
    pub fn new(config: &ProxyConfig) -> Result<Self> {
        let allowed_hosts = Arc::new(config.allowed_hosts.clone());
        let client = Client::builder()
            .timeout(config.timeout)
            .redirect(redirect_policy(allowed_hosts.clone()))
            .build()
            .map_err(|e| RelayError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            allowed_hosts,
        })
    }

    pub fn is_allowed_host(&self, host: &str) -> bool {
        host_allowed(&self.allowed_hosts, host)
    }

    /// Checks a caller-supplied URL before anything goes over the wire.
    pub fn validate(&self, raw: Option<&str>) -> Result<Url> {
        let raw = raw
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| RelayError::InvalidInput("Image URL is required".into()))?;

        let url = Url::parse(raw)
            .map_err(|e| RelayError::InvalidInput(format!("Invalid image URL: {}", e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(RelayError::InvalidInput(format!(
                "Unsupported URL scheme: {}",
                url.scheme()
            )));
        }

        let host = url
            .host_str()
            .ok_or_else(|| RelayError::InvalidInput("Image URL has no host".into()))?;
        if !self.is_allowed_host(host) {
            log::warn!("Refusing to proxy image from {}", host);
            return Err(RelayError::ForbiddenTarget(format!(
                "Host not allowed: {}",
                host
            )));
        }

        Ok(url)
    }

    pub async fn fetch(&self, raw: Option<&str>) -> Result<ProxiedImage> {
        let url = self.validate(raw)?;
        log::debug!("Proxying image from {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| match blocked_redirect(&e) {
                Some(blocked) => RelayError::ForbiddenTarget(blocked.to_string()),
                None => RelayError::from_transport("Failed to proxy image", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            log::warn!("Proxied fetch returned {}", status);
            return Err(RelayError::ProxyUpstreamStatus(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();

        Ok(ProxiedImage {
            content_type,
            response,
        })
    }
}
