use std::sync::{Arc, Mutex};

use crate::{
    config::Config,
    debug_log::{DebugEntry, DebugKind, DebugSessions, MAX_SESSIONS},
    error::Result,
    prompt::PromptBuilder,
    provider::{build_provider, ImageProvider},
    proxy::ImageProxy,
    relay::TransformRelay,
};

/// Shared by every worker. The per-session debug logs are the only mutable part.
pub struct AppState {
    pub relay: TransformRelay,
    pub proxy: ImageProxy,
    pub prompts: PromptBuilder,
    pub provider_configured: bool,
    pub max_upload_bytes: usize,
    debug_log: Mutex<DebugSessions>,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self> {
        let provider = build_provider(&config.provider)?;
        Self::with_provider(config, provider)
    }

    pub fn with_provider(config: &Config, provider: Arc<dyn ImageProvider>) -> Result<Self> {
        Ok(Self {
            relay: TransformRelay::new(config, provider),
            proxy: ImageProxy::new(&config.proxy)?,
            prompts: PromptBuilder::new(config.prompt_mode),
            provider_configured: config.provider.api_key.is_some(),
            max_upload_bytes: config.max_upload_bytes,
            debug_log: Mutex::new(DebugSessions::new(config.debug_log_capacity, MAX_SESSIONS)),
        })
    }

    /// No-op when the caller sent no session id.
    pub fn record(&self, session: Option<&str>, kind: DebugKind, data: serde_json::Value) {
        let Some(session) = session else { return };
        if let Ok(mut sessions) = self.debug_log.lock() {
            sessions.record(session, kind, data);
        }
    }

    pub fn recent_debug(&self, session: Option<&str>, limit: usize) -> Vec<DebugEntry> {
        let Some(session) = session else {
            return Vec::new();
        };
        self.debug_log
            .lock()
            .map(|sessions| sessions.recent(session, limit))
            .unwrap_or_default()
    }
}
