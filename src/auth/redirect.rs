//! Post-authentication redirect policy.
//!
//! Only same-site targets are honored so a crafted `callbackUrl` cannot bounce
//! a freshly signed-in user to a foreign origin.

use url::Url;

use crate::config::AuthConfig;

#[derive(Debug, Clone)]
pub struct RedirectPolicy {
    base_url: Url,
    fallback: String,
}

impl RedirectPolicy {
    pub fn new(base_url: Url, callback_url: Option<String>) -> Self {
        let fallback = callback_url.unwrap_or_else(|| base_url.to_string());
        Self { base_url, fallback }
    }

    pub fn from_config(cfg: &AuthConfig) -> Self {
        Self::new(cfg.base_url.clone(), cfg.callback_url.clone())
    }

    /// Return `target` if it stays on this site, otherwise the safe default.
    ///
    /// The target is resolved against the base URL the way a browser would
    /// (tab, CR and LF dropped, backslash read as `/`) and kept only when the
    /// result has the base origin.
    pub fn resolve(&self, target: &str) -> String {
        if !target.starts_with('/') && Url::parse(target).is_err() {
            return self.fallback.clone();
        }
        match self.base_url.join(target) {
            Ok(url) if url.origin() == self.base_url.origin() => target.to_string(),
            _ => self.fallback.clone(),
        }
    }
}
