//! Client configuration.
//!
//! Ambient settings shared by every request a courier sends: API origin and
//! version, the browser identity presented to the platform, default headers,
//! transport selection, and the agent settings captured on first use.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::transport::agent::AgentConfig;
use crate::transport::fingerprint::NegotiationProfile;

/// Supplies the Authorization token for authenticated calls.
pub trait AuthProvider: Send + Sync {
    fn token(&self) -> Option<String>;
}

/// Fixed-token supplier for clients whose token never rotates.
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            token: token.into(),
        })
    }
}

impl AuthProvider for StaticTokenProvider {
    fn token(&self) -> Option<String> {
        Some(self.token.clone())
    }
}

/// Which transport strategy the courier is built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    /// Shared pooled agent with the process-lifetime cookie jar.
    Standard,
    /// Spoofed TLS negotiation signature, no pooled agent.
    Fingerprint,
}

/// Client identity blob encoded into its dedicated header on every request.
#[derive(Debug, Clone, Serialize)]
pub struct ClientProperties {
    pub os: String,
    pub browser: String,
    pub device: String,
    pub system_locale: String,
    pub browser_user_agent: String,
    pub browser_version: String,
    pub os_version: String,
    pub release_channel: String,
    pub client_build_number: u32,
}

impl Default for ClientProperties {
    fn default() -> Self {
        Self {
            os: "Windows".into(),
            browser: "Chrome".into(),
            device: String::new(),
            system_locale: "en-US".into(),
            browser_user_agent: default_user_agent(),
            browser_version: "108.0.0.0".into(),
            os_version: "10".into(),
            release_channel: "stable".into(),
            client_build_number: 165486,
        }
    }
}

/// Everything the request builder needs from the owning client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API origin, without a trailing slash.
    pub api: String,
    /// Version segment appended as `/v{version}` unless a call opts out.
    pub version: u8,
    /// Web origin used for the `origin` header.
    pub web_origin: String,
    pub referer: String,
    pub user_agent: String,
    pub locale: String,
    pub timezone: String,
    pub sec_ch_ua: String,
    pub sec_ch_ua_mobile: String,
    pub sec_ch_ua_platform: String,
    pub debug_options: String,
    pub properties: ClientProperties,
    /// Client-level default headers, layered over the browser defaults.
    pub default_headers: Vec<(String, String)>,
    pub request_timeout: Duration,
    pub transport_mode: TransportMode,
    pub agent: AgentConfig,
    pub negotiation: NegotiationProfile,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api: "https://chat.example.com/api".into(),
            version: 9,
            web_origin: "https://chat.example.com".into(),
            referer: "https://chat.example.com/channels/@me".into(),
            user_agent: default_user_agent(),
            locale: "en-US".into(),
            timezone: "UTC".into(),
            sec_ch_ua: "\"Not?A_Brand\";v=\"8\", \"Chromium\";v=\"108\"".into(),
            sec_ch_ua_mobile: "?0".into(),
            sec_ch_ua_platform: "\"Windows\"".into(),
            debug_options: "bugReporterEnabled".into(),
            properties: ClientProperties::default(),
            default_headers: Vec::new(),
            request_timeout: Duration::from_secs(15),
            transport_mode: TransportMode::Standard,
            agent: AgentConfig::default(),
            negotiation: NegotiationProfile::default(),
        }
    }
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/108.0.0.0 Safari/537.36"
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn properties_serialize_with_snake_case_keys() {
        let value = serde_json::to_value(ClientProperties::default()).unwrap();
        assert!(value.get("browser_user_agent").is_some());
        assert!(value.get("client_build_number").is_some());
    }

    #[test]
    fn static_provider_always_returns_its_token() {
        let provider = StaticTokenProvider::new("abc");
        assert_eq!(provider.token().as_deref(), Some("abc"));
    }
}
