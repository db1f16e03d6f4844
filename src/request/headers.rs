//! Header assembly.
//!
//! Builds the final header set as a layered overlay of partial maps:
//! browser-identity defaults, client defaults, the forced User-Agent,
//! auth/reason headers, then per-call overrides. Later layers win, entries
//! whose resolved value is absent are filtered at the end, and the webhook
//! override collapses everything down to a single User-Agent. Captcha
//! headers form the true final layer and survive even webhook mode.

use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::config::ClientConfig;

use super::{ConstructionError, RequestDescriptor};

/// Case-preserving header map with case-insensitively unique keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    entries: Vec<(String, String)>,
}

impl HeaderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a header, replacing any existing value whose name matches
    /// ignoring case. The first writer's spelling is kept.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn remove(&mut self, name: &str) {
        self.entries
            .retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

/// Overlay map used while layering; an absent value marks a header for
/// removal once all layers are applied.
#[derive(Debug, Default)]
struct HeaderOverlay {
    entries: Vec<(String, Option<String>)>,
}

impl HeaderOverlay {
    fn apply(&mut self, name: impl Into<String>, value: Option<String>) {
        let name = name.into();
        match self
            .entries
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.apply(name, Some(value.into()));
    }

    fn finish(self) -> HeaderSet {
        let mut headers = HeaderSet::new();
        for (name, value) in self.entries {
            if let Some(value) = value {
                headers.set(name, value);
            }
        }
        headers
    }
}

/// Builds the full header set for a request, in precedence order.
pub(crate) fn assemble(
    config: &ClientConfig,
    descriptor: &RequestDescriptor,
    auth_token: Option<&str>,
    authority: Option<&str>,
) -> Result<HeaderSet, ConstructionError> {
    let mut overlay = HeaderOverlay::default();

    // Layer 1: browser-identity defaults.
    if let Some(host) = authority {
        overlay.set("authority", host);
    }
    overlay.set("accept", "*/*");
    overlay.set("accept-language", config.locale.clone());
    overlay.set("sec-ch-ua", config.sec_ch_ua.clone());
    overlay.set("sec-ch-ua-mobile", config.sec_ch_ua_mobile.clone());
    overlay.set("sec-ch-ua-platform", config.sec_ch_ua_platform.clone());
    overlay.set("sec-fetch-dest", "empty");
    overlay.set("sec-fetch-mode", "cors");
    overlay.set("sec-fetch-site", "same-origin");
    overlay.set("x-debug-options", config.debug_options.clone());
    overlay.set("x-client-locale", config.locale.clone());
    overlay.set("x-client-timezone", config.timezone.clone());
    overlay.set("x-client-properties", encode_properties(config)?);
    overlay.set("Referer", config.referer.clone());
    overlay.set("origin", config.web_origin.clone());
    overlay.set("Referrer-Policy", "strict-origin-when-cross-origin");

    // Layer 2: client-level defaults.
    for (name, value) in &config.default_headers {
        overlay.set(name.clone(), value.clone());
    }

    // Layer 3: the resolved User-Agent, forced after the defaults so it can
    // only be overridden by explicit per-call headers.
    overlay.set("User-Agent", config.user_agent.clone());

    if descriptor.auth
        && let Some(token) = auth_token
    {
        overlay.set("Authorization", token);
    }
    if let Some(reason) = &descriptor.reason {
        overlay.set("X-Audit-Log-Reason", urlencoding::encode(reason).into_owned());
    }

    // Per-call overrides; an absent value suppresses the header entirely.
    for (name, value) in &descriptor.headers {
        overlay.apply(name.clone(), value.clone());
    }

    let mut headers = overlay.finish();

    // Webhook calls carry no identifying headers beyond the client UA.
    if descriptor.webhook {
        headers = HeaderSet::new();
        headers.set("User-Agent", config.user_agent.clone());
    }

    if let Some(context) = &descriptor.context {
        headers.set(
            "X-Context-Properties",
            STANDARD.encode(serde_json::to_string(context)?),
        );
    }
    if let Some(token) = &descriptor.secondary_token {
        headers.set("X-Mfa-Authorization", token.clone());
    }

    Ok(headers)
}

/// Appends captcha headers when present and non-empty. This runs after body
/// content headers are merged, making captcha the final layer of the set.
pub(crate) fn append_captcha(headers: &mut HeaderSet, descriptor: &RequestDescriptor) {
    if let Some(key) = &descriptor.captcha_key
        && !key.is_empty()
    {
        headers.set("X-Captcha-Key", key.clone());
    }
    if let Some(token) = &descriptor.captcha_rqtoken
        && !token.is_empty()
    {
        headers.set("X-Captcha-Rqtoken", token.clone());
    }
}

/// Base64 blob of the client-properties object, with the browser UA synced
/// to the resolved User-Agent before encoding.
fn encode_properties(config: &ClientConfig) -> Result<String, ConstructionError> {
    let mut properties = config.properties.clone();
    properties.browser_user_agent = config.user_agent.clone();
    Ok(STANDARD.encode(serde_json::to_string(&properties)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use serde_json::json;

    fn config() -> ClientConfig {
        ClientConfig::default()
    }

    fn descriptor() -> RequestDescriptor {
        RequestDescriptor::new(Method::GET, "/users/@me")
    }

    fn assemble_ok(config: &ClientConfig, descriptor: &RequestDescriptor) -> HeaderSet {
        assemble(config, descriptor, Some("token-value"), Some("chat.example.com")).unwrap()
    }

    #[test]
    fn defaults_include_browser_identity() {
        let headers = assemble_ok(&config(), &descriptor());
        assert_eq!(headers.get("authority"), Some("chat.example.com"));
        assert_eq!(headers.get("accept"), Some("*/*"));
        assert_eq!(headers.get("sec-fetch-mode"), Some("cors"));
        assert!(headers.contains("x-client-properties"));
        assert_eq!(
            headers.get("Referrer-Policy"),
            Some("strict-origin-when-cross-origin")
        );
    }

    #[test]
    fn properties_blob_carries_resolved_user_agent() {
        let config = config();
        let headers = assemble_ok(&config, &descriptor());
        let blob = headers.get("x-client-properties").unwrap();
        let decoded = STANDARD.decode(blob).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&decoded).unwrap();
        assert_eq!(
            value["browser_user_agent"].as_str(),
            Some(config.user_agent.as_str())
        );
    }

    #[test]
    fn per_call_header_overrides_default() {
        let descriptor = descriptor().with_header("accept", "application/json");
        let headers = assemble_ok(&config(), &descriptor);
        assert_eq!(headers.get("accept"), Some("application/json"));
    }

    #[test]
    fn absent_override_removes_default() {
        let descriptor = descriptor().suppress_header("x-debug-options");
        let headers = assemble_ok(&config(), &descriptor);
        assert!(!headers.contains("x-debug-options"));
    }

    #[test]
    fn per_call_header_can_override_user_agent() {
        let descriptor = descriptor().with_header("User-Agent", "custom/1.0");
        let headers = assemble_ok(&config(), &descriptor);
        assert_eq!(headers.get("user-agent"), Some("custom/1.0"));
    }

    #[test]
    fn client_defaults_cannot_override_user_agent() {
        let mut config = config();
        config
            .default_headers
            .push(("User-Agent".to_string(), "stale/0.1".to_string()));
        let headers = assemble_ok(&config, &descriptor());
        assert_eq!(headers.get("User-Agent"), Some(config.user_agent.as_str()));
    }

    #[test]
    fn authorization_is_skipped_when_auth_disabled() {
        let descriptor = descriptor().without_auth();
        let headers = assemble_ok(&config(), &descriptor);
        assert!(!headers.contains("Authorization"));
    }

    #[test]
    fn authorization_uses_supplied_token() {
        let headers = assemble_ok(&config(), &descriptor());
        assert_eq!(headers.get("Authorization"), Some("token-value"));
    }

    #[test]
    fn reason_is_percent_encoded() {
        let descriptor = descriptor().with_reason("test reason");
        let headers = assemble_ok(&config(), &descriptor);
        assert_eq!(headers.get("X-Audit-Log-Reason"), Some("test%20reason"));
    }

    #[test]
    fn webhook_mode_strips_to_user_agent() {
        let config = config();
        let descriptor = descriptor()
            .with_reason("ignored")
            .with_header("X-Custom", "ignored")
            .webhook();
        let headers = assemble_ok(&config, &descriptor);
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("User-Agent"), Some(config.user_agent.as_str()));
    }

    #[test]
    fn captcha_headers_survive_webhook_mode() {
        let descriptor = descriptor()
            .webhook()
            .with_captcha_key("captcha-key")
            .with_captcha_rqtoken("rq-token");
        let mut headers = assemble_ok(&config(), &descriptor);
        append_captcha(&mut headers, &descriptor);
        assert_eq!(headers.len(), 3);
        assert_eq!(headers.get("X-Captcha-Key"), Some("captcha-key"));
        assert_eq!(headers.get("X-Captcha-Rqtoken"), Some("rq-token"));
    }

    #[test]
    fn empty_captcha_values_are_ignored() {
        let descriptor = descriptor().with_captcha_key("").with_captcha_rqtoken("");
        let mut headers = assemble_ok(&config(), &descriptor);
        append_captcha(&mut headers, &descriptor);
        assert!(!headers.contains("X-Captcha-Key"));
        assert!(!headers.contains("X-Captcha-Rqtoken"));
    }

    #[test]
    fn context_and_secondary_token_are_added_last() {
        let descriptor = descriptor()
            .with_context(json!({"location": "sidebar"}))
            .with_secondary_token("mfa-token");
        let headers = assemble_ok(&config(), &descriptor);
        let blob = headers.get("X-Context-Properties").unwrap();
        let decoded = STANDARD.decode(blob).unwrap();
        assert_eq!(decoded, br#"{"location":"sidebar"}"#);
        assert_eq!(headers.get("X-Mfa-Authorization"), Some("mfa-token"));
    }
}
