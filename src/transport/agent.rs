//! Shared transport agent.
//!
//! One hardened connection pool per manager lifetime. The agent is built
//! lazily on the first request and then cached: later calls get the same
//! instance back regardless of the configuration they pass, so agent
//! settings are captured exactly once. That is an intentional invariant of
//! this layer, not an oversight.

use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use reqwest::cookie::Jar;

use super::TransportError;

/// Minimum TLS protocol version accepted by the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsVersion {
    Tls12,
    Tls13,
}

impl TlsVersion {
    fn as_reqwest(self) -> reqwest::tls::Version {
        match self {
            TlsVersion::Tls12 => reqwest::tls::Version::TLS_1_2,
            TlsVersion::Tls13 => reqwest::tls::Version::TLS_1_3,
        }
    }
}

/// Transport-level TLS options. Hardening overwrites these on the first
/// request; the cipher list is kept as ordered preference data because the
/// backing TLS stack exposes no portable cipher setter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsOptions {
    pub keepalive: bool,
    pub honor_cipher_order: bool,
    pub min_version: TlsVersion,
    pub ciphers: Vec<String>,
}

impl Default for TlsOptions {
    fn default() -> Self {
        Self {
            keepalive: false,
            honor_cipher_order: false,
            min_version: TlsVersion::Tls12,
            ciphers: Vec::new(),
        }
    }
}

impl TlsOptions {
    fn harden(&mut self) {
        self.keepalive = true;
        self.honor_cipher_order = true;
        self.min_version = TlsVersion::Tls12;
        self.ciphers = hardened_cipher_list();
    }
}

/// Proxy endpoint with its own nested transport options. The proxy tunnel
/// negotiates TLS separately, so hardening must reach this inner object too.
#[derive(Debug, Clone)]
pub struct ProxySettings {
    pub endpoint: String,
    pub tls: TlsOptions,
}

impl ProxySettings {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            tls: TlsOptions::default(),
        }
    }
}

/// Base configuration the first request builds the agent from.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub tls: TlsOptions,
    pub proxy: Option<ProxySettings>,
    pub pool_idle_timeout: Duration,
    pub pool_max_idle_per_host: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            tls: TlsOptions::default(),
            proxy: None,
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 8,
        }
    }
}

/// The process-wide agent: hardened pooled client plus the cookie jar that
/// lives as long as the agent does.
pub struct SharedAgent {
    client: reqwest::Client,
    cookies: Arc<Jar>,
    tls: TlsOptions,
}

impl SharedAgent {
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn cookie_jar(&self) -> &Arc<Jar> {
        &self.cookies
    }

    /// Effective TLS options after hardening.
    pub fn tls(&self) -> &TlsOptions {
        &self.tls
    }
}

/// Lazily-initialized holder for the [`SharedAgent`].
///
/// `ensure` is idempotent: the first caller's configuration wins and every
/// later call returns the cached agent untouched. Tests get a fresh agent by
/// constructing a fresh manager.
#[derive(Default)]
pub struct AgentManager {
    agent: OnceCell<SharedAgent>,
}

impl AgentManager {
    pub fn new() -> Self {
        Self {
            agent: OnceCell::new(),
        }
    }

    pub fn ensure(&self, config: &AgentConfig) -> Result<&SharedAgent, TransportError> {
        self.agent.get_or_try_init(|| build_agent(config))
    }

    pub fn initialized(&self) -> bool {
        self.agent.get().is_some()
    }
}

/// Applies the hardening settings onto the top-level TLS options and, when a
/// proxy is supplied, onto the proxy's nested options as well.
pub(crate) fn hardened_config(config: &AgentConfig) -> AgentConfig {
    let mut config = config.clone();
    config.tls.harden();
    if let Some(proxy) = config.proxy.as_mut() {
        proxy.tls.harden();
    }
    config
}

fn build_agent(config: &AgentConfig) -> Result<SharedAgent, TransportError> {
    let config = hardened_config(config);
    let cookies = Arc::new(Jar::default());

    let mut builder = reqwest::Client::builder()
        .use_native_tls()
        .cookie_provider(cookies.clone())
        .http1_title_case_headers()
        .pool_idle_timeout(config.pool_idle_timeout)
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .min_tls_version(config.tls.min_version.as_reqwest());

    if config.tls.keepalive {
        builder = builder.tcp_keepalive(Duration::from_secs(60));
    }
    if let Some(proxy) = &config.proxy {
        builder = builder.proxy(reqwest::Proxy::all(proxy.endpoint.as_str())?);
    }

    let client = builder.build()?;
    log::debug!("transport agent initialized");

    Ok(SharedAgent {
        client,
        cookies,
        tls: config.tls,
    })
}

/// Ordered cipher preference applied by hardening.
fn hardened_cipher_list() -> Vec<String> {
    vec![
        "TLS_AES_128_GCM_SHA256".into(),
        "TLS_AES_256_GCM_SHA384".into(),
        "TLS_CHACHA20_POLY1305_SHA256".into(),
        "ECDHE-ECDSA-AES128-GCM-SHA256".into(),
        "ECDHE-RSA-AES128-GCM-SHA256".into(),
        "ECDHE-ECDSA-AES256-GCM-SHA384".into(),
        "ECDHE-RSA-AES256-GCM-SHA384".into(),
        "ECDHE-ECDSA-CHACHA20-POLY1305".into(),
        "ECDHE-RSA-CHACHA20-POLY1305".into(),
    ]
}
