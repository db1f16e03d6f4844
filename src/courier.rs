//! Request pipeline orchestration.
//!
//! Wires the query encoder, header assembler, body encoder, and transport
//! into the single `execute` path: descriptor in, raw wire response out.
//! Construction is synchronous and fails before any I/O; the network call
//! then races a per-request timeout. This layer never retries and never
//! interprets status codes.

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::time::timeout;
use url::Url;

use crate::config::{AuthProvider, ClientConfig, TransportMode};
use crate::request::{
    ConstructionError, RequestDescriptor, ResolvedRequest, body, headers,
};
use crate::transport::{
    AgentManager, FingerprintTransport, StandardTransport, Transport, TransportError,
    WireResponse,
};

/// Result alias used across the dispatch layer.
pub type CourierResult<T> = Result<T, CourierError>;

/// Failure surfaced by [`Courier::execute`].
#[derive(Debug, Error)]
pub enum CourierError {
    #[error("request construction failed: {0}")]
    Construction(#[from] ConstructionError),
    #[error("request timed out after {after:?}")]
    Timeout { after: Duration },
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),
}

/// Fluent builder for [`Courier`].
pub struct CourierBuilder {
    config: ClientConfig,
    auth: Option<Arc<dyn AuthProvider>>,
    transport: Option<Arc<dyn Transport>>,
}

impl CourierBuilder {
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            auth: None,
            transport: None,
        }
    }

    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_auth_provider(mut self, provider: Arc<dyn AuthProvider>) -> Self {
        self.auth = Some(provider);
        self
    }

    /// Replaces the built-in transport selection, mainly for tests.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_transport_mode(mut self, mode: TransportMode) -> Self {
        self.config.transport_mode = mode;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn with_default_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.config.default_headers.push((name.into(), value.into()));
        self
    }

    pub fn build(self) -> CourierResult<Courier> {
        let agents = Arc::new(AgentManager::new());
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => match self.config.transport_mode {
                TransportMode::Fingerprint => Arc::new(FingerprintTransport::new(
                    self.config.negotiation.clone(),
                    self.config.user_agent.clone(),
                )?),
                TransportMode::Standard => Arc::new(StandardTransport::new(
                    agents.clone(),
                    self.config.agent.clone(),
                )),
            },
        };

        Ok(Courier {
            config: self.config,
            auth: self.auth,
            transport,
            agents,
        })
    }
}

impl Default for CourierBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds and dispatches API requests for the owning client.
pub struct Courier {
    config: ClientConfig,
    auth: Option<Arc<dyn AuthProvider>>,
    transport: Arc<dyn Transport>,
    agents: Arc<AgentManager>,
}

impl Courier {
    pub fn new(config: ClientConfig) -> CourierResult<Self> {
        Self::builder().with_config(config).build()
    }

    pub fn builder() -> CourierBuilder {
        CourierBuilder::new()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn agent_manager(&self) -> &Arc<AgentManager> {
        &self.agents
    }

    /// Builds the request and sends it through the configured transport.
    ///
    /// The transport call races the configured timeout; on expiry the
    /// in-flight call is dropped, which aborts it, and the failure surfaces
    /// as [`CourierError::Timeout`]. The timer is released on every exit
    /// path. Responses come back unmodified regardless of status code.
    pub async fn execute(&self, descriptor: RequestDescriptor) -> CourierResult<WireResponse> {
        let resolved = self.resolve(&descriptor)?;
        log::debug!("-> {} {}", descriptor.method, resolved.url);

        let started = Instant::now();
        let body = resolved.body.to_bytes();
        let outcome = timeout(
            self.config.request_timeout,
            self.transport
                .send(&descriptor.method, &resolved.url, &resolved.headers, body),
        )
        .await;

        match outcome {
            Ok(Ok(response)) => {
                log::debug!(
                    "<- {} {} -> {} ({:.2}s)",
                    descriptor.method,
                    resolved.url,
                    response.status,
                    started.elapsed().as_secs_f64()
                );
                Ok(response)
            }
            Ok(Err(err)) => Err(CourierError::Transport(err)),
            Err(_) => {
                log::warn!(
                    "{} {} timed out after {:?}",
                    descriptor.method,
                    resolved.url,
                    self.config.request_timeout
                );
                Err(CourierError::Timeout {
                    after: self.config.request_timeout,
                })
            }
        }
    }

    /// Resolves a descriptor into its final URL, header set, and body.
    fn resolve(&self, descriptor: &RequestDescriptor) -> Result<ResolvedRequest, ConstructionError> {
        let query = descriptor.query.encode();
        let base = if descriptor.versioned {
            format!("{}/v{}", self.config.api, self.config.version)
        } else {
            self.config.api.clone()
        };
        let mut target = format!("{}{}", base, descriptor.path);
        if !query.is_empty() {
            target.push('?');
            target.push_str(&query);
        }
        let url = Url::parse(&target)?;

        let token = if descriptor.auth {
            self.auth.as_ref().and_then(|provider| provider.token())
        } else {
            None
        };

        let mut headers =
            headers::assemble(&self.config, descriptor, token.as_deref(), url.host_str())?;
        let (body, content_headers) = body::encode(descriptor)?;
        for (name, value) in content_headers {
            headers.set(name, value);
        }
        headers::append_captcha(&mut headers, descriptor);

        Ok(ResolvedRequest { url, headers, body })
    }
}
