//! Cookie-aware standard transport.
//!
//! Dispatches through the shared pooled agent. Cookies set by one response
//! are attached to later requests for matching domains via the agent's
//! process-lifetime jar, including across concurrent in-flight calls.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use http::Method;
use url::Url;

use crate::request::HeaderSet;

use super::agent::{AgentConfig, AgentManager};
use super::{Transport, TransportError, WireResponse, request_headers};

pub struct StandardTransport {
    manager: Arc<AgentManager>,
    config: AgentConfig,
}

impl StandardTransport {
    pub fn new(manager: Arc<AgentManager>, config: AgentConfig) -> Self {
        Self { manager, config }
    }
}

#[async_trait]
impl Transport for StandardTransport {
    async fn send(
        &self,
        method: &Method,
        url: &Url,
        headers: &HeaderSet,
        body: Option<Bytes>,
    ) -> Result<WireResponse, TransportError> {
        let agent = self.manager.ensure(&self.config)?;
        let header_map = request_headers(headers)?;

        let mut builder = agent
            .client()
            .request(method.clone(), url.clone())
            .headers(header_map);
        if let Some(bytes) = body {
            builder = builder.body(bytes);
        }

        let response = builder.send().await?;
        WireResponse::from_reqwest(response).await
    }
}
