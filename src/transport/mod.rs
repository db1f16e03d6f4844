//! Transport layer.
//!
//! A single [`Transport`] contract with two interchangeable implementations:
//! the cookie-aware standard transport over the shared pooled agent, and the
//! fingerprint-spoofing transport that presents a fixed TLS negotiation
//! signature. The implementation is chosen when the courier is built, never
//! per call. Responses come back unmodified; classifying status codes is the
//! caller's job.

pub mod agent;
pub mod fingerprint;
pub mod standard;

pub use agent::{AgentConfig, AgentManager, ProxySettings, SharedAgent, TlsOptions, TlsVersion};
pub use fingerprint::{FingerprintTransport, NegotiationProfile};
pub use standard::StandardTransport;

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use thiserror::Error;
use url::Url;

use crate::request::HeaderSet;

/// Wire-level failure surfaced by a transport. HTTP 4xx/5xx responses are
/// returned normally, never mapped into this error.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to convert header '{0}'")]
    InvalidHeader(String),
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Contract shared by both transport strategies.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        method: &Method,
        url: &Url,
        headers: &HeaderSet,
        body: Option<Bytes>,
    ) -> Result<WireResponse, TransportError>;
}

/// Raw response as the transport produced it.
#[derive(Debug, Clone)]
pub struct WireResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub url: Url,
}

impl WireResponse {
    pub(crate) async fn from_reqwest(
        response: reqwest::Response,
    ) -> Result<Self, TransportError> {
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let url = response.url().clone();
        let body = response.bytes().await?;
        Ok(Self {
            status,
            headers,
            body,
            url,
        })
    }

    /// Convenience helper returning the body as UTF-8 text.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Converts the assembled header set into the typed map the wire client
/// expects. Display case is restored by title-casing on HTTP/1.1.
pub(crate) fn request_headers(headers: &HeaderSet) -> Result<HeaderMap, TransportError> {
    let mut map = HeaderMap::new();
    for (name, value) in headers.iter() {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| TransportError::InvalidHeader(name.to_string()))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|_| TransportError::InvalidHeader(name.to_string()))?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}
