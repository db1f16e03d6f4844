//! Fingerprint-spoofing transport.
//!
//! Presents a fixed TLS negotiation signature so the handshake resembles a
//! specific browser stack instead of the host runtime's default. The profile
//! is carried as data: the literal signature string plus the cipher and ALPN
//! order it implies. Unlike the standard transport there is no shared pooled
//! agent here; the transport keeps an identity marker string in its place.

use async_trait::async_trait;
use bytes::Bytes;
use http::Method;
use url::Url;

use crate::request::HeaderSet;

use super::agent::TlsVersion;
use super::{Transport, TransportError, WireResponse, request_headers};

/// Fixed TLS negotiation signature of a desktop Chromium handshake.
const CHROME_SIGNATURE: &str = "771,4865-4866-4867-49195-49199-49196-49200-52393-52392-49171-49172-156-157-47-53,13-51-0-16-43-35-23-10-27-65037-18-5-11-65281-45-17513-41,29-23-24,0";

/// A browser TLS handshake profile.
#[derive(Debug, Clone)]
pub struct NegotiationProfile {
    pub signature: String,
    pub ciphers: Vec<String>,
    pub alpn: Vec<String>,
    pub min_version: TlsVersion,
}

impl NegotiationProfile {
    pub fn chrome_desktop() -> Self {
        Self {
            signature: CHROME_SIGNATURE.into(),
            ciphers: vec![
                "TLS_AES_128_GCM_SHA256".into(),
                "TLS_AES_256_GCM_SHA384".into(),
                "TLS_CHACHA20_POLY1305_SHA256".into(),
            ],
            alpn: vec!["http/1.1".into()],
            min_version: TlsVersion::Tls12,
        }
    }
}

impl Default for NegotiationProfile {
    fn default() -> Self {
        Self::chrome_desktop()
    }
}

/// Transport that negotiates with a spoofed handshake signature.
pub struct FingerprintTransport {
    profile: NegotiationProfile,
    identity: String,
    client: reqwest::Client,
}

impl FingerprintTransport {
    /// `identity` is a User-Agent-like marker handed to the fingerprinting
    /// layer, not a pooled connection agent.
    pub fn new(
        profile: NegotiationProfile,
        identity: impl Into<String>,
    ) -> Result<Self, TransportError> {
        let identity = identity.into();
        let mut builder = reqwest::Client::builder()
            .use_native_tls()
            .http1_title_case_headers()
            .min_tls_version(match profile.min_version {
                TlsVersion::Tls12 => reqwest::tls::Version::TLS_1_2,
                TlsVersion::Tls13 => reqwest::tls::Version::TLS_1_3,
            })
            .user_agent(identity.clone());
        if !profile.alpn.iter().any(|protocol| protocol == "h2") {
            builder = builder.http1_only();
        }
        let client = builder.build()?;
        Ok(Self {
            profile,
            identity,
            client,
        })
    }

    pub fn profile(&self) -> &NegotiationProfile {
        &self.profile
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }
}

#[async_trait]
impl Transport for FingerprintTransport {
    async fn send(
        &self,
        method: &Method,
        url: &Url,
        headers: &HeaderSet,
        body: Option<Bytes>,
    ) -> Result<WireResponse, TransportError> {
        log::trace!(
            "negotiating {} with signature {}",
            url,
            self.profile.signature
        );
        let header_map = request_headers(headers)?;

        let mut builder = self
            .client
            .request(method.clone(), url.clone())
            .headers(header_map);
        if let Some(bytes) = body {
            builder = builder.body(bytes);
        }

        let response = builder.send().await?;
        WireResponse::from_reqwest(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profile_is_the_chrome_signature() {
        let profile = NegotiationProfile::default();
        assert!(profile.signature.starts_with("771,"));
        assert_eq!(profile.min_version, TlsVersion::Tls12);
        assert!(!profile.ciphers.is_empty());
    }

    #[tokio::test]
    async fn transport_keeps_its_identity_marker() {
        let transport =
            FingerprintTransport::new(NegotiationProfile::default(), "client/1.0").unwrap();
        assert_eq!(transport.identity(), "client/1.0");
    }
}
