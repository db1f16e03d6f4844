//! # courier-rs
//!
//! Browser-faithful REST request construction and dispatch for chat-platform
//! API clients.
//!
//! Given an abstract "call this endpoint with these options" descriptor, the
//! courier assembles a fully-formed HTTP request (URL, layered browser
//! headers, encoded body, hardened TLS behavior) and dispatches it through
//! one of two interchangeable transports under a per-request timeout.
//!
//! ## Features
//!
//! - Layered header assembly with per-call overrides and webhook stripping
//! - JSON, multipart, and payload-JSON body encoding with file attachments
//! - Once-initialized hardened connection agent shared across requests
//! - Cookie-aware standard transport and fingerprint-spoofing transport
//! - Distinct timeout classification with guaranteed timer release
//!
//! ## Example
//!
//! ```no_run
//! use courier_rs::{ClientConfig, Courier, RequestDescriptor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let courier = Courier::new(ClientConfig::default())?;
//!     let response = courier.execute(RequestDescriptor::get("/users/@me")).await?;
//!     println!("status: {}", response.status);
//!     Ok(())
//! }
//! ```

mod courier;

pub mod config;
pub mod request;
pub mod transport;

pub use crate::courier::{Courier, CourierBuilder, CourierError, CourierResult};

pub use crate::config::{
    AuthProvider,
    ClientConfig,
    ClientProperties,
    StaticTokenProvider,
    TransportMode,
};

pub use crate::request::{
    ConstructionError,
    FileAttachment,
    FormPart,
    HeaderSet,
    MultipartForm,
    PAYLOAD_JSON_FIELD,
    QueryMap,
    QueryValue,
    RequestBody,
    RequestDescriptor,
    ResolvedRequest,
};

pub use crate::transport::{
    AgentConfig,
    AgentManager,
    FingerprintTransport,
    NegotiationProfile,
    ProxySettings,
    SharedAgent,
    StandardTransport,
    TlsOptions,
    TlsVersion,
    Transport,
    TransportError,
    WireResponse,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
