//! Request descriptors and the build pipeline pieces.
//!
//! A [`RequestDescriptor`] captures everything a caller can say about a
//! single API call. It is immutable once handed to the courier and consumed
//! exactly once; the derived [`ResolvedRequest`] is transient and discarded
//! after the transport returns.

pub mod body;
pub mod headers;
pub mod query;

pub use body::{FormPart, MultipartForm, PAYLOAD_JSON_FIELD, RequestBody};
pub use headers::HeaderSet;
pub use query::{QueryMap, QueryValue};

use bytes::Bytes;
use http::Method;
use serde_json::Value;
use thiserror::Error;
use url::Url;

/// Failure while building a request, before any network I/O.
#[derive(Debug, Error)]
pub enum ConstructionError {
    #[error("invalid request url: {0}")]
    Url(#[from] url::ParseError),
    #[error("payload serialization failed: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("flattened form fields require an object payload")]
    PayloadNotObject,
}

/// A binary attachment carried in a multipart body.
#[derive(Debug, Clone)]
pub struct FileAttachment {
    pub content: Bytes,
    pub filename: String,
    pub field: Option<String>,
}

impl FileAttachment {
    pub fn new(filename: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            content: content.into(),
            filename: filename.into(),
            field: None,
        }
    }

    /// Overrides the positional `files[{index}]` form field key.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

/// Everything a caller can specify for one API call.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    pub path: String,
    pub versioned: bool,
    pub query: QueryMap,
    pub payload: Option<Value>,
    pub files: Vec<FileAttachment>,
    pub auth: bool,
    pub reason: Option<String>,
    pub webhook: bool,
    pub dont_use_payload_json: bool,
    pub use_payload_json: bool,
    pub headers: Vec<(String, Option<String>)>,
    pub context: Option<Value>,
    pub secondary_token: Option<String>,
    pub captcha_key: Option<String>,
    pub captcha_rqtoken: Option<String>,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            versioned: true,
            query: QueryMap::new(),
            payload: None,
            files: Vec::new(),
            auth: true,
            reason: None,
            webhook: false,
            dont_use_payload_json: false,
            use_payload_json: false,
            headers: Vec::new(),
            context: None,
            secondary_token: None,
            captcha_key: None,
            captcha_rqtoken: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Targets the API origin directly, skipping the version segment.
    pub fn unversioned(mut self) -> Self {
        self.versioned = false;
        self
    }

    pub fn with_query(mut self, query: QueryMap) -> Self {
        self.query = query;
        self
    }

    pub fn query_param(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.query.insert(key, value);
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_file(mut self, file: FileAttachment) -> Self {
        self.files.push(file);
        self
    }

    /// Skips the Authorization header for this call.
    pub fn without_auth(mut self) -> Self {
        self.auth = false;
        self
    }

    /// Attaches an audit-log reason; it is percent-encoded into its header.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Webhook mode: every header except a single User-Agent is dropped.
    /// Callers relying on auth or custom headers will silently lose them.
    pub fn webhook(mut self) -> Self {
        self.webhook = true;
        self
    }

    /// With attachments, flattens payload fields into individual form parts
    /// instead of one JSON-encoded field.
    pub fn dont_use_payload_json(mut self) -> Self {
        self.dont_use_payload_json = true;
        self
    }

    /// Without attachments, forces the payload into a multipart form under
    /// the payload-JSON convention.
    pub fn use_payload_json(mut self) -> Self {
        self.use_payload_json = true;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), Some(value.into())));
        self
    }

    /// Suppresses a header that an earlier layer would otherwise set.
    pub fn suppress_header(mut self, name: impl Into<String>) -> Self {
        self.headers.push((name.into(), None));
        self
    }

    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_secondary_token(mut self, token: impl Into<String>) -> Self {
        self.secondary_token = Some(token.into());
        self
    }

    pub fn with_captcha_key(mut self, key: impl Into<String>) -> Self {
        self.captcha_key = Some(key.into());
        self
    }

    pub fn with_captcha_rqtoken(mut self, token: impl Into<String>) -> Self {
        self.captcha_rqtoken = Some(token.into());
        self
    }
}

/// Fully built request, ready for a transport. Transient: dropped as soon as
/// the transport call returns or fails.
#[derive(Debug, Clone)]
pub struct ResolvedRequest {
    pub url: Url,
    pub headers: HeaderSet,
    pub body: RequestBody,
}
