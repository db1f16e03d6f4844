//! Request body encoding.
//!
//! Picks exactly one of three body modes for a descriptor: a multipart form
//! when attachments are present, a JSON string for a bare payload, or a
//! multipart form holding only the JSON-encoded payload field when the
//! payload-JSON convention is forced. The matching content headers are
//! returned alongside the body so the assembler can merge them.

use bytes::Bytes;
use rand::{Rng, distributions::Alphanumeric};
use serde_json::Value;

use super::{ConstructionError, RequestDescriptor};

/// Form field name used for a JSON payload travelling inside a multipart body.
pub const PAYLOAD_JSON_FIELD: &str = "payload_json";

/// Encoded request body, exactly one mode per request.
#[derive(Debug, Clone)]
pub enum RequestBody {
    None,
    Json(String),
    Multipart(MultipartForm),
}

impl RequestBody {
    pub fn is_none(&self) -> bool {
        matches!(self, RequestBody::None)
    }

    /// Renders the body to wire bytes, `None` when there is no body.
    pub fn to_bytes(&self) -> Option<Bytes> {
        match self {
            RequestBody::None => None,
            RequestBody::Json(text) => Some(Bytes::from(text.clone())),
            RequestBody::Multipart(form) => Some(form.render()),
        }
    }
}

/// One part of a multipart form.
#[derive(Debug, Clone)]
pub struct FormPart {
    pub name: String,
    pub filename: Option<String>,
    pub content: Bytes,
}

/// Multipart form with an owned boundary.
#[derive(Debug, Clone)]
pub struct MultipartForm {
    boundary: String,
    parts: Vec<FormPart>,
}

impl MultipartForm {
    pub fn new() -> Self {
        let marker: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(24)
            .map(char::from)
            .collect();
        Self {
            boundary: format!("----------------------------{marker}"),
            parts: Vec::new(),
        }
    }

    pub fn append_text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.parts.push(FormPart {
            name: name.into(),
            filename: None,
            content: Bytes::from(value.into()),
        });
    }

    pub fn append_file(
        &mut self,
        name: impl Into<String>,
        filename: impl Into<String>,
        content: Bytes,
    ) {
        self.parts.push(FormPart {
            name: name.into(),
            filename: Some(filename.into()),
            content,
        });
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Renders the form to wire bytes. Binary content passes through
    /// unmodified.
    pub fn render(&self) -> Bytes {
        let mut out = Vec::new();
        for part in &self.parts {
            out.extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
            match &part.filename {
                Some(filename) => {
                    out.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                            part.name, filename
                        )
                        .as_bytes(),
                    );
                    out.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
                }
                None => {
                    out.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", part.name)
                            .as_bytes(),
                    );
                }
            }
            out.extend_from_slice(&part.content);
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        Bytes::from(out)
    }
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}

/// Encodes the descriptor body and returns it with the content headers the
/// chosen mode requires.
pub(crate) fn encode(
    descriptor: &RequestDescriptor,
) -> Result<(RequestBody, Vec<(String, String)>), ConstructionError> {
    if !descriptor.files.is_empty() {
        let mut form = MultipartForm::new();
        for (index, file) in descriptor.files.iter().enumerate() {
            let field = file
                .field
                .clone()
                .unwrap_or_else(|| format!("files[{index}]"));
            form.append_file(field, file.filename.clone(), file.content.clone());
        }
        if let Some(payload) = &descriptor.payload {
            if descriptor.dont_use_payload_json {
                let object = payload
                    .as_object()
                    .ok_or(ConstructionError::PayloadNotObject)?;
                for (key, value) in object {
                    form.append_text(key.clone(), field_text(value));
                }
            } else {
                form.append_text(PAYLOAD_JSON_FIELD, serde_json::to_string(payload)?);
            }
        }
        let content_type = form.content_type();
        return Ok((
            RequestBody::Multipart(form),
            vec![("Content-Type".to_string(), content_type)],
        ));
    }

    if let Some(payload) = &descriptor.payload
        && !payload.is_null()
    {
        if descriptor.use_payload_json {
            let mut form = MultipartForm::new();
            form.append_text(PAYLOAD_JSON_FIELD, serde_json::to_string(payload)?);
            let content_type = form.content_type();
            return Ok((
                RequestBody::Multipart(form),
                vec![("Content-Type".to_string(), content_type)],
            ));
        }
        return Ok((
            RequestBody::Json(serde_json::to_string(payload)?),
            vec![("Content-Type".to_string(), "application/json".to_string())],
        ));
    }

    Ok((RequestBody::None, Vec::new()))
}

/// Flattened form fields keep raw strings as-is; everything else serializes
/// by standard JSON rules.
fn field_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::FileAttachment;
    use http::Method;
    use serde_json::json;

    fn descriptor() -> RequestDescriptor {
        RequestDescriptor::new(Method::POST, "/channels/1/messages")
    }

    #[test]
    fn no_payload_and_no_files_yields_no_body() {
        let (body, headers) = encode(&descriptor()).unwrap();
        assert!(body.is_none());
        assert!(headers.is_empty());
    }

    #[test]
    fn null_payload_without_files_yields_no_body() {
        let descriptor = descriptor().with_payload(Value::Null);
        let (body, _) = encode(&descriptor).unwrap();
        assert!(body.is_none());
    }

    #[test]
    fn json_payload_sets_json_content_type() {
        let descriptor = descriptor().with_payload(json!({"content": "hi", "tts": false}));
        let (body, headers) = encode(&descriptor).unwrap();
        match body {
            RequestBody::Json(text) => {
                assert_eq!(text, r#"{"content":"hi","tts":false}"#);
            }
            other => panic!("expected JSON body, got {other:?}"),
        }
        assert_eq!(
            headers,
            vec![("Content-Type".to_string(), "application/json".to_string())]
        );
    }

    #[test]
    fn forced_payload_json_builds_single_field_form() {
        let descriptor = descriptor()
            .with_payload(json!({"content": "hi"}))
            .use_payload_json();
        let (body, headers) = encode(&descriptor).unwrap();
        let form = match body {
            RequestBody::Multipart(form) => form,
            other => panic!("expected multipart body, got {other:?}"),
        };
        assert_eq!(form.parts().len(), 1);
        assert_eq!(form.parts()[0].name, PAYLOAD_JSON_FIELD);
        assert_eq!(&form.parts()[0].content[..], br#"{"content":"hi"}"#);
        assert_eq!(headers[0].1, form.content_type());
    }

    #[test]
    fn files_use_positional_keys_and_payload_json() {
        let descriptor = descriptor()
            .with_file(FileAttachment::new("a.png", Bytes::from_static(b"\x89PNG")))
            .with_file(FileAttachment::new("b.txt", Bytes::from_static(b"hello")))
            .with_payload(json!({"content": "two files"}));
        let (body, _) = encode(&descriptor).unwrap();
        let form = match body {
            RequestBody::Multipart(form) => form,
            other => panic!("expected multipart body, got {other:?}"),
        };
        assert_eq!(form.parts().len(), 3);
        assert_eq!(form.parts()[0].name, "files[0]");
        assert_eq!(form.parts()[0].filename.as_deref(), Some("a.png"));
        assert_eq!(form.parts()[1].name, "files[1]");
        assert_eq!(form.parts()[2].name, PAYLOAD_JSON_FIELD);
        assert_eq!(&form.parts()[2].content[..], br#"{"content":"two files"}"#);
    }

    #[test]
    fn explicit_field_key_wins_over_positional() {
        let descriptor = descriptor().with_file(
            FileAttachment::new("avatar.png", Bytes::from_static(b"img")).with_field("avatar"),
        );
        let (body, _) = encode(&descriptor).unwrap();
        let form = match body {
            RequestBody::Multipart(form) => form,
            other => panic!("expected multipart body, got {other:?}"),
        };
        assert_eq!(form.parts()[0].name, "avatar");
    }

    #[test]
    fn flattened_payload_appends_each_field() {
        let descriptor = descriptor()
            .with_file(FileAttachment::new("a.png", Bytes::from_static(b"img")))
            .with_payload(json!({"name": "icon", "width": 64}))
            .dont_use_payload_json();
        let (body, _) = encode(&descriptor).unwrap();
        let form = match body {
            RequestBody::Multipart(form) => form,
            other => panic!("expected multipart body, got {other:?}"),
        };
        let names: Vec<&str> = form.parts().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["files[0]", "name", "width"]);
        assert_eq!(&form.parts()[1].content[..], b"icon");
        assert_eq!(&form.parts()[2].content[..], b"64");
    }

    #[test]
    fn flattened_payload_rejects_non_objects() {
        let descriptor = descriptor()
            .with_file(FileAttachment::new("a.png", Bytes::from_static(b"img")))
            .with_payload(json!("not an object"))
            .dont_use_payload_json();
        assert!(matches!(
            encode(&descriptor),
            Err(ConstructionError::PayloadNotObject)
        ));
    }

    #[test]
    fn rendered_form_carries_boundary_and_dispositions() {
        let mut form = MultipartForm::new();
        form.append_file("files[0]", "a.bin", Bytes::from_static(b"\x00\x01"));
        form.append_text(PAYLOAD_JSON_FIELD, "{}");
        let rendered = form.render();
        let text = String::from_utf8_lossy(&rendered);
        assert!(text.contains(form.boundary()));
        assert!(text.contains("Content-Disposition: form-data; name=\"files[0]\"; filename=\"a.bin\""));
        assert!(text.contains("Content-Disposition: form-data; name=\"payload_json\""));
        assert!(text.ends_with(&format!("--{}--\r\n", form.boundary())));
    }
}
