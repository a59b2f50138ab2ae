//! Untyped request and response bodies.

use std::fmt;

use bytes::Bytes;
use serde::Serialize;

/// Content type used for JSON payloads.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Content type used for text payloads.
pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Content type used for binary payloads.
pub const BINARY_CONTENT_TYPE: &str = "application/octet-stream";

/// A body carried by a [`Request`](crate::Request) or
/// [`Response`](crate::Response).
///
/// Bodies are untyped: handlers inspect the variant they expect.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use portico_core::Payload;
///
/// let body = Payload::decode(Some("application/json"), Bytes::from_static(b"{\"id\":\"7\"}"));
/// assert_eq!(body.as_json().unwrap()["id"], "7");
///
/// let body = Payload::decode(None, Bytes::from_static(b"hello"));
/// assert_eq!(body.as_text(), Some("hello"));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Payload {
    /// No body.
    #[default]
    Empty,
    /// A JSON document.
    Json(serde_json::Value),
    /// UTF-8 text.
    Text(String),
    /// Raw bytes.
    Binary(Bytes),
}

impl Payload {
    /// Serializes a value into a JSON payload.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(Self::Json)
    }

    /// Decodes raw body bytes received from an engine.
    ///
    /// Empty bodies become [`Payload::Empty`]. Bodies declared as JSON that
    /// parse become [`Payload::Json`]. Any other valid UTF-8 becomes
    /// [`Payload::Text`], and everything else [`Payload::Binary`].
    #[must_use]
    pub fn decode(content_type: Option<&str>, bytes: Bytes) -> Self {
        if bytes.is_empty() {
            return Self::Empty;
        }

        if content_type.is_some_and(is_json_content_type) {
            if let Ok(value) = serde_json::from_slice(&bytes) {
                return Self::Json(value);
            }
        }

        match String::from_utf8(bytes.to_vec()) {
            Ok(text) => Self::Text(text),
            Err(_) => Self::Binary(bytes),
        }
    }

    /// Encodes the payload into bytes for the wire.
    #[must_use]
    pub fn to_bytes(&self) -> Bytes {
        match self {
            Self::Empty => Bytes::new(),
            Self::Json(value) => Bytes::from(value.to_string()),
            Self::Text(text) => Bytes::from(text.clone()),
            Self::Binary(bytes) => bytes.clone(),
        }
    }

    /// Returns the content type this payload is emitted with, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&'static str> {
        match self {
            Self::Empty => None,
            Self::Json(_) => Some(JSON_CONTENT_TYPE),
            Self::Text(_) => Some(TEXT_CONTENT_TYPE),
            Self::Binary(_) => Some(BINARY_CONTENT_TYPE),
        }
    }

    /// Returns true if there is no body.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns the JSON document, if this is a JSON payload.
    #[must_use]
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the text, if this is a text payload.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

fn is_json_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "application/json" || mime.ends_with("+json")
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Json(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
            Self::Binary(bytes) => write!(f, "<{} bytes>", bytes.len()),
        }
    }
}

impl From<serde_json::Value> for Payload {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Bytes> for Payload {
    fn from(bytes: Bytes) -> Self {
        Self::Binary(bytes)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Binary(Bytes::from(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_empty() {
        assert_eq!(
            Payload::decode(Some("application/json"), Bytes::new()),
            Payload::Empty
        );
    }

    #[test]
    fn test_decode_json() {
        let body = Payload::decode(
            Some("application/json; charset=utf-8"),
            Bytes::from_static(br#"{"name":"widget"}"#),
        );
        assert_eq!(body, Payload::Json(json!({"name": "widget"})));

        let body = Payload::decode(
            Some("application/problem+json"),
            Bytes::from_static(br#"{"title":"oops"}"#),
        );
        assert!(body.as_json().is_some());
    }

    #[test]
    fn test_decode_invalid_json_falls_back_to_text() {
        let body = Payload::decode(Some("application/json"), Bytes::from_static(b"{nope"));
        assert_eq!(body, Payload::Text("{nope".to_string()));
    }

    #[test]
    fn test_decode_binary() {
        let body = Payload::decode(None, Bytes::from_static(&[0xff, 0xfe, 0x00]));
        assert!(matches!(body, Payload::Binary(_)));
    }

    #[test]
    fn test_encoding_and_content_type() {
        let body = Payload::from(json!({"id": "7"}));
        assert_eq!(body.to_bytes(), Bytes::from_static(br#"{"id":"7"}"#));
        assert_eq!(body.content_type(), Some(JSON_CONTENT_TYPE));

        let body = Payload::from("denied");
        assert_eq!(body.to_bytes(), Bytes::from_static(b"denied"));
        assert_eq!(body.content_type(), Some(TEXT_CONTENT_TYPE));

        assert_eq!(Payload::Empty.content_type(), None);
        assert!(Payload::Empty.to_bytes().is_empty());
    }

    #[test]
    fn test_json_preserves_key_order() {
        let body = Payload::decode(
            Some("application/json"),
            Bytes::from_static(br#"{"z":1,"a":2}"#),
        );
        assert_eq!(body.to_bytes(), Bytes::from_static(br#"{"z":1,"a":2}"#));
    }

    #[test]
    fn test_display() {
        assert_eq!(Payload::from("denied").to_string(), "denied");
        assert_eq!(Payload::from(json!({"a": 1})).to_string(), r#"{"a":1}"#);
        assert_eq!(Payload::from(vec![1, 2, 3]).to_string(), "<3 bytes>");
        assert_eq!(Payload::Empty.to_string(), "");
    }
}
