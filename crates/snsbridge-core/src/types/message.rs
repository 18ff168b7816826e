//! Outbound message types
//!
//! A [`Message`] is an opaque payload plus an insertion-ordered set of headers.
//! Header values form a closed set of kinds; anything SNS cannot carry is
//! represented by [`HeaderValue::Other`] so the channel can drop it explicitly.

use bytes::Bytes;
use std::fmt;

use crate::{
    CONTENT_TYPE_HEADER, ID_HEADER, MESSAGE_DEDUPLICATION_ID_HEADER, MESSAGE_GROUP_ID_HEADER,
    NOTIFICATION_SUBJECT_HEADER,
};

// ============================================================================
// Header Values
// ============================================================================

/// Numeric header value, tagged with its numeric subtype
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberValue {
    Byte(i8),
    Short(i16),
    Integer(i32),
    Long(i64),
    BigInteger(i128),
    Float(f32),
    Double(f64),
}

impl NumberValue {
    /// Fully-qualified subtype name used in `Number.<subtype>` data types.
    ///
    /// The names match the ones JVM consumers of SNS attributes expect, so
    /// messages published from here can be read back by them.
    pub fn subtype(&self) -> &'static str {
        match self {
            NumberValue::Byte(_) => "java.lang.Byte",
            NumberValue::Short(_) => "java.lang.Short",
            NumberValue::Integer(_) => "java.lang.Integer",
            NumberValue::Long(_) => "java.lang.Long",
            NumberValue::BigInteger(_) => "java.math.BigInteger",
            NumberValue::Float(_) => "java.lang.Float",
            NumberValue::Double(_) => "java.lang.Double",
        }
    }
}

impl fmt::Display for NumberValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumberValue::Byte(v) => write!(f, "{}", v),
            NumberValue::Short(v) => write!(f, "{}", v),
            NumberValue::Integer(v) => write!(f, "{}", v),
            NumberValue::Long(v) => write!(f, "{}", v),
            NumberValue::BigInteger(v) => write!(f, "{}", v),
            NumberValue::Float(v) => write!(f, "{}", v),
            NumberValue::Double(v) => write!(f, "{}", v),
        }
    }
}

/// Value of a single message header
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderValue {
    Text(String),
    Number(NumberValue),
    Bytes(Bytes),
    List(Vec<String>),
    Null,
    /// A value of a kind SNS has no attribute type for
    Other { kind: String, display: String },
}

impl HeaderValue {
    /// Wrap an arbitrary displayable value as an unsupported kind
    pub fn other<T: fmt::Display>(value: &T) -> Self {
        HeaderValue::Other {
            kind: std::any::type_name::<T>().to_string(),
            display: value.to_string(),
        }
    }

    /// Name of the value's kind, used in diagnostics
    pub fn kind(&self) -> &str {
        match self {
            HeaderValue::Text(_) => "text",
            HeaderValue::Number(n) => n.subtype(),
            HeaderValue::Bytes(_) => "bytes",
            HeaderValue::List(_) => "list",
            HeaderValue::Null => "null",
            HeaderValue::Other { kind, .. } => kind,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, HeaderValue::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            HeaderValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// String form of the value, `None` for null
    pub fn to_display_string(&self) -> Option<String> {
        match self {
            HeaderValue::Text(s) => Some(s.clone()),
            HeaderValue::Number(n) => Some(n.to_string()),
            HeaderValue::Bytes(b) => Some(String::from_utf8_lossy(b).into_owned()),
            HeaderValue::List(items) => Some(format!("[{}]", items.join(", "))),
            HeaderValue::Null => None,
            HeaderValue::Other { display, .. } => Some(display.clone()),
        }
    }
}

impl From<&str> for HeaderValue {
    fn from(value: &str) -> Self {
        HeaderValue::Text(value.to_string())
    }
}

impl From<String> for HeaderValue {
    fn from(value: String) -> Self {
        HeaderValue::Text(value)
    }
}

impl From<Bytes> for HeaderValue {
    fn from(value: Bytes) -> Self {
        HeaderValue::Bytes(value)
    }
}

impl From<Vec<u8>> for HeaderValue {
    fn from(value: Vec<u8>) -> Self {
        HeaderValue::Bytes(Bytes::from(value))
    }
}

impl From<Vec<String>> for HeaderValue {
    fn from(value: Vec<String>) -> Self {
        HeaderValue::List(value)
    }
}

impl From<Vec<&str>> for HeaderValue {
    fn from(value: Vec<&str>) -> Self {
        HeaderValue::List(value.into_iter().map(String::from).collect())
    }
}

impl From<NumberValue> for HeaderValue {
    fn from(value: NumberValue) -> Self {
        HeaderValue::Number(value)
    }
}

impl<T: Into<HeaderValue>> From<Option<T>> for HeaderValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(HeaderValue::Null)
    }
}

macro_rules! number_header {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for HeaderValue {
                fn from(value: $ty) -> Self {
                    HeaderValue::Number(NumberValue::$variant(value))
                }
            }
        )*
    };
}

number_header! {
    i8 => Byte,
    i16 => Short,
    i32 => Integer,
    i64 => Long,
    i128 => BigInteger,
    f32 => Float,
    f64 => Double,
}

// ============================================================================
// Headers
// ============================================================================

/// Insertion-ordered header map
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageHeaders {
    entries: Vec<(String, HeaderValue)>,
}

impl MessageHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a header, replacing an existing value in place
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<HeaderValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&HeaderValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeaderValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// Message
// ============================================================================

/// Outbound message: payload plus headers
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    payload: String,
    headers: MessageHeaders,
}

impl Message {
    pub fn new(payload: impl Into<String>, headers: MessageHeaders) -> Self {
        Self {
            payload: payload.into(),
            headers,
        }
    }

    pub fn builder(payload: impl Into<String>) -> MessageBuilder {
        MessageBuilder::new(payload)
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn headers(&self) -> &MessageHeaders {
        &self.headers
    }

    /// Notification subject taken from the subject header, if any
    pub fn subject(&self) -> Option<String> {
        self.headers
            .get(NOTIFICATION_SUBJECT_HEADER)
            .and_then(HeaderValue::to_display_string)
    }
}

/// Builder for [`Message`]
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    payload: String,
    headers: MessageHeaders,
}

impl MessageBuilder {
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            headers: MessageHeaders::new(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<HeaderValue>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn subject(self, subject: impl Into<String>) -> Self {
        self.header(NOTIFICATION_SUBJECT_HEADER, subject.into())
    }

    pub fn message_group_id(self, group_id: impl Into<String>) -> Self {
        self.header(MESSAGE_GROUP_ID_HEADER, group_id.into())
    }

    pub fn message_deduplication_id(self, dedup_id: impl Into<String>) -> Self {
        self.header(MESSAGE_DEDUPLICATION_ID_HEADER, dedup_id.into())
    }

    pub fn content_type(self, content_type: impl Into<String>) -> Self {
        self.header(CONTENT_TYPE_HEADER, content_type.into())
    }

    /// Attach a freshly generated message id
    pub fn with_generated_id(self) -> Self {
        self.header(ID_HEADER, uuid::Uuid::new_v4().to_string())
    }

    pub fn build(self) -> Message {
        Message {
            payload: self.payload,
            headers: self.headers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_subtypes() {
        assert_eq!(HeaderValue::from(42i32), HeaderValue::Number(NumberValue::Integer(42)));
        assert_eq!(NumberValue::Integer(42).subtype(), "java.lang.Integer");
        assert_eq!(NumberValue::Long(7).subtype(), "java.lang.Long");
        assert_eq!(NumberValue::BigInteger(1).subtype(), "java.math.BigInteger");
        assert_eq!(NumberValue::Double(1.5).to_string(), "1.5");
    }

    #[test]
    fn test_headers_preserve_order_and_replace_in_place() {
        let mut headers = MessageHeaders::new();
        headers.insert("b", "1");
        headers.insert("a", 2i32);
        headers.insert("b", "3");

        let names: Vec<&str> = headers.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(headers.get("b"), Some(&HeaderValue::Text("3".into())));
        assert_eq!(headers.len(), 2);
    }

    #[test]
    fn test_subject_uses_string_form() {
        let message = Message::builder("hello").subject("greeting").build();
        assert_eq!(message.subject().as_deref(), Some("greeting"));

        let message = Message::builder("hello")
            .header(NOTIFICATION_SUBJECT_HEADER, 12i64)
            .build();
        assert_eq!(message.subject().as_deref(), Some("12"));

        let message = Message::builder("hello")
            .header(NOTIFICATION_SUBJECT_HEADER, Option::<String>::None)
            .build();
        assert_eq!(message.subject(), None);
    }

    #[test]
    fn test_other_kind_keeps_type_name() {
        let value = HeaderValue::other(&std::net::Ipv4Addr::LOCALHOST);
        assert!(value.kind().ends_with("Ipv4Addr"));
        assert_eq!(value.to_display_string().as_deref(), Some("127.0.0.1"));
    }

    #[test]
    fn test_generated_id() {
        let message = Message::builder("x").with_generated_id().build();
        let id = message.headers().get(ID_HEADER).and_then(HeaderValue::as_text).unwrap();
        assert!(uuid::Uuid::parse_str(id).is_ok());
    }
}
