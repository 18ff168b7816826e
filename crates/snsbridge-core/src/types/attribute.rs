//! Message attribute and publish request types

use bytes::Bytes;
use std::collections::BTreeMap;

use super::NumberValue;

/// SNS attribute data types
pub mod data_types {
    pub const STRING: &str = "String";
    pub const NUMBER: &str = "Number";
    pub const BINARY: &str = "Binary";
    pub const STRING_ARRAY: &str = "String.Array";
}

/// Encoded value of a message attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    String(String),
    Binary(Bytes),
}

/// A typed message attribute, as sent alongside the message body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageAttribute {
    pub data_type: String,
    pub value: AttributeValue,
}

impl MessageAttribute {
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            data_type: data_types::STRING.to_string(),
            value: AttributeValue::String(value.into()),
        }
    }

    /// `Number.<subtype>` attribute carrying the decimal string form
    pub fn number(value: &NumberValue) -> Self {
        Self {
            data_type: format!("{}.{}", data_types::NUMBER, value.subtype()),
            value: AttributeValue::String(value.to_string()),
        }
    }

    pub fn binary(value: Bytes) -> Self {
        Self {
            data_type: data_types::BINARY.to_string(),
            value: AttributeValue::Binary(value),
        }
    }

    /// `String.Array` attribute.
    ///
    /// SNS has no list type: every element becomes a JSON string literal and
    /// the literals are joined as `["a", "b"]`.
    pub fn string_array<S: AsRef<str>>(items: &[S]) -> Self {
        let literals: Vec<String> = items.iter().map(|item| quote_json(item.as_ref())).collect();
        Self {
            data_type: data_types::STRING_ARRAY.to_string(),
            value: AttributeValue::String(format!("[{}]", literals.join(", "))),
        }
    }

    pub fn string_value(&self) -> Option<&str> {
        match &self.value {
            AttributeValue::String(s) => Some(s),
            AttributeValue::Binary(_) => None,
        }
    }

    pub fn binary_value(&self) -> Option<&Bytes> {
        match &self.value {
            AttributeValue::Binary(b) => Some(b),
            AttributeValue::String(_) => None,
        }
    }
}

fn quote_json(value: &str) -> String {
    // Serializing a str cannot fail
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value))
}

/// A single SNS publish call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PublishRequest {
    pub topic_arn: String,
    pub message: String,
    pub subject: Option<String>,
    pub message_group_id: Option<String>,
    pub message_deduplication_id: Option<String>,
    pub message_attributes: BTreeMap<String, MessageAttribute>,
}

impl PublishRequest {
    pub fn new(topic_arn: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            topic_arn: topic_arn.into(),
            message: message.into(),
            ..Default::default()
        }
    }
}

/// Result of a successful publish
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishResponse {
    pub message_id: Option<String>,
    /// Only set for FIFO topics
    pub sequence_number: Option<String>,
}
