//! Inbound SNS notification envelope
//!
//! The JSON document SNS posts to HTTP(S) subscribers for notifications and
//! for subscription / unsubscribe confirmations.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Value of the envelope `Type` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SnsMessageType {
    Notification,
    SubscriptionConfirmation,
    UnsubscribeConfirmation,
}

impl SnsMessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnsMessageType::Notification => "Notification",
            SnsMessageType::SubscriptionConfirmation => "SubscriptionConfirmation",
            SnsMessageType::UnsubscribeConfirmation => "UnsubscribeConfirmation",
        }
    }

    pub fn is_confirmation(&self) -> bool {
        matches!(
            self,
            SnsMessageType::SubscriptionConfirmation | SnsMessageType::UnsubscribeConfirmation
        )
    }
}

impl fmt::Display for SnsMessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SnsMessageType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Notification" => Ok(SnsMessageType::Notification),
            "SubscriptionConfirmation" => Ok(SnsMessageType::SubscriptionConfirmation),
            "UnsubscribeConfirmation" => Ok(SnsMessageType::UnsubscribeConfirmation),
            other => Err(Error::MalformedNotification(format!(
                "unknown message type '{}'",
                other
            ))),
        }
    }
}

/// A message attribute as delivered inside the envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeAttribute {
    #[serde(rename = "Type")]
    pub data_type: String,

    #[serde(rename = "Value")]
    pub value: String,
}

/// The full SNS HTTP message format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnsEnvelope {
    #[serde(rename = "Type")]
    pub message_type: SnsMessageType,

    #[serde(rename = "MessageId")]
    pub message_id: String,

    #[serde(default, rename = "Token", skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    #[serde(rename = "TopicArn")]
    pub topic_arn: String,

    #[serde(default, rename = "Subject", skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    #[serde(rename = "Message")]
    pub message: String,

    #[serde(default, rename = "SubscribeURL", skip_serializing_if = "Option::is_none")]
    pub subscribe_url: Option<String>,

    #[serde(rename = "Timestamp")]
    pub timestamp: String,

    #[serde(rename = "SignatureVersion")]
    pub signature_version: String,

    #[serde(rename = "Signature")]
    pub signature: String,

    #[serde(rename = "SigningCertURL")]
    pub signing_cert_url: String,

    #[serde(default, rename = "UnsubscribeURL", skip_serializing_if = "Option::is_none")]
    pub unsubscribe_url: Option<String>,

    #[serde(default, rename = "MessageAttributes", skip_serializing_if = "Option::is_none")]
    pub message_attributes: Option<HashMap<String, EnvelopeAttribute>>,
}

impl SnsEnvelope {
    /// Parse a webhook body
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|e| Error::MalformedNotification(e.to_string()))
    }
}
