//! Error types for snsbridge

use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // Construction Errors
    #[error("Required collaborator must not be missing: {0}")]
    MissingCollaborator(&'static str),

    #[error("Invalid configuration: {0}")]
    Config(String),

    // Outbound Errors
    #[error("Invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("Topic not found: {0}")]
    TopicNotFound(String),

    #[error("SNS service error: {0}")]
    Service(String),

    // Inbound Errors
    #[error("Malformed notification: {0}")]
    MalformedNotification(String),

    #[error("{parameter} is only available for {expected} messages, got {actual}")]
    UnsupportedMessageType {
        parameter: String,
        expected: String,
        actual: String,
    },

    #[error("No resolver supports handler parameter '{0}'")]
    UnresolvableParameter(String),

    // Verification Errors
    #[error("Invalid signing certificate URL: {0}")]
    InvalidSigningCertUrl(String),

    #[error("Signature verification failed: {0}")]
    SignatureVerificationFailed(String),

    // Validation Errors
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // Internal Errors
    #[error("Internal error: {0}")]
    InternalError(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn invalid_header(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidHeader {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Error::MissingCollaborator(_) => "MissingCollaborator",
            Error::Config(_) => "InvalidConfiguration",
            Error::InvalidHeader { .. } => "InvalidHeader",
            Error::TopicNotFound(_) => "NotFound",
            Error::Service(_) => "ServiceError",
            Error::MalformedNotification(_) => "MalformedNotification",
            Error::UnsupportedMessageType { .. } => "UnsupportedMessageType",
            Error::UnresolvableParameter(_) => "UnresolvableParameter",
            Error::InvalidSigningCertUrl(_) => "InvalidSigningCertUrl",
            Error::SignatureVerificationFailed(_) => "SignatureVerificationFailed",
            Error::InvalidArgument(_) => "InvalidArgument",
            Error::InternalError(_) => "InternalError",
            Error::Json(_) => "MalformedNotification",
            Error::Io(_) => "InternalError",
            Error::Other(_) => "InternalError",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            Error::InvalidHeader { .. }
            | Error::MalformedNotification(_)
            | Error::UnsupportedMessageType { .. }
            | Error::InvalidArgument(_)
            | Error::Json(_) => 400,

            Error::InvalidSigningCertUrl(_) | Error::SignatureVerificationFailed(_) => 403,

            Error::TopicNotFound(_) => 404,

            Error::Service(_) => 502,

            _ => 500,
        }
    }
}

/// JSON error body returned by the webhook endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub request_id: String,
}

impl From<Error> for ErrorResponse {
    fn from(err: Error) -> Self {
        ErrorResponse {
            code: err.code().to_string(),
            message: err.to_string(),
            request_id: String::new(),
        }
    }
}

impl ErrorResponse {
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":"{}","message":"","request_id":""}}"#, self.code)
        })
    }
}
