//! snsbridge Core Library
//!
//! Configuration properties, error types and the message/attribute/envelope
//! types shared by the outbound channel and the inbound webhook resolvers.

pub mod config;
pub mod error;
pub mod types;
pub mod utils;

pub use config::{SnsBridgeConfig, SnsProperties};
pub use error::{Error, Result};

/// snsbridge version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Region used when neither the SNS client nor the global region is configured
pub const DEFAULT_REGION: &str = "us-east-1";

/// Configuration prefix of the SNS client properties
pub const SNS_PROPERTIES_PREFIX: &str = "cloud.aws.sns";

/// Header carrying the notification subject of an outbound message
pub const NOTIFICATION_SUBJECT_HEADER: &str = "NOTIFICATION_SUBJECT_HEADER";

/// Header routed to the FIFO message group id of a publish request
pub const MESSAGE_GROUP_ID_HEADER: &str = "message-group-id";

/// Header routed to the deduplication id of a publish request
pub const MESSAGE_DEDUPLICATION_ID_HEADER: &str = "message-deduplication-id";

/// Well-known content type header
pub const CONTENT_TYPE_HEADER: &str = "contentType";

/// Well-known message id header
pub const ID_HEADER: &str = "id";

/// HTTP header SNS sets on every webhook request
pub const SNS_MESSAGE_TYPE_HEADER: &str = "x-amz-sns-message-type";
