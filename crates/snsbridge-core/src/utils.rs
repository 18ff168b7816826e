//! Utility functions

use uuid::Uuid;

/// Generate a unique request ID
pub fn generate_request_id() -> String {
    Uuid::new_v4().to_string().replace('-', "").to_uppercase()
}

/// Whether a destination is already a topic ARN rather than a topic name
pub fn is_topic_arn(destination: &str) -> bool {
    destination.starts_with("arn:")
}

/// Topic name part of a topic ARN (`arn:aws:sns:region:account:name`)
pub fn topic_name_from_arn(arn: &str) -> Option<&str> {
    if !is_topic_arn(arn) {
        return None;
    }
    arn.rsplit(':').next().filter(|name| !name.is_empty())
}

/// FIFO topics are identified by their `.fifo` suffix
pub fn is_fifo_topic(topic: &str) -> bool {
    topic.ends_with(".fifo")
}
