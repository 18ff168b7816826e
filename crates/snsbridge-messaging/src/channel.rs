//! Topic message channel
//!
//! Maps an outbound [`Message`] onto a single SNS publish request.
//!
//! Header handling:
//! - `message-group-id` / `message-deduplication-id` fill the FIFO fields
//! - `contentType` and `id` become `String` attributes
//! - text, numbers, bytes and lists become `String`, `Number.<subtype>`,
//!   `Binary` and `String.Array` attributes
//! - anything else is dropped with a warning

use snsbridge_core::types::{HeaderValue, Message, MessageAttribute, MessageHeaders, PublishRequest};
use snsbridge_core::utils::is_fifo_topic;
use snsbridge_core::{
    Error, Result, CONTENT_TYPE_HEADER, ID_HEADER, MESSAGE_DEDUPLICATION_ID_HEADER,
    MESSAGE_GROUP_ID_HEADER,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::client::NotificationClient;

/// Outbound channel bound to one topic
#[derive(Clone)]
pub struct TopicMessageChannel {
    client: Arc<dyn NotificationClient>,
    topic_arn: String,
}

impl TopicMessageChannel {
    pub fn new(client: Arc<dyn NotificationClient>, topic_arn: impl Into<String>) -> Self {
        Self {
            client,
            topic_arn: topic_arn.into(),
        }
    }

    pub fn topic_arn(&self) -> &str {
        &self.topic_arn
    }

    /// Publish the message. Returns `true` once SNS accepted it.
    ///
    /// The timeout is not enforced; the client's own timeouts apply.
    pub async fn send(&self, message: &Message, timeout: Option<Duration>) -> Result<bool> {
        let request = self.build_request(message)?;
        debug!(
            "Publishing to {} with {} attributes (timeout {:?})",
            self.topic_arn,
            request.message_attributes.len(),
            timeout
        );

        self.client.publish(request).await?;
        Ok(true)
    }

    pub async fn send_default(&self, message: &Message) -> Result<bool> {
        self.send(message, None).await
    }

    /// Build the publish request for a message without sending it
    pub fn build_request(&self, message: &Message) -> Result<PublishRequest> {
        let headers = message.headers();

        let mut request = PublishRequest::new(&self.topic_arn, message.payload());
        request.subject = message.subject();
        request.message_group_id = text_header(headers, MESSAGE_GROUP_ID_HEADER)?;
        request.message_deduplication_id = text_header(headers, MESSAGE_DEDUPLICATION_ID_HEADER)?;
        request.message_attributes = message_attributes(headers);

        if is_fifo_topic(&self.topic_arn) && request.message_group_id.is_none() {
            warn!(
                "Publishing to FIFO topic {} without a {} header",
                self.topic_arn, MESSAGE_GROUP_ID_HEADER
            );
        }

        Ok(request)
    }
}

impl std::fmt::Debug for TopicMessageChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopicMessageChannel")
            .field("topic_arn", &self.topic_arn)
            .finish()
    }
}

/// Reserved headers must carry text when present
fn text_header(headers: &MessageHeaders, name: &str) -> Result<Option<String>> {
    match headers.get(name) {
        None | Some(HeaderValue::Null) => Ok(None),
        Some(HeaderValue::Text(value)) => Ok(Some(value.clone())),
        Some(other) => Err(Error::invalid_header(
            name,
            format!("expected text, got {}", other.kind()),
        )),
    }
}

/// Convert message headers to SNS message attributes
pub fn message_attributes(headers: &MessageHeaders) -> BTreeMap<String, MessageAttribute> {
    let mut attributes = BTreeMap::new();

    for (name, value) in headers.iter() {
        if name == MESSAGE_GROUP_ID_HEADER || name == MESSAGE_DEDUPLICATION_ID_HEADER {
            continue;
        }

        let well_known = (name == CONTENT_TYPE_HEADER || name == ID_HEADER) && !value.is_null();
        let attribute = if well_known {
            value.to_display_string().map(MessageAttribute::string)
        } else {
            to_attribute(value)
        };

        match attribute {
            Some(attribute) => {
                attributes.insert(name.to_string(), attribute);
            }
            None => {
                warn!(
                    "Message header '{}' of type {} is not supported as a message attribute and will be dropped",
                    name,
                    value.kind()
                );
            }
        }
    }

    attributes
}

fn to_attribute(value: &HeaderValue) -> Option<MessageAttribute> {
    match value {
        HeaderValue::Text(text) => Some(MessageAttribute::string(text.as_str())),
        HeaderValue::Number(number) => Some(MessageAttribute::number(number)),
        HeaderValue::Bytes(bytes) => Some(MessageAttribute::binary(bytes.clone())),
        HeaderValue::List(items) => Some(MessageAttribute::string_array(items.as_slice())),
        HeaderValue::Null | HeaderValue::Other { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingClient;
    use bytes::Bytes;
    use parking_lot::Mutex;
    use snsbridge_core::types::data_types;
    use snsbridge_core::NOTIFICATION_SUBJECT_HEADER;
    use std::io;
    use std::net::Ipv4Addr;

    const TOPIC: &str = "arn:aws:sns:us-east-1:123:my-topic";

    fn channel() -> (TopicMessageChannel, Arc<RecordingClient>) {
        let client = Arc::new(RecordingClient::new());
        (TopicMessageChannel::new(client.clone(), TOPIC), client)
    }

    #[derive(Clone, Default)]
    struct LogCapture(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogCapture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl LogCapture {
        fn count(&self, needle: &str) -> usize {
            String::from_utf8_lossy(&self.0.lock()).matches(needle).count()
        }
    }

    /// Run `f` with WARN-level events written to the returned capture
    fn with_captured_warnings<T>(f: impl FnOnce() -> T) -> (T, LogCapture) {
        let capture = LogCapture::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let result = tracing::subscriber::with_default(subscriber, f);
        (result, capture)
    }

    #[tokio::test]
    async fn test_send_publishes_once() {
        let (channel, client) = channel();
        let message = Message::builder("hello")
            .subject("greeting")
            .header("priority", 5i32)
            .build();

        assert!(channel.send(&message, Some(Duration::from_secs(1))).await.unwrap());

        let published = client.published();
        assert_eq!(published.len(), 1);
        let request = &published[0];
        assert_eq!(request.topic_arn, TOPIC);
        assert_eq!(request.message, "hello");
        assert_eq!(request.subject.as_deref(), Some("greeting"));

        let numbers: Vec<_> = request
            .message_attributes
            .iter()
            .filter(|(_, attr)| attr.data_type.starts_with(data_types::NUMBER))
            .collect();
        assert_eq!(numbers.len(), 1);
        assert_eq!(numbers[0].0, "priority");
        assert_eq!(numbers[0].1.string_value(), Some("5"));
    }

    #[tokio::test]
    async fn test_fifo_headers_are_not_attributes() {
        let (channel, client) = channel();
        let message = Message::builder("body")
            .message_group_id("group-1")
            .message_deduplication_id("dedup-1")
            .build();

        channel.send_default(&message).await.unwrap();

        let published = client.published();
        let request = &published[0];
        assert_eq!(request.message_group_id.as_deref(), Some("group-1"));
        assert_eq!(request.message_deduplication_id.as_deref(), Some("dedup-1"));
        assert!(!request.message_attributes.contains_key(MESSAGE_GROUP_ID_HEADER));
        assert!(!request
            .message_attributes
            .contains_key(MESSAGE_DEDUPLICATION_ID_HEADER));
    }

    #[tokio::test]
    async fn test_non_text_group_id_is_rejected() {
        let (channel, client) = channel();
        let message = Message::builder("body")
            .header(MESSAGE_GROUP_ID_HEADER, 7i64)
            .build();

        let err = channel.send_default(&message).await.unwrap_err();
        assert!(matches!(err, Error::InvalidHeader { .. }));
        assert!(client.published().is_empty());
    }

    #[test]
    fn test_header_kinds_map_to_data_types() {
        let mut headers = MessageHeaders::new();
        headers.insert("name", "value");
        headers.insert("count", 42i32);
        headers.insert("ratio", 0.5f64);
        headers.insert("blob", Bytes::from_static(b"\x00\x01"));
        headers.insert("tags", vec!["a", "b\"c"]);

        let attributes = message_attributes(&headers);

        assert_eq!(attributes["name"].data_type, "String");
        assert_eq!(attributes["name"].string_value(), Some("value"));
        assert_eq!(attributes["count"].data_type, "Number.java.lang.Integer");
        assert_eq!(attributes["count"].string_value(), Some("42"));
        assert_eq!(attributes["ratio"].data_type, "Number.java.lang.Double");
        assert_eq!(attributes["blob"].data_type, "Binary");
        assert_eq!(
            attributes["blob"].binary_value(),
            Some(&Bytes::from_static(b"\x00\x01"))
        );
        assert_eq!(attributes["tags"].data_type, "String.Array");
        assert_eq!(attributes["tags"].string_value(), Some(r#"["a", "b\"c"]"#));
    }

    #[test]
    fn test_well_known_headers_are_strings() {
        let mut headers = MessageHeaders::new();
        headers.insert(CONTENT_TYPE_HEADER, "application/json");
        headers.insert(ID_HEADER, HeaderValue::other(&Ipv4Addr::LOCALHOST));

        let attributes = message_attributes(&headers);
        assert_eq!(attributes[CONTENT_TYPE_HEADER].data_type, "String");
        assert_eq!(
            attributes[CONTENT_TYPE_HEADER].string_value(),
            Some("application/json")
        );
        assert_eq!(attributes[ID_HEADER].data_type, "String");
        assert_eq!(attributes[ID_HEADER].string_value(), Some("127.0.0.1"));
    }

    #[tokio::test]
    async fn test_unsupported_header_is_dropped_with_one_warning() {
        let (channel, client) = channel();
        let message = Message::builder("body")
            .header("address", HeaderValue::other(&Ipv4Addr::LOCALHOST))
            .header("name", "kept")
            .build();

        let (attributes, logs) = with_captured_warnings(|| message_attributes(message.headers()));
        assert!(attributes.contains_key("name"));
        assert!(!attributes.contains_key("address"));
        assert_eq!(logs.count("will be dropped"), 1);
        assert_eq!(logs.count("Message header 'address'"), 1);

        assert!(channel.send_default(&message).await.unwrap());
        let published = client.published();
        let request = &published[0];
        assert!(!request.message_attributes.contains_key("address"));
        assert!(request.message_attributes.contains_key("name"));
    }

    #[test]
    fn test_null_headers_are_dropped() {
        let mut headers = MessageHeaders::new();
        headers.insert("missing", HeaderValue::Null);
        headers.insert(CONTENT_TYPE_HEADER, HeaderValue::Null);

        let (attributes, logs) = with_captured_warnings(|| message_attributes(&headers));
        assert!(attributes.is_empty());
        assert_eq!(logs.count("will be dropped"), 2);
    }

    #[test]
    fn test_subject_header_is_also_an_attribute() {
        let (channel, _) = channel();
        let message = Message::builder("body").subject("greeting").build();

        let request = channel.build_request(&message).unwrap();
        assert_eq!(request.subject.as_deref(), Some("greeting"));
        assert_eq!(
            request.message_attributes[NOTIFICATION_SUBJECT_HEADER].string_value(),
            Some("greeting")
        );
    }

    #[tokio::test]
    async fn test_client_errors_propagate() {
        let client = Arc::new(RecordingClient::new().failing("throttled"));
        let channel = TopicMessageChannel::new(client, TOPIC);

        let err = channel
            .send_default(&Message::builder("body").build())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Service(_)));
    }
}
