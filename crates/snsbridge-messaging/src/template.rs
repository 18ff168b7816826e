//! Convenience API for publishing notifications by topic name

use serde::Serialize;
use snsbridge_core::types::{Message, MessageHeaders};
use snsbridge_core::{Result, CONTENT_TYPE_HEADER};
use std::sync::Arc;

use crate::channel::TopicMessageChannel;
use crate::client::NotificationClient;
use crate::resolver::DynamicTopicResolver;

const APPLICATION_JSON: &str = "application/json";

/// Publishes to topics addressed by name or ARN
pub struct NotificationMessagingTemplate {
    client: Arc<dyn NotificationClient>,
    resolver: DynamicTopicResolver,
}

impl NotificationMessagingTemplate {
    pub fn new(client: Arc<dyn NotificationClient>) -> Self {
        let resolver = DynamicTopicResolver::new(client.clone());
        Self { client, resolver }
    }

    pub fn with_resolver(mut self, resolver: DynamicTopicResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn resolver(&self) -> &DynamicTopicResolver {
        &self.resolver
    }

    /// Send a prepared message
    pub async fn send(&self, destination: &str, message: &Message) -> Result<bool> {
        let topic_arn = self.resolver.resolve(destination).await?;
        TopicMessageChannel::new(self.client.clone(), topic_arn)
            .send_default(message)
            .await
    }

    /// Send a text payload with an optional subject
    pub async fn send_notification(
        &self,
        destination: &str,
        payload: impl Into<String>,
        subject: Option<&str>,
    ) -> Result<bool> {
        let mut builder = Message::builder(payload);
        if let Some(subject) = subject {
            builder = builder.subject(subject);
        }
        self.send(destination, &builder.build()).await
    }

    /// Serialize the payload as JSON and send it
    pub async fn convert_and_send<T>(
        &self,
        destination: &str,
        payload: &T,
        headers: MessageHeaders,
    ) -> Result<bool>
    where
        T: Serialize + ?Sized,
    {
        let body = serde_json::to_string(payload)?;
        let mut headers = headers;
        headers.insert(CONTENT_TYPE_HEADER, APPLICATION_JSON);
        self.send(destination, &Message::new(body, headers)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingClient;
    use serde_json::json;
    use snsbridge_core::NOTIFICATION_SUBJECT_HEADER;

    #[tokio::test]
    async fn test_send_notification_by_name() {
        let client = Arc::new(
            RecordingClient::new().with_topics(["arn:aws:sns:us-east-1:123:alerts"]),
        );
        let template = NotificationMessagingTemplate::new(client.clone());

        assert!(template
            .send_notification("alerts", "disk full", Some("Warning"))
            .await
            .unwrap());

        let published = client.published();
        assert_eq!(published[0].topic_arn, "arn:aws:sns:us-east-1:123:alerts");
        assert_eq!(published[0].message, "disk full");
        assert_eq!(published[0].subject.as_deref(), Some("Warning"));
    }

    #[tokio::test]
    async fn test_send_notification_without_subject() {
        let client = Arc::new(RecordingClient::new());
        let template = NotificationMessagingTemplate::new(client.clone());

        template
            .send_notification("arn:aws:sns:us-east-1:123:alerts", "ping", None)
            .await
            .unwrap();

        let published = client.published();
        assert!(published[0].subject.is_none());
        assert!(!published[0]
            .message_attributes
            .contains_key(NOTIFICATION_SUBJECT_HEADER));
    }

    #[tokio::test]
    async fn test_convert_and_send_sets_json_content_type() {
        let client = Arc::new(RecordingClient::new());
        let template = NotificationMessagingTemplate::new(client.clone()).with_resolver(
            DynamicTopicResolver::new(client.clone()).with_auto_create(true),
        );

        let mut headers = MessageHeaders::new();
        headers.insert("tenant", "acme");
        template
            .convert_and_send("orders", &json!({"id": 7, "total": 12.5}), headers)
            .await
            .unwrap();

        let published = client.published();
        let request = &published[0];
        assert_eq!(request.topic_arn, RecordingClient::topic_arn("orders"));
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&request.message).unwrap(),
            json!({"id": 7, "total": 12.5})
        );
        assert_eq!(
            request.message_attributes[CONTENT_TYPE_HEADER].string_value(),
            Some(APPLICATION_JSON)
        );
        assert_eq!(request.message_attributes["tenant"].string_value(), Some("acme"));
    }
}
