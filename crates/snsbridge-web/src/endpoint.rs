//! Webhook endpoint dispatch
//!
//! SNS posts every message type to the same URL and names the type in the
//! `x-amz-sns-message-type` header. [`notification_routes`] reads that header
//! and calls the matching [`NotificationEndpoint`] method.

use async_trait::async_trait;
use axum::extract::{FromRef, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use bytes::Bytes;
use snsbridge_core::types::SnsMessageType;
use snsbridge_core::utils::{generate_request_id, topic_name_from_arn};
use snsbridge_core::{Error, Result, SNS_MESSAGE_TYPE_HEADER};
use std::sync::Arc;
use tracing::{debug, info};

use crate::resolver::{
    MethodParameter, NotificationArgumentResolver, NotificationResolverComposite,
    NotificationStatus, ResolvedArgument,
};
use crate::response::{ApiError, REQUEST_ID_HEADER};

/// Application callbacks for inbound SNS traffic
#[async_trait]
pub trait NotificationEndpoint: Send + Sync {
    /// A subscription is pending; call `status.confirm_subscription()` to accept it
    async fn on_subscription(&self, status: NotificationStatus) -> Result<()>;

    async fn on_notification(&self, message: String, subject: Option<String>) -> Result<()>;

    async fn on_unsubscribe(&self, status: NotificationStatus) -> Result<()>;
}

/// Router state for the webhook route
#[derive(Clone, FromRef)]
pub struct WebhookState {
    pub resolvers: Arc<NotificationResolverComposite>,
    pub endpoint: Arc<dyn NotificationEndpoint>,
}

/// Router serving `endpoint` at `path`
pub fn notification_routes(
    path: &str,
    endpoint: Arc<dyn NotificationEndpoint>,
    resolvers: Arc<NotificationResolverComposite>,
) -> Router {
    Router::new()
        .route(path, post(handle_notification))
        .with_state(WebhookState {
            resolvers,
            endpoint,
        })
}

async fn handle_notification(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request_id = generate_request_id();

    match dispatch(&state, &headers, &body).await {
        Ok(()) => (StatusCode::NO_CONTENT, [(REQUEST_ID_HEADER, request_id)]).into_response(),
        Err(e) => ApiError::new(e).with_request_id(request_id).into_response(),
    }
}

async fn dispatch(state: &WebhookState, headers: &HeaderMap, body: &[u8]) -> Result<()> {
    let message_type: SnsMessageType = headers
        .get(SNS_MESSAGE_TYPE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            Error::MalformedNotification(format!("missing {} header", SNS_MESSAGE_TYPE_HEADER))
        })?
        .parse()?;

    debug!("Received SNS {} ({} bytes)", message_type, body.len());

    match message_type {
        SnsMessageType::Notification => {
            let message = match resolve(state, MethodParameter::message("message"), body).await? {
                ResolvedArgument::Text(message) => message,
                other => return Err(unexpected(&other)),
            };
            let subject = match resolve(state, MethodParameter::subject("subject"), body).await? {
                ResolvedArgument::Subject(subject) => subject,
                other => return Err(unexpected(&other)),
            };
            state.endpoint.on_notification(message, subject).await
        }
        SnsMessageType::SubscriptionConfirmation => {
            let status = resolve_status(state, body).await?;
            state.endpoint.on_subscription(status).await
        }
        SnsMessageType::UnsubscribeConfirmation => {
            let status = resolve_status(state, body).await?;
            state.endpoint.on_unsubscribe(status).await
        }
    }
}

async fn resolve(
    state: &WebhookState,
    parameter: MethodParameter,
    body: &[u8],
) -> Result<ResolvedArgument> {
    state.resolvers.resolve_argument(&parameter, body).await
}

async fn resolve_status(state: &WebhookState, body: &[u8]) -> Result<NotificationStatus> {
    match resolve(state, MethodParameter::status("status"), body).await? {
        ResolvedArgument::Status(status) => Ok(status),
        other => Err(unexpected(&other)),
    }
}

fn unexpected(resolved: &ResolvedArgument) -> Error {
    Error::InternalError(format!("unexpected resolved argument {:?}", resolved))
}

fn topic_display(topic_arn: &str) -> &str {
    topic_name_from_arn(topic_arn).unwrap_or(topic_arn)
}

/// Endpoint that accepts every subscription and logs what it receives
#[derive(Debug, Default)]
pub struct LoggingEndpoint;

#[async_trait]
impl NotificationEndpoint for LoggingEndpoint {
    async fn on_subscription(&self, status: NotificationStatus) -> Result<()> {
        let subscription = status.confirm_subscription().await?;
        info!(
            "Confirmed subscription to topic {} ({})",
            topic_display(status.topic_arn()),
            subscription.as_deref().unwrap_or("pending")
        );
        Ok(())
    }

    async fn on_notification(&self, message: String, subject: Option<String>) -> Result<()> {
        info!(
            "Notification received: subject={} message={}",
            subject.as_deref().unwrap_or("-"),
            message
        );
        Ok(())
    }

    async fn on_unsubscribe(&self, status: NotificationStatus) -> Result<()> {
        info!("Unsubscribed from topic {}", topic_display(status.topic_arn()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::tests::{envelope, TOPIC};
    use crate::SnsWebConfiguration;
    use axum::body::Body;
    use axum::http::Request;
    use parking_lot::Mutex;
    use snsbridge_messaging::testing::RecordingClient;
    use tower::ServiceExt;

    #[derive(Default)]
    struct CollectingEndpoint {
        notifications: Mutex<Vec<(String, Option<String>)>>,
        unsubscribed: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl NotificationEndpoint for CollectingEndpoint {
        async fn on_subscription(&self, status: NotificationStatus) -> Result<()> {
            status.confirm_subscription().await.map(|_| ())
        }

        async fn on_notification(&self, message: String, subject: Option<String>) -> Result<()> {
            self.notifications.lock().push((message, subject));
            Ok(())
        }

        async fn on_unsubscribe(&self, status: NotificationStatus) -> Result<()> {
            self.unsubscribed.lock().push(status.topic_arn().to_string());
            Ok(())
        }
    }

    fn routes(client: Arc<RecordingClient>, endpoint: Arc<CollectingEndpoint>) -> Router {
        let resolvers = SnsWebConfiguration::argument_resolvers(client, None);
        notification_routes("/sns", endpoint, Arc::new(resolvers))
    }

    fn request(message_type: Option<&str>, body: Vec<u8>) -> Request<Body> {
        let mut builder = Request::builder().method("POST").uri("/sns");
        if let Some(message_type) = message_type {
            builder = builder.header(SNS_MESSAGE_TYPE_HEADER, message_type);
        }
        builder.body(Body::from(body)).unwrap()
    }

    #[tokio::test]
    async fn test_notification_is_dispatched() {
        let client = Arc::new(RecordingClient::new());
        let endpoint = Arc::new(CollectingEndpoint::default());

        let response = routes(client, endpoint.clone())
            .oneshot(request(
                Some("Notification"),
                envelope("Notification", "hello", Some("greeting")),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
        assert_eq!(
            endpoint.notifications.lock().clone(),
            vec![("hello".to_string(), Some("greeting".to_string()))]
        );
    }

    #[tokio::test]
    async fn test_confirmations_are_dispatched() {
        let client = Arc::new(RecordingClient::new());
        let endpoint = Arc::new(CollectingEndpoint::default());
        let router = routes(client.clone(), endpoint.clone());

        let response = router
            .clone()
            .oneshot(request(
                Some("SubscriptionConfirmation"),
                envelope("SubscriptionConfirmation", "confirm", None),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(client.confirmations().len(), 1);

        let response = router
            .oneshot(request(
                Some("UnsubscribeConfirmation"),
                envelope("UnsubscribeConfirmation", "bye", None),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(endpoint.unsubscribed.lock().clone(), vec![TOPIC.to_string()]);
    }

    #[tokio::test]
    async fn test_missing_or_unknown_type_header_is_rejected() {
        let client = Arc::new(RecordingClient::new());
        let endpoint = Arc::new(CollectingEndpoint::default());
        let body = envelope("Notification", "hello", None);

        for message_type in [None, Some("Bogus")] {
            let response = routes(client.clone(), endpoint.clone())
                .oneshot(request(message_type, body.clone()))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
        assert!(endpoint.notifications.lock().is_empty());
    }

    #[tokio::test]
    async fn test_header_and_body_type_mismatch_is_rejected() {
        let client = Arc::new(RecordingClient::new());
        let endpoint = Arc::new(CollectingEndpoint::default());

        let response = routes(client.clone(), endpoint)
            .oneshot(request(
                Some("SubscriptionConfirmation"),
                envelope("Notification", "hello", None),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(client.confirmations().is_empty());
    }
}
