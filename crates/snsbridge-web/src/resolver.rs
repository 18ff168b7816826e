//! Handler argument resolution for inbound SNS messages
//!
//! A handler declares its parameters as [`MethodParameter`]s. Each parameter
//! is resolved from the raw webhook body by the first registered resolver
//! that supports it.

use async_trait::async_trait;
use snsbridge_auth::SnsMessageVerifier;
use snsbridge_core::types::{SnsEnvelope, SnsMessageType};
use snsbridge_core::{Error, Result};
use snsbridge_messaging::NotificationClient;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

// ============================================================================
// Parameters
// ============================================================================

/// Declared type of a handler parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterType {
    String,
    /// Parsed JSON value
    Json,
    NotificationStatus,
}

/// Marker attached to a handler parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterMarker {
    NotificationMessage,
    NotificationSubject,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodParameter {
    pub name: String,
    pub parameter_type: ParameterType,
    pub marker: Option<ParameterMarker>,
}

impl MethodParameter {
    pub fn new(name: impl Into<String>, parameter_type: ParameterType) -> Self {
        Self {
            name: name.into(),
            parameter_type,
            marker: None,
        }
    }

    pub fn with_marker(mut self, marker: ParameterMarker) -> Self {
        self.marker = Some(marker);
        self
    }

    pub fn message(name: impl Into<String>) -> Self {
        Self::new(name, ParameterType::String).with_marker(ParameterMarker::NotificationMessage)
    }

    pub fn json_message(name: impl Into<String>) -> Self {
        Self::new(name, ParameterType::Json).with_marker(ParameterMarker::NotificationMessage)
    }

    pub fn subject(name: impl Into<String>) -> Self {
        Self::new(name, ParameterType::String).with_marker(ParameterMarker::NotificationSubject)
    }

    pub fn status(name: impl Into<String>) -> Self {
        Self::new(name, ParameterType::NotificationStatus)
    }
}

// ============================================================================
// Resolved values
// ============================================================================

/// Handle for acknowledging a subscription or unsubscribe confirmation
#[derive(Clone)]
pub struct NotificationStatus {
    client: Arc<dyn NotificationClient>,
    message_type: SnsMessageType,
    topic_arn: String,
    token: String,
}

impl NotificationStatus {
    pub fn new(
        client: Arc<dyn NotificationClient>,
        message_type: SnsMessageType,
        topic_arn: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            message_type,
            topic_arn: topic_arn.into(),
            token: token.into(),
        }
    }

    pub fn message_type(&self) -> SnsMessageType {
        self.message_type
    }

    pub fn topic_arn(&self) -> &str {
        &self.topic_arn
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Confirm the subscription with SNS, returning the subscription ARN
    pub async fn confirm_subscription(&self) -> Result<Option<String>> {
        info!("Confirming subscription to {}", self.topic_arn);
        self.client
            .confirm_subscription(&self.topic_arn, &self.token)
            .await
    }
}

impl fmt::Debug for NotificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationStatus")
            .field("message_type", &self.message_type)
            .field("topic_arn", &self.topic_arn)
            .finish()
    }
}

/// Value produced for a handler parameter
#[derive(Debug, Clone)]
pub enum ResolvedArgument {
    Text(String),
    Json(serde_json::Value),
    Subject(Option<String>),
    Status(NotificationStatus),
}

// ============================================================================
// Resolvers
// ============================================================================

#[async_trait]
pub trait NotificationArgumentResolver: Send + Sync {
    fn supports_parameter(&self, parameter: &MethodParameter) -> bool;

    async fn resolve_argument(
        &self,
        parameter: &MethodParameter,
        body: &[u8],
    ) -> Result<ResolvedArgument>;
}

fn unsupported(parameter: &MethodParameter, expected: &str, actual: SnsMessageType) -> Error {
    Error::UnsupportedMessageType {
        parameter: parameter.name.clone(),
        expected: expected.to_string(),
        actual: actual.to_string(),
    }
}

/// Resolves [`NotificationStatus`] parameters on confirmation messages
pub struct NotificationStatusArgumentResolver {
    client: Arc<dyn NotificationClient>,
}

impl NotificationStatusArgumentResolver {
    pub fn new(client: Arc<dyn NotificationClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl NotificationArgumentResolver for NotificationStatusArgumentResolver {
    fn supports_parameter(&self, parameter: &MethodParameter) -> bool {
        parameter.parameter_type == ParameterType::NotificationStatus
    }

    async fn resolve_argument(
        &self,
        parameter: &MethodParameter,
        body: &[u8],
    ) -> Result<ResolvedArgument> {
        let envelope = SnsEnvelope::from_slice(body)?;
        if !envelope.message_type.is_confirmation() {
            return Err(unsupported(
                parameter,
                "SubscriptionConfirmation or UnsubscribeConfirmation",
                envelope.message_type,
            ));
        }

        let token = envelope.token.ok_or_else(|| {
            Error::MalformedNotification(format!("{} without Token", envelope.message_type))
        })?;

        Ok(ResolvedArgument::Status(NotificationStatus::new(
            self.client.clone(),
            envelope.message_type,
            envelope.topic_arn,
            token,
        )))
    }
}

/// Resolves the `Message` field of notifications
pub struct NotificationMessageArgumentResolver {
    verifier: Option<Arc<SnsMessageVerifier>>,
}

impl NotificationMessageArgumentResolver {
    pub fn new(verifier: Option<Arc<SnsMessageVerifier>>) -> Self {
        Self { verifier }
    }
}

#[async_trait]
impl NotificationArgumentResolver for NotificationMessageArgumentResolver {
    fn supports_parameter(&self, parameter: &MethodParameter) -> bool {
        parameter.marker == Some(ParameterMarker::NotificationMessage)
    }

    async fn resolve_argument(
        &self,
        parameter: &MethodParameter,
        body: &[u8],
    ) -> Result<ResolvedArgument> {
        let envelope = SnsEnvelope::from_slice(body)?;
        if envelope.message_type != SnsMessageType::Notification {
            return Err(unsupported(parameter, "Notification", envelope.message_type));
        }

        if let Some(verifier) = &self.verifier {
            verifier.verify(&envelope).await?;
        }

        debug!(
            "Resolved message {} for parameter '{}'",
            envelope.message_id, parameter.name
        );

        match parameter.parameter_type {
            ParameterType::Json => serde_json::from_str(&envelope.message)
                .map(ResolvedArgument::Json)
                .map_err(|e| {
                    Error::MalformedNotification(format!("message is not valid JSON: {}", e))
                }),
            _ => Ok(ResolvedArgument::Text(envelope.message)),
        }
    }
}

/// Resolves the optional `Subject` of notifications
#[derive(Debug, Default)]
pub struct NotificationSubjectArgumentResolver;

#[async_trait]
impl NotificationArgumentResolver for NotificationSubjectArgumentResolver {
    fn supports_parameter(&self, parameter: &MethodParameter) -> bool {
        parameter.marker == Some(ParameterMarker::NotificationSubject)
            && parameter.parameter_type == ParameterType::String
    }

    async fn resolve_argument(
        &self,
        parameter: &MethodParameter,
        body: &[u8],
    ) -> Result<ResolvedArgument> {
        let envelope = SnsEnvelope::from_slice(body)?;
        if envelope.message_type != SnsMessageType::Notification {
            return Err(unsupported(parameter, "Notification", envelope.message_type));
        }
        Ok(ResolvedArgument::Subject(envelope.subject))
    }
}

// ============================================================================
// Composite
// ============================================================================

/// Ordered resolver list; the first supporting resolver wins
#[derive(Default)]
pub struct NotificationResolverComposite {
    resolvers: Vec<Arc<dyn NotificationArgumentResolver>>,
}

impl NotificationResolverComposite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn NotificationArgumentResolver>) -> Self {
        self.resolvers.push(resolver);
        self
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }

    fn resolver_for(&self, parameter: &MethodParameter) -> Option<&Arc<dyn NotificationArgumentResolver>> {
        self.resolvers
            .iter()
            .find(|resolver| resolver.supports_parameter(parameter))
    }
}

#[async_trait]
impl NotificationArgumentResolver for NotificationResolverComposite {
    fn supports_parameter(&self, parameter: &MethodParameter) -> bool {
        self.resolver_for(parameter).is_some()
    }

    async fn resolve_argument(
        &self,
        parameter: &MethodParameter,
        body: &[u8],
    ) -> Result<ResolvedArgument> {
        let resolver = self
            .resolver_for(parameter)
            .ok_or_else(|| Error::UnresolvableParameter(parameter.name.clone()))?;
        resolver.resolve_argument(parameter, body).await
    }
}

impl fmt::Debug for NotificationResolverComposite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationResolverComposite")
            .field("resolvers", &self.resolvers.len())
            .finish()
    }
}
