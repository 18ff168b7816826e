//! SNS client abstraction
//!
//! Everything outbound goes through [`NotificationClient`]. [`SnsClient`] is
//! the AWS SDK implementation.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::Credentials;
use aws_sdk_sns::error::DisplayErrorContext;
use aws_sdk_sns::primitives::Blob;
use aws_sdk_sns::types::MessageAttributeValue;
use aws_sdk_sns::Client;
use snsbridge_core::config::CredentialsProperties;
use snsbridge_core::types::{AttributeValue, MessageAttribute, PublishRequest, PublishResponse};
use snsbridge_core::utils::is_fifo_topic;
use snsbridge_core::{Error, Result, SnsBridgeConfig};
use std::collections::HashMap;
use tracing::{debug, info};

/// One page of a topic listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicPage {
    pub topic_arns: Vec<String>,
    pub next_token: Option<String>,
}

/// The SNS operations snsbridge relies on
#[async_trait]
pub trait NotificationClient: Send + Sync {
    async fn publish(&self, request: PublishRequest) -> Result<PublishResponse>;

    /// Confirm a pending subscription, returning the subscription ARN
    async fn confirm_subscription(&self, topic_arn: &str, token: &str) -> Result<Option<String>>;

    async fn list_topics(&self, next_token: Option<String>) -> Result<TopicPage>;

    /// Create (or look up, SNS is idempotent here) a topic and return its ARN
    async fn create_topic(&self, name: &str) -> Result<String>;
}

/// AWS SDK backed [`NotificationClient`]
#[derive(Debug, Clone)]
pub struct SnsClient {
    client: Client,
}

impl SnsClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the `cloud.aws` properties.
    ///
    /// Static credentials win over a named profile, which wins over the
    /// default provider chain.
    pub async fn from_properties(config: &SnsBridgeConfig) -> Result<Self> {
        config.validate()?;

        let aws = &config.cloud.aws;
        let region = config.sns_region();

        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region.clone()));

        if let Some(credentials) = static_credentials(&aws.credentials) {
            loader = loader.credentials_provider(credentials);
        } else if let Some(profile) = &aws.credentials.profile_name {
            loader = loader.profile_name(profile);
        }

        if let Some(endpoint) = aws.sns.client.endpoint_url()? {
            loader = loader.endpoint_url(endpoint.as_str());
        }

        let client = Self::from_sdk_config(&loader.load().await)?;
        info!("SNS client configured for region {}", region);
        Ok(client)
    }

    /// Build a client from an already loaded SDK config, which must carry a
    /// credentials provider
    pub fn from_sdk_config(sdk_config: &SdkConfig) -> Result<Self> {
        if sdk_config.credentials_provider().is_none() {
            return Err(Error::MissingCollaborator("credentials provider"));
        }
        Ok(Self::new(Client::new(sdk_config)))
    }

    pub fn inner(&self) -> &Client {
        &self.client
    }
}

fn static_credentials(props: &CredentialsProperties) -> Option<Credentials> {
    match (&props.access_key, &props.secret_key) {
        (Some(access_key), Some(secret_key)) => Some(Credentials::new(
            access_key,
            secret_key,
            props.session_token.clone(),
            None,
            "snsbridge",
        )),
        _ => None,
    }
}

fn service_error<E: std::error::Error>(operation: &str, err: E) -> Error {
    Error::Service(format!("{} failed: {}", operation, DisplayErrorContext(err)))
}

fn to_sdk_attribute(attribute: &MessageAttribute) -> Result<MessageAttributeValue> {
    let builder = MessageAttributeValue::builder().data_type(&attribute.data_type);
    let builder = match &attribute.value {
        AttributeValue::String(value) => builder.string_value(value),
        AttributeValue::Binary(value) => builder.binary_value(Blob::new(value.to_vec())),
    };
    builder
        .build()
        .map_err(|e| Error::InternalError(format!("Invalid message attribute: {}", e)))
}

#[async_trait]
impl NotificationClient for SnsClient {
    async fn publish(&self, request: PublishRequest) -> Result<PublishResponse> {
        let mut attributes = HashMap::with_capacity(request.message_attributes.len());
        for (name, attribute) in &request.message_attributes {
            attributes.insert(name.clone(), to_sdk_attribute(attribute)?);
        }

        let output = self
            .client
            .publish()
            .topic_arn(&request.topic_arn)
            .message(&request.message)
            .set_subject(request.subject)
            .set_message_group_id(request.message_group_id)
            .set_message_deduplication_id(request.message_deduplication_id)
            .set_message_attributes((!attributes.is_empty()).then_some(attributes))
            .send()
            .await
            .map_err(|e| service_error("Publish", e))?;

        debug!(
            "Published message {:?} to {}",
            output.message_id(),
            request.topic_arn
        );

        Ok(PublishResponse {
            message_id: output.message_id().map(str::to_string),
            sequence_number: output.sequence_number().map(str::to_string),
        })
    }

    async fn confirm_subscription(&self, topic_arn: &str, token: &str) -> Result<Option<String>> {
        let output = self
            .client
            .confirm_subscription()
            .topic_arn(topic_arn)
            .token(token)
            .send()
            .await
            .map_err(|e| service_error("ConfirmSubscription", e))?;

        Ok(output.subscription_arn().map(str::to_string))
    }

    async fn list_topics(&self, next_token: Option<String>) -> Result<TopicPage> {
        let output = self
            .client
            .list_topics()
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| service_error("ListTopics", e))?;

        Ok(TopicPage {
            topic_arns: output
                .topics()
                .iter()
                .filter_map(|topic| topic.topic_arn().map(str::to_string))
                .collect(),
            next_token: output.next_token().map(str::to_string),
        })
    }

    async fn create_topic(&self, name: &str) -> Result<String> {
        let mut request = self.client.create_topic().name(name);
        if is_fifo_topic(name) {
            request = request.attributes("FifoTopic", "true");
        }

        let output = request
            .send()
            .await
            .map_err(|e| service_error("CreateTopic", e))?;

        output
            .topic_arn()
            .map(str::to_string)
            .ok_or_else(|| Error::Service(format!("CreateTopic returned no ARN for {}", name)))
    }
}
