//! Wiring of the SNS collaborators from configuration
//!
//! The SDK client is always built. The signature verifier only exists when
//! `cloud.aws.sns.verification` is on, and the web resolvers only when the
//! `web` feature is compiled in.

use snsbridge_auth::SnsMessageVerifier;
use snsbridge_core::{Result, SnsBridgeConfig};
use snsbridge_messaging::{
    NotificationClient, NotificationMessagingTemplate, SnsClient, TopicMessageChannel,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[cfg(feature = "web")]
use snsbridge_web::{NotificationResolverComposite, SnsWebConfiguration};

const CERTIFICATE_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Configured SNS collaborators
#[derive(Clone)]
pub struct SnsContext {
    client: Arc<dyn NotificationClient>,
    verifier: Option<Arc<SnsMessageVerifier>>,
    #[cfg(feature = "web")]
    resolvers: Arc<NotificationResolverComposite>,
}

impl SnsContext {
    pub fn client(&self) -> Arc<dyn NotificationClient> {
        self.client.clone()
    }

    pub fn verifier(&self) -> Option<Arc<SnsMessageVerifier>> {
        self.verifier.clone()
    }

    #[cfg(feature = "web")]
    pub fn resolvers(&self) -> Arc<NotificationResolverComposite> {
        self.resolvers.clone()
    }

    /// Channel publishing to a fixed topic
    pub fn channel(&self, topic_arn: impl Into<String>) -> TopicMessageChannel {
        TopicMessageChannel::new(self.client.clone(), topic_arn)
    }

    pub fn template(&self) -> NotificationMessagingTemplate {
        NotificationMessagingTemplate::new(self.client.clone())
    }
}

impl std::fmt::Debug for SnsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnsContext")
            .field("verification", &self.verifier.is_some())
            .finish()
    }
}

pub struct SnsAutoConfiguration;

impl SnsAutoConfiguration {
    /// Build every collaborator from the `cloud.aws` properties
    pub async fn configure(config: &SnsBridgeConfig) -> Result<SnsContext> {
        let client = Arc::new(SnsClient::from_properties(config).await?);
        Self::with_client(config, client)
    }

    /// Same as [`configure`](Self::configure) with an existing client
    pub fn with_client(
        config: &SnsBridgeConfig,
        client: Arc<dyn NotificationClient>,
    ) -> Result<SnsContext> {
        let sns = &config.cloud.aws.sns;

        let verifier = if sns.verification {
            let mut verifier = SnsMessageVerifier::with_http(CERTIFICATE_FETCH_TIMEOUT)?;
            if let Some(region) = &sns.client.region {
                verifier = verifier.with_region(region.clone());
            }
            Some(Arc::new(verifier))
        } else {
            None
        };

        info!(
            "SNS configured (region {}, signature verification {})",
            config.sns_region(),
            if verifier.is_some() { "enabled" } else { "disabled" }
        );

        Ok(SnsContext {
            #[cfg(feature = "web")]
            resolvers: Arc::new(SnsWebConfiguration::argument_resolvers(
                client.clone(),
                verifier.clone(),
            )),
            client,
            verifier,
        })
    }
}
