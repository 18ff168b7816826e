//! Inbound side of snsbridge
//!
//! Resolves handler arguments from SNS HTTP deliveries and serves a webhook
//! that dispatches them to a [`NotificationEndpoint`].

pub mod endpoint;
pub mod extract;
pub mod resolver;
pub mod response;
pub mod server;

pub use endpoint::{notification_routes, LoggingEndpoint, NotificationEndpoint, WebhookState};
pub use extract::{JsonNotificationMessage, NotificationMessage, NotificationSubject};
pub use resolver::{
    MethodParameter, NotificationArgumentResolver, NotificationMessageArgumentResolver,
    NotificationResolverComposite, NotificationStatus, NotificationStatusArgumentResolver,
    NotificationSubjectArgumentResolver, ParameterMarker, ParameterType, ResolvedArgument,
};
pub use response::ApiError;
pub use server::WebhookServer;

use snsbridge_auth::SnsMessageVerifier;
use snsbridge_messaging::NotificationClient;
use std::sync::Arc;
use tracing::debug;

/// Web-side registration
pub struct SnsWebConfiguration;

impl SnsWebConfiguration {
    /// Resolver set in dispatch order: status, message, subject.
    ///
    /// Without a verifier the message resolver accepts unsigned messages.
    pub fn argument_resolvers(
        client: Arc<dyn NotificationClient>,
        verifier: Option<Arc<SnsMessageVerifier>>,
    ) -> NotificationResolverComposite {
        debug!(
            "Registering SNS argument resolvers (signature verification {})",
            if verifier.is_some() { "on" } else { "off" }
        );

        NotificationResolverComposite::new()
            .with_resolver(Arc::new(NotificationStatusArgumentResolver::new(client)))
            .with_resolver(Arc::new(NotificationMessageArgumentResolver::new(verifier)))
            .with_resolver(Arc::new(NotificationSubjectArgumentResolver))
    }
}
