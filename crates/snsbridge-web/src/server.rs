//! Webhook server

use axum::routing::get;
use axum::Router;
use snsbridge_core::config::ServerConfig;
use snsbridge_core::Result;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, Level};

use crate::endpoint::{notification_routes, NotificationEndpoint};
use crate::resolver::NotificationResolverComposite;

/// HTTP server receiving SNS deliveries
pub struct WebhookServer {
    config: ServerConfig,
    endpoint: Arc<dyn NotificationEndpoint>,
    resolvers: Arc<NotificationResolverComposite>,
}

impl WebhookServer {
    pub fn new(
        config: ServerConfig,
        endpoint: Arc<dyn NotificationEndpoint>,
        resolvers: Arc<NotificationResolverComposite>,
    ) -> Self {
        Self {
            config,
            endpoint,
            resolvers,
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.config.bind_address, self.config.port)
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(|| async { "OK" }))
            .merge(notification_routes(
                &self.config.path,
                self.endpoint.clone(),
                self.resolvers.clone(),
            ))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                    .on_response(DefaultOnResponse::new().level(Level::INFO)),
            )
    }

    pub async fn run(self) -> Result<()> {
        self.run_with_shutdown(std::future::pending()).await
    }

    /// Serve until `shutdown` completes
    pub async fn run_with_shutdown<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.address();
        let listener = TcpListener::bind(&addr).await?;

        info!("SNS webhook listening on http://{}{}", addr, self.config.path);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::LoggingEndpoint;
    use crate::SnsWebConfiguration;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use snsbridge_core::SNS_MESSAGE_TYPE_HEADER;
    use snsbridge_messaging::testing::RecordingClient;
    use tower::ServiceExt;

    fn server(path: &str) -> WebhookServer {
        let config = ServerConfig {
            path: path.to_string(),
            ..Default::default()
        };
        WebhookServer::new(
            config,
            Arc::new(LoggingEndpoint),
            Arc::new(SnsWebConfiguration::argument_resolvers(
                Arc::new(RecordingClient::new()),
                None,
            )),
        )
    }

    #[tokio::test]
    async fn test_health() {
        let response = server("/sns")
            .router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_webhook_mounted_at_configured_path() {
        let request = Request::builder()
            .method("POST")
            .uri("/hooks/sns")
            .header(SNS_MESSAGE_TYPE_HEADER, "Notification")
            .body(Body::from("{}"))
            .unwrap();

        let response = server("/hooks/sns").router().oneshot(request).await.unwrap();
        // Reaches the handler, which rejects the empty envelope
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_address() {
        assert_eq!(server("/sns").address(), "0.0.0.0:8080");
    }
}
