//! axum extractors backed by the resolver composite
//!
//! ```ignore
//! async fn handle(NotificationMessage(message): NotificationMessage) { .. }
//! ```
//!
//! The router state must provide an `Arc<NotificationResolverComposite>`
//! through `FromRef`. Each extractor consumes the request body, so a handler
//! takes at most one of them.

use axum::body::Bytes;
use axum::extract::{FromRef, FromRequest, Request};
use serde::de::DeserializeOwned;
use snsbridge_core::Error;
use std::sync::Arc;

use crate::resolver::{
    MethodParameter, NotificationArgumentResolver, NotificationResolverComposite,
    NotificationStatus, ResolvedArgument,
};
use crate::response::ApiError;

async fn resolve<S>(req: Request, state: &S, parameter: MethodParameter) -> Result<ResolvedArgument, ApiError>
where
    S: Send + Sync,
    Arc<NotificationResolverComposite>: FromRef<S>,
{
    let resolvers = Arc::<NotificationResolverComposite>::from_ref(state);
    let body = Bytes::from_request(req, state)
        .await
        .map_err(|e| Error::MalformedNotification(format!("could not read body: {}", e)))?;

    Ok(resolvers.resolve_argument(&parameter, &body).await?)
}

fn unexpected(parameter: &str, resolved: &ResolvedArgument) -> ApiError {
    Error::InternalError(format!(
        "resolver produced {:?} for parameter '{}'",
        resolved, parameter
    ))
    .into()
}

/// The `Message` of a notification, as text
#[derive(Debug, Clone)]
pub struct NotificationMessage(pub String);

impl<S> FromRequest<S> for NotificationMessage
where
    S: Send + Sync,
    Arc<NotificationResolverComposite>: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match resolve(req, state, MethodParameter::message("message")).await? {
            ResolvedArgument::Text(message) => Ok(Self(message)),
            other => Err(unexpected("message", &other)),
        }
    }
}

/// The `Message` of a notification, deserialized from JSON
#[derive(Debug, Clone)]
pub struct JsonNotificationMessage<T>(pub T);

impl<S, T> FromRequest<S> for JsonNotificationMessage<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
    Arc<NotificationResolverComposite>: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match resolve(req, state, MethodParameter::json_message("message")).await? {
            ResolvedArgument::Json(value) => serde_json::from_value(value)
                .map(Self)
                .map_err(|e| ApiError::from(Error::MalformedNotification(e.to_string()))),
            other => Err(unexpected("message", &other)),
        }
    }
}

/// The optional `Subject` of a notification
#[derive(Debug, Clone)]
pub struct NotificationSubject(pub Option<String>);

impl<S> FromRequest<S> for NotificationSubject
where
    S: Send + Sync,
    Arc<NotificationResolverComposite>: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match resolve(req, state, MethodParameter::subject("subject")).await? {
            ResolvedArgument::Subject(subject) => Ok(Self(subject)),
            other => Err(unexpected("subject", &other)),
        }
    }
}

impl<S> FromRequest<S> for NotificationStatus
where
    S: Send + Sync,
    Arc<NotificationResolverComposite>: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match resolve(req, state, MethodParameter::status("status")).await? {
            ResolvedArgument::Status(status) => Ok(status),
            other => Err(unexpected("status", &other)),
        }
    }
}
