//! HTTP responses for webhook errors

use axum::response::{IntoResponse, Response};
use http::{header, HeaderName, HeaderValue, StatusCode};
use snsbridge_core::error::ErrorResponse;
use snsbridge_core::utils::generate_request_id;
use snsbridge_core::Error;
use tracing::warn;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Error returned from webhook handlers and extractors
#[derive(Debug)]
pub struct ApiError {
    error: Error,
    request_id: String,
}

impl ApiError {
    pub fn new(error: Error) -> Self {
        Self {
            error,
            request_id: generate_request_id(),
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        Self::new(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.error.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        warn!("Rejecting SNS request {}: {}", self.request_id, self.error);

        let body = ErrorResponse::from(self.error)
            .with_request_id(&self.request_id)
            .to_json();

        let mut response = (status, body).into_response();
        let headers = response.headers_mut();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Ok(value) = HeaderValue::from_str(&self.request_id) {
            headers.insert(REQUEST_ID_HEADER, value);
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_and_headers() {
        let response = ApiError::new(Error::SignatureVerificationFailed("bad".into()))
            .with_request_id("REQ1")
            .into_response();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(response.headers()[REQUEST_ID_HEADER], "REQ1");
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
    }
}
