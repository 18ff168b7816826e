//! SNS message signature verification

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use openssl::asn1::Asn1Time;
use openssl::hash::MessageDigest;
use openssl::sign::Verifier;
use openssl::x509::X509;
use parking_lot::RwLock;
use snsbridge_core::types::{SnsEnvelope, SnsMessageType};
use snsbridge_core::{Error, Result};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::certificate::{validate_signing_cert_url, CertificateSource, HttpCertificateSource};

/// Envelope `SignatureVersion`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureVersion {
    /// SHA1withRSA
    V1,
    /// SHA256withRSA
    V2,
}

impl SignatureVersion {
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "1" => Ok(SignatureVersion::V1),
            "2" => Ok(SignatureVersion::V2),
            other => Err(Error::SignatureVerificationFailed(format!(
                "unsupported signature version '{}'",
                other
            ))),
        }
    }

    fn digest(&self) -> MessageDigest {
        match self {
            SignatureVersion::V1 => MessageDigest::sha1(),
            SignatureVersion::V2 => MessageDigest::sha256(),
        }
    }
}

/// Builds the canonical string SNS signs.
///
/// Each present field contributes `name\nvalue\n`, in this order:
///
/// ```text
/// Notification:   Message, MessageId, Subject, Timestamp, TopicArn, Type
/// Confirmations:  Message, MessageId, SubscribeURL, Timestamp, Token, TopicArn, Type
/// ```
///
/// `Subject` is skipped when the notification has none.
pub fn string_to_sign(envelope: &SnsEnvelope) -> String {
    let message_type = envelope.message_type.as_str();

    let fields: Vec<(&str, Option<&str>)> = match envelope.message_type {
        SnsMessageType::Notification => vec![
            ("Message", Some(envelope.message.as_str())),
            ("MessageId", Some(envelope.message_id.as_str())),
            ("Subject", envelope.subject.as_deref()),
            ("Timestamp", Some(envelope.timestamp.as_str())),
            ("TopicArn", Some(envelope.topic_arn.as_str())),
            ("Type", Some(message_type)),
        ],
        SnsMessageType::SubscriptionConfirmation | SnsMessageType::UnsubscribeConfirmation => vec![
            ("Message", Some(envelope.message.as_str())),
            ("MessageId", Some(envelope.message_id.as_str())),
            ("SubscribeURL", envelope.subscribe_url.as_deref()),
            ("Timestamp", Some(envelope.timestamp.as_str())),
            ("Token", envelope.token.as_deref()),
            ("TopicArn", Some(envelope.topic_arn.as_str())),
            ("Type", Some(message_type)),
        ],
    };

    let mut result = String::new();
    for (name, value) in fields {
        if let Some(value) = value {
            result.push_str(name);
            result.push('\n');
            result.push_str(value);
            result.push('\n');
        }
    }
    result
}

/// Verifies inbound SNS messages against their signing certificates.
///
/// Certificates are cached per URL for the lifetime of the verifier.
pub struct SnsMessageVerifier {
    expected_region: Option<String>,
    source: Arc<dyn CertificateSource>,
    certificates: RwLock<HashMap<String, X509>>,
}

impl SnsMessageVerifier {
    pub fn new(source: Arc<dyn CertificateSource>) -> Self {
        Self {
            expected_region: None,
            source,
            certificates: RwLock::new(HashMap::new()),
        }
    }

    /// Verifier downloading certificates over HTTPS
    pub fn with_http(timeout: Duration) -> Result<Self> {
        Ok(Self::new(Arc::new(HttpCertificateSource::new(timeout)?)))
    }

    /// Only accept certificates served from this region's SNS endpoint
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.expected_region = Some(region.into());
        self
    }

    pub fn expected_region(&self) -> Option<&str> {
        self.expected_region.as_deref()
    }

    /// Verify the envelope signature
    pub async fn verify(&self, envelope: &SnsEnvelope) -> Result<()> {
        let url = validate_signing_cert_url(
            &envelope.signing_cert_url,
            self.expected_region.as_deref(),
        )?;
        let certificate = self.certificate(&url).await?;

        verify_with_certificate(&certificate, envelope).inspect_err(|e| {
            warn!(
                "Rejected SNS message {} from {}: {}",
                envelope.message_id, envelope.topic_arn, e
            );
        })
    }

    async fn certificate(&self, url: &Url) -> Result<X509> {
        if let Some(cert) = self.certificates.read().get(url.as_str()) {
            return Ok(cert.clone());
        }

        let pem = self.source.fetch(url).await?;
        let cert = X509::from_pem(&pem).map_err(|e| {
            Error::SignatureVerificationFailed(format!("invalid signing certificate: {}", e))
        })?;

        debug!("Caching signing certificate {}", url);
        self.certificates
            .write()
            .insert(url.to_string(), cert.clone());
        Ok(cert)
    }
}

impl fmt::Debug for SnsMessageVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnsMessageVerifier")
            .field("expected_region", &self.expected_region)
            .field("cached_certificates", &self.certificates.read().len())
            .finish()
    }
}

fn verification_error(e: openssl::error::ErrorStack) -> Error {
    Error::SignatureVerificationFailed(e.to_string())
}

pub(crate) fn verify_with_certificate(cert: &X509, envelope: &SnsEnvelope) -> Result<()> {
    let now = Asn1Time::days_from_now(0).map_err(verification_error)?;
    if cert.not_after().compare(&now).map_err(verification_error)? == Ordering::Less {
        return Err(Error::SignatureVerificationFailed(
            "signing certificate has expired".into(),
        ));
    }

    let version = SignatureVersion::parse(&envelope.signature_version)?;
    let signature = BASE64
        .decode(envelope.signature.trim())
        .map_err(|_| Error::SignatureVerificationFailed("could not decode signature".into()))?;

    let public_key = cert.public_key().map_err(verification_error)?;
    let mut verifier = Verifier::new(version.digest(), &public_key).map_err(verification_error)?;
    verifier
        .update(string_to_sign(envelope).as_bytes())
        .map_err(verification_error)?;

    if verifier.verify(&signature).map_err(verification_error)? {
        Ok(())
    } else {
        Err(Error::SignatureVerificationFailed(
            "signature does not match message".into(),
        ))
    }
}
