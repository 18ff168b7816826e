//! Signing certificate location checks and retrieval

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use snsbridge_core::{Error, Result};
use std::time::Duration;
use tracing::debug;
use url::Url;

static SNS_HOST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^sns\.([a-z0-9-]+)\.amazonaws\.com(\.cn)?$").expect("valid SNS host pattern")
});

/// Check that a `SigningCertURL` points at an SNS-owned certificate.
///
/// The URL must:
/// 1. Use HTTPS
/// 2. Belong to an SNS domain (`sns.<region>.amazonaws.com`, or `.com.cn`)
/// 3. Match `expected_region` when one is given
/// 4. Name a `.pem` file
pub fn validate_signing_cert_url(raw: &str, expected_region: Option<&str>) -> Result<Url> {
    let url = Url::parse(raw)
        .map_err(|e| Error::InvalidSigningCertUrl(format!("{}: {}", raw, e)))?;

    if url.scheme() != "https" {
        return Err(Error::InvalidSigningCertUrl(format!(
            "{}: certificate must be served over https",
            raw
        )));
    }

    let host = url.host_str().unwrap_or_default();
    let captures = SNS_HOST.captures(host).ok_or_else(|| {
        Error::InvalidSigningCertUrl(format!("{}: host is not an SNS endpoint", raw))
    })?;

    if let Some(expected) = expected_region {
        if &captures[1] != expected {
            return Err(Error::InvalidSigningCertUrl(format!(
                "{}: certificate region {} does not match {}",
                raw, &captures[1], expected
            )));
        }
    }

    if !url.path().ends_with(".pem") {
        return Err(Error::InvalidSigningCertUrl(format!(
            "{}: not a PEM certificate",
            raw
        )));
    }

    Ok(url)
}

/// Source of PEM-encoded signing certificates
#[async_trait]
pub trait CertificateSource: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>>;
}

/// Downloads certificates over HTTPS
#[derive(Debug, Clone)]
pub struct HttpCertificateSource {
    client: reqwest::Client,
}

impl HttpCertificateSource {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::InternalError(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl CertificateSource for HttpCertificateSource {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>> {
        debug!("Downloading signing certificate from {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Error::SignatureVerificationFailed(format!("certificate download failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::SignatureVerificationFailed(format!(
                "certificate download returned {}",
                response.status()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::SignatureVerificationFailed(format!("certificate download failed: {}", e)))?;
        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CERT_URL: &str =
        "https://sns.us-west-2.amazonaws.com/SimpleNotificationService-f3ecfb7224c7233fe7bb5f59f96de52f.pem";

    #[test]
    fn test_accepts_sns_certificate_url() {
        let url = validate_signing_cert_url(CERT_URL, None).unwrap();
        assert_eq!(url.host_str(), Some("sns.us-west-2.amazonaws.com"));

        assert!(validate_signing_cert_url(CERT_URL, Some("us-west-2")).is_ok());
        assert!(validate_signing_cert_url(
            "https://sns.cn-north-1.amazonaws.com.cn/SimpleNotificationService-abc.pem",
            None
        )
        .is_ok());
    }

    #[test]
    fn test_rejects_foreign_certificate_urls() {
        let rejected = [
            "http://sns.us-west-2.amazonaws.com/SimpleNotificationService-abc.pem",
            "https://sns.us-west-2.amazonaws.com.evil.example/SimpleNotificationService-abc.pem",
            "https://evil.example/sns.us-west-2.amazonaws.com/cert.pem",
            "https://sns.us-west-2.amazonaws.com/SimpleNotificationService-abc.txt",
            "not a url",
        ];

        for url in rejected {
            let err = validate_signing_cert_url(url, None).unwrap_err();
            assert!(matches!(err, Error::InvalidSigningCertUrl(_)), "{}", url);
        }
    }

    #[test]
    fn test_rejects_region_mismatch() {
        let err = validate_signing_cert_url(CERT_URL, Some("eu-west-1")).unwrap_err();
        assert!(matches!(err, Error::InvalidSigningCertUrl(_)));
    }
}
