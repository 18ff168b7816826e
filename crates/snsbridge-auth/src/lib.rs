//! Authentication of inbound SNS messages
//!
//! SNS signs every HTTP message with a certificate it publishes under a
//! `SigningCertURL`. [`SnsMessageVerifier`] checks that URL, fetches and caches
//! the certificate and verifies the envelope signature against it.

pub mod certificate;
pub mod signature;

pub use certificate::{
    validate_signing_cert_url, CertificateSource, HttpCertificateSource,
};
pub use signature::{string_to_sign, SignatureVersion, SnsMessageVerifier};
