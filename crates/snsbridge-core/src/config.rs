//! Configuration for snsbridge
//!
//! Properties are bound once at startup, either from a TOML file or from the
//! environment, and are treated as immutable afterwards.
//!
//! ```toml
//! [cloud.aws.credentials]
//! access-key = "AKIA..."
//! secret-key = "..."
//!
//! [cloud.aws.region]
//! static = "eu-west-1"
//!
//! [cloud.aws.sns]
//! endpoint = "http://localhost:4566"
//! verification = false
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnsBridgeConfig {
    #[serde(default)]
    pub cloud: CloudConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SnsBridgeConfig {
    pub fn from_file(path: &str) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::Error::Config(format!("Failed to read config: {}", e)))?;

        debug!("Loaded configuration from {}", path);
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Overlay values found through `lookup` on top of the current ones
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let aws = &mut self.cloud.aws;

        if let Some(key) = lookup("CLOUD_AWS_CREDENTIALS_ACCESS_KEY") {
            aws.credentials.access_key = Some(key);
        }
        if let Some(secret) = lookup("CLOUD_AWS_CREDENTIALS_SECRET_KEY") {
            aws.credentials.secret_key = Some(secret);
        }
        if let Some(token) = lookup("CLOUD_AWS_CREDENTIALS_SESSION_TOKEN") {
            aws.credentials.session_token = Some(token);
        }
        if let Some(profile) = lookup("CLOUD_AWS_CREDENTIALS_PROFILE_NAME") {
            aws.credentials.profile_name = Some(profile);
        }
        if let Some(region) = lookup("CLOUD_AWS_REGION_STATIC") {
            aws.region.static_region = Some(region);
        }

        // SNS client properties
        if let Some(region) = lookup("CLOUD_AWS_SNS_REGION") {
            aws.sns.client.region = Some(region);
        }
        if let Some(endpoint) = lookup("CLOUD_AWS_SNS_ENDPOINT") {
            aws.sns.client.endpoint = Some(endpoint);
        }
        if let Some(flag) = lookup("CLOUD_AWS_SNS_VERIFICATION").and_then(|v| parse_bool(&v)) {
            aws.sns.verification = flag;
        }

        if let Some(addr) = lookup("SNSBRIDGE_BIND_ADDRESS") {
            self.server.bind_address = addr;
        }
        if let Some(port) = lookup("SNSBRIDGE_PORT") {
            match port.parse() {
                Ok(p) => self.server.port = p,
                Err(_) => warn!("Ignoring invalid SNSBRIDGE_PORT: {}", port),
            }
        }
        if let Some(path) = lookup("SNSBRIDGE_PATH") {
            self.server.path = path;
        }
        if let Some(level) = lookup("SNSBRIDGE_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    pub fn validate(&self) -> crate::Result<()> {
        self.cloud.aws.credentials.validate()?;
        self.cloud.aws.sns.client.validate()?;

        if !self.server.path.starts_with('/') {
            return Err(crate::Error::Config(format!(
                "server.path must start with '/': {}",
                self.server.path
            )));
        }
        Ok(())
    }

    /// Region for the SNS client: client property, then global static region, then the default
    pub fn sns_region(&self) -> String {
        self.cloud
            .aws
            .sns
            .client
            .region
            .clone()
            .or_else(|| self.cloud.aws.region.static_region.clone())
            .unwrap_or_else(|| crate::DEFAULT_REGION.to_string())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CloudConfig {
    #[serde(default)]
    pub aws: AwsConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AwsConfig {
    #[serde(default)]
    pub credentials: CredentialsProperties,

    #[serde(default)]
    pub region: RegionProperties,

    #[serde(default)]
    pub sns: SnsProperties,
}

/// Process-wide credentials (`cloud.aws.credentials`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CredentialsProperties {
    /// Static access key id
    pub access_key: Option<String>,
    /// Static secret access key
    pub secret_key: Option<String>,
    pub session_token: Option<String>,
    /// Named profile from the shared AWS config files
    pub profile_name: Option<String>,
}

impl CredentialsProperties {
    pub fn validate(&self) -> crate::Result<()> {
        if self.access_key.is_some() != self.secret_key.is_some() {
            return Err(crate::Error::Config(
                "access-key and secret-key must be configured together".into(),
            ));
        }
        Ok(())
    }
}

/// Process-wide region (`cloud.aws.region`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegionProperties {
    #[serde(rename = "static")]
    pub static_region: Option<String>,
}

/// Settings common to every AWS service client
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AwsClientProperties {
    /// Overrides the default service endpoint
    pub endpoint: Option<String>,
    /// Overrides the global region for this client
    pub region: Option<String>,
}

impl AwsClientProperties {
    pub fn endpoint_url(&self) -> crate::Result<Option<Url>> {
        let Some(ref endpoint) = self.endpoint else {
            return Ok(None);
        };

        let url = Url::parse(endpoint)
            .map_err(|e| crate::Error::Config(format!("Invalid endpoint '{}': {}", endpoint, e)))?;
        match url.scheme() {
            "http" | "https" => Ok(Some(url)),
            other => Err(crate::Error::Config(format!(
                "Unsupported endpoint scheme '{}'",
                other
            ))),
        }
    }

    pub fn validate(&self) -> crate::Result<()> {
        self.endpoint_url()?;
        if let Some(ref region) = self.region {
            if region.trim().is_empty() {
                return Err(crate::Error::Config("region must not be blank".into()));
            }
        }
        Ok(())
    }
}

/// SNS client properties (`cloud.aws.sns`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnsProperties {
    #[serde(flatten)]
    pub client: AwsClientProperties,

    /// Verify signatures of inbound SNS messages
    #[serde(default = "default_true")]
    pub verification: bool,
}

impl Default for SnsProperties {
    fn default() -> Self {
        Self {
            client: AwsClientProperties::default(),
            verification: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Webhook server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    /// Path SNS posts notifications to
    pub path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
            path: "/sns".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = SnsBridgeConfig::default();
        assert!(config.cloud.aws.sns.verification);
        assert!(config.cloud.aws.sns.client.endpoint.is_none());
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.path, "/sns");
        assert_eq!(config.sns_region(), crate::DEFAULT_REGION);
    }

    #[test]
    fn test_from_toml() {
        let config = SnsBridgeConfig::from_toml(
            r#"
            [cloud.aws.credentials]
            access-key = "AKIDEXAMPLE"
            secret-key = "secret"

            [cloud.aws.region]
            static = "eu-west-1"

            [cloud.aws.sns]
            endpoint = "http://localhost:4566"
            verification = false
            "#,
        )
        .unwrap();

        assert!(!config.cloud.aws.sns.verification);
        assert!(config.cloud.aws.credentials.access_key.is_some());
        assert!(config.cloud.aws.credentials.secret_key.is_some());
        assert_eq!(config.sns_region(), "eu-west-1");
        assert_eq!(
            config.cloud.aws.sns.client.endpoint_url().unwrap().unwrap().as_str(),
            "http://localhost:4566/"
        );
        config.validate().unwrap();
    }

    #[test]
    fn test_verification_defaults_to_true_when_section_present() {
        let config = SnsBridgeConfig::from_toml(
            r#"
            [cloud.aws.sns]
            region = "ap-south-1"
            "#,
        )
        .unwrap();

        assert!(config.cloud.aws.sns.verification);
        assert_eq!(config.sns_region(), "ap-south-1");
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nbind_address = \"127.0.0.1\"\nport = 9090\npath = \"/hooks/sns\"").unwrap();

        let config = SnsBridgeConfig::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.server.bind_address, "127.0.0.1");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.path, "/hooks/sns");
    }

    #[test]
    fn test_env_overlay() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("CLOUD_AWS_SNS_VERIFICATION", "false"),
            ("CLOUD_AWS_SNS_REGION", "us-west-2"),
            ("SNSBRIDGE_PORT", "7070"),
            ("SNSBRIDGE_LOG_LEVEL", "debug"),
        ]);

        let mut config = SnsBridgeConfig::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert!(!config.cloud.aws.sns.verification);
        assert_eq!(config.sns_region(), "us-west-2");
        assert_eq!(config.server.port, 7070);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_invalid_verification_flag_is_ignored() {
        let mut config = SnsBridgeConfig::default();
        config.apply_env(|key| (key == "CLOUD_AWS_SNS_VERIFICATION").then(|| "maybe".to_string()));
        assert!(config.cloud.aws.sns.verification);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = SnsBridgeConfig::default();
        config.cloud.aws.sns.client.endpoint = Some("ftp://localhost".into());
        assert!(config.validate().is_err());

        let mut config = SnsBridgeConfig::default();
        config.cloud.aws.credentials.access_key = Some("AKID".into());
        assert!(config.validate().is_err());

        let mut config = SnsBridgeConfig::default();
        config.server.path = "sns".into();
        assert!(config.validate().is_err());
    }
}
