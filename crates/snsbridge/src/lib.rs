//! snsbridge
//!
//! Amazon SNS integration for Rust services:
//!
//! - publish messages with typed headers mapped to SNS message attributes
//! - receive SNS HTTP deliveries, verify their signatures and resolve
//!   handler arguments from them (feature `web`, on by default)
//!
//! ```ignore
//! let config = SnsBridgeConfig::from_env();
//! let sns = SnsAutoConfiguration::configure(&config).await?;
//! sns.channel("arn:aws:sns:us-east-1:123456789012:orders")
//!     .send_default(&Message::builder("hello").subject("greeting").build())
//!     .await?;
//! ```

pub mod autoconfigure;

pub use autoconfigure::{SnsAutoConfiguration, SnsContext};

pub use snsbridge_core::{config, error, types, utils};
pub use snsbridge_core::{Error, Result, SnsBridgeConfig, SnsProperties, VERSION};

pub use snsbridge_auth as auth;
pub use snsbridge_messaging as messaging;

#[cfg(feature = "web")]
pub use snsbridge_web as web;
