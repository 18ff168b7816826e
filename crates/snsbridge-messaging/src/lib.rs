//! Outbound side of snsbridge
//!
//! [`TopicMessageChannel`] turns a [`Message`](snsbridge_core::types::Message)
//! into a single SNS publish call. [`NotificationMessagingTemplate`] adds
//! topic name resolution and JSON conversion on top of it.

pub mod channel;
pub mod client;
pub mod resolver;
pub mod template;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use channel::{message_attributes, TopicMessageChannel};
pub use client::{NotificationClient, SnsClient, TopicPage};
pub use resolver::DynamicTopicResolver;
pub use template::NotificationMessagingTemplate;
