//! In-memory [`NotificationClient`] for tests

use async_trait::async_trait;
use parking_lot::Mutex;
use snsbridge_core::types::{PublishRequest, PublishResponse};
use snsbridge_core::{Error, Result};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::client::{NotificationClient, TopicPage};

const ACCOUNT_PREFIX: &str = "arn:aws:sns:us-east-1:123456789012";

/// Records every call instead of talking to SNS
#[derive(Debug)]
pub struct RecordingClient {
    published: Mutex<Vec<PublishRequest>>,
    confirmations: Mutex<Vec<(String, String)>>,
    topics: Mutex<Vec<String>>,
    created: Mutex<Vec<String>>,
    page_size: usize,
    publish_failure: Option<String>,
    list_calls: AtomicUsize,
}

impl Default for RecordingClient {
    fn default() -> Self {
        Self {
            published: Mutex::new(Vec::new()),
            confirmations: Mutex::new(Vec::new()),
            topics: Mutex::new(Vec::new()),
            created: Mutex::new(Vec::new()),
            page_size: 100,
            publish_failure: None,
            list_calls: AtomicUsize::new(0),
        }
    }
}

impl RecordingClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-existing topic ARNs returned by `list_topics`
    pub fn with_topics<I, S>(self, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.topics.lock().extend(topics.into_iter().map(Into::into));
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Make every publish fail with a service error
    pub fn failing(mut self, reason: impl Into<String>) -> Self {
        self.publish_failure = Some(reason.into());
        self
    }

    pub fn published(&self) -> Vec<PublishRequest> {
        self.published.lock().clone()
    }

    pub fn confirmations(&self) -> Vec<(String, String)> {
        self.confirmations.lock().clone()
    }

    pub fn created_topics(&self) -> Vec<String> {
        self.created.lock().clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// ARN the client assigns to a created topic
    pub fn topic_arn(name: &str) -> String {
        format!("{}:{}", ACCOUNT_PREFIX, name)
    }
}

#[async_trait]
impl NotificationClient for RecordingClient {
    async fn publish(&self, request: PublishRequest) -> Result<PublishResponse> {
        if let Some(reason) = &self.publish_failure {
            return Err(Error::Service(reason.clone()));
        }

        let mut published = self.published.lock();
        published.push(request);
        Ok(PublishResponse {
            message_id: Some(format!("message-{}", published.len())),
            sequence_number: None,
        })
    }

    async fn confirm_subscription(&self, topic_arn: &str, token: &str) -> Result<Option<String>> {
        self.confirmations
            .lock()
            .push((topic_arn.to_string(), token.to_string()));
        Ok(Some(format!("{}:subscription", topic_arn)))
    }

    async fn list_topics(&self, next_token: Option<String>) -> Result<TopicPage> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        let start = match next_token {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| Error::InvalidArgument(format!("bad next token {}", token)))?,
            None => 0,
        };

        let topics = self.topics.lock();
        let end = (start + self.page_size).min(topics.len());
        Ok(TopicPage {
            topic_arns: topics.get(start..end).unwrap_or_default().to_vec(),
            next_token: (end < topics.len()).then(|| end.to_string()),
        })
    }

    async fn create_topic(&self, name: &str) -> Result<String> {
        let arn = Self::topic_arn(name);
        self.created.lock().push(name.to_string());

        let mut topics = self.topics.lock();
        if !topics.contains(&arn) {
            topics.push(arn.clone());
        }
        Ok(arn)
    }
}
