//! Topic name to ARN resolution

use parking_lot::RwLock;
use snsbridge_core::utils::is_topic_arn;
use snsbridge_core::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::client::NotificationClient;

/// Resolves destinations to topic ARNs.
///
/// ARNs pass through untouched. Names are looked up through `ListTopics`
/// and optionally created when missing. Resolved names are cached.
pub struct DynamicTopicResolver {
    client: Arc<dyn NotificationClient>,
    auto_create: bool,
    cache: RwLock<HashMap<String, String>>,
}

impl DynamicTopicResolver {
    pub fn new(client: Arc<dyn NotificationClient>) -> Self {
        Self {
            client,
            auto_create: false,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_auto_create(mut self, auto_create: bool) -> Self {
        self.auto_create = auto_create;
        self
    }

    pub async fn resolve(&self, destination: &str) -> Result<String> {
        if destination.is_empty() {
            return Err(Error::InvalidArgument("destination must not be empty".into()));
        }
        if is_topic_arn(destination) {
            return Ok(destination.to_string());
        }
        if let Some(arn) = self.cache.read().get(destination) {
            return Ok(arn.clone());
        }

        let arn = match self.find_topic(destination).await? {
            Some(arn) => arn,
            None if self.auto_create => {
                info!("Creating missing topic {}", destination);
                self.client.create_topic(destination).await?
            }
            None => return Err(Error::TopicNotFound(destination.to_string())),
        };

        debug!("Resolved topic {} to {}", destination, arn);
        self.cache
            .write()
            .insert(destination.to_string(), arn.clone());
        Ok(arn)
    }

    async fn find_topic(&self, name: &str) -> Result<Option<String>> {
        let suffix = format!(":{}", name);
        let mut next_token = None;

        loop {
            let page = self.client.list_topics(next_token).await?;
            if let Some(arn) = page.topic_arns.into_iter().find(|arn| arn.ends_with(&suffix)) {
                return Ok(Some(arn));
            }
            match page.next_token {
                Some(token) => next_token = Some(token),
                None => return Ok(None),
            }
        }
    }
}

impl std::fmt::Debug for DynamicTopicResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicTopicResolver")
            .field("auto_create", &self.auto_create)
            .field("cached", &self.cache.read().len())
            .finish()
    }
}
