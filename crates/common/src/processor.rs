//! Topic dispatch for verified notifications.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use error_stack::{Report, ResultExt};

use crate::error::EventNotificationError;
use crate::models::{AccountDeletionData, Message, Topic};
use crate::serializer;

/// Handles verified notifications of one topic.
#[async_trait]
pub trait MessageProcessor: Send + Sync {
    /// # Errors
    ///
    /// Implementations report payload or downstream failures.
    async fn process(&self, message: &Message) -> Result<(), Report<EventNotificationError>>;
}

/// Processors keyed by topic.
#[derive(Clone, Default)]
pub struct ProcessorRegistry {
    processors: HashMap<Topic, Arc<dyn MessageProcessor>>,
}

impl ProcessorRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in account deletion processor.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(
            Topic::MarketplaceAccountDeletion,
            Arc::new(AccountDeletionProcessor),
        );
        registry
    }

    /// Registers `processor` for `topic`, replacing any earlier one.
    pub fn register(&mut self, topic: Topic, processor: Arc<dyn MessageProcessor>) {
        self.processors.insert(topic, processor);
    }

    /// # Errors
    ///
    /// Returns [`EventNotificationError::ProcessorNotDefined`] for unregistered topics.
    pub fn get(
        &self,
        topic: &Topic,
    ) -> Result<Arc<dyn MessageProcessor>, Report<EventNotificationError>> {
        self.processors.get(topic).cloned().ok_or_else(|| {
            Report::new(EventNotificationError::ProcessorNotDefined {
                topic: topic.to_string(),
            })
        })
    }

    /// Hands `message` to the processor registered for its topic.
    ///
    /// # Errors
    ///
    /// Returns [`EventNotificationError::ProcessorNotDefined`] or whatever the
    /// processor reports.
    pub async fn dispatch(&self, message: &Message) -> Result<(), Report<EventNotificationError>> {
        let topic = message.topic();
        let processor = self.get(&topic)?;
        processor
            .process(message)
            .await
            .attach(format!("topic: {}", topic))
    }
}

/// Logs account deletion requests.
#[derive(Debug, Default, Clone, Copy)]
pub struct AccountDeletionProcessor;

#[async_trait]
impl MessageProcessor for AccountDeletionProcessor {
    async fn process(&self, message: &Message) -> Result<(), Report<EventNotificationError>> {
        let data: AccountDeletionData = serializer::deserialize_value(&message.notification.data)?;
        log::info!(
            "AccountDeletionRequested: username={}, userId={}, eiasToken={}",
            data.username,
            data.user_id,
            data.eias_token
        );
        Ok(())
    }
}
