//! Persistence ports for messages and grouped-message sets.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use chatlens_protocol::cluster::GroupedMessageSet;
use chatlens_protocol::{Message, SenderRole};

/// Read and flag access to the transcript message records.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Messages not yet embedded, across all agents.
    async fn pending(&self) -> anyhow::Result<Vec<Message>>;

    /// All of one agent's messages, optionally filtered by sender role.
    async fn by_agent(
        &self,
        agent_id: &str,
        role: Option<SenderRole>,
    ) -> anyhow::Result<Vec<Message>>;

    /// Flip the embedded flag on the given message ids.
    async fn mark_embedded(&self, message_ids: &[String]) -> anyhow::Result<()>;
}

/// Persistence for the per-agent grouped-message sets.
#[async_trait]
pub trait GroupedStore: Send + Sync {
    /// The current set for an agent, if one has been computed.
    async fn load(&self, agent_id: &str) -> anyhow::Result<Option<GroupedMessageSet>>;

    /// Replace an agent's set wholesale.
    async fn replace(&self, set: GroupedMessageSet) -> anyhow::Result<()>;
}

/// Message store backed by a mutex-guarded vector.
#[derive(Default)]
pub struct InMemoryMessageStore {
    messages: Mutex<Vec<Message>>,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_messages(messages: Vec<Message>) -> Self {
        Self {
            messages: Mutex::new(messages),
        }
    }

    pub fn insert(&self, message: Message) {
        self.messages.lock().unwrap().push(message);
    }

    /// Snapshot of every message, for assertions.
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn pending(&self) -> anyhow::Result<Vec<Message>> {
        Ok(self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| !m.embedded)
            .cloned()
            .collect())
    }

    async fn by_agent(
        &self,
        agent_id: &str,
        role: Option<SenderRole>,
    ) -> anyhow::Result<Vec<Message>> {
        Ok(self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.agent_id == agent_id)
            .filter(|m| role.is_none_or(|r| m.sender_role == r))
            .cloned()
            .collect())
    }

    async fn mark_embedded(&self, message_ids: &[String]) -> anyhow::Result<()> {
        let mut messages = self.messages.lock().unwrap();
        for message in messages.iter_mut() {
            if message_ids.contains(&message.id) {
                message.embedded = true;
            }
        }
        Ok(())
    }
}

/// Grouped-set store backed by a mutex-guarded map.
#[derive(Default)]
pub struct InMemoryGroupedStore {
    sets: Mutex<HashMap<String, GroupedMessageSet>>,
}

impl InMemoryGroupedStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GroupedStore for InMemoryGroupedStore {
    async fn load(&self, agent_id: &str) -> anyhow::Result<Option<GroupedMessageSet>> {
        Ok(self.sets.lock().unwrap().get(agent_id).cloned())
    }

    async fn replace(&self, set: GroupedMessageSet) -> anyhow::Result<()> {
        self.sets
            .lock()
            .unwrap()
            .insert(set.agent_id.clone(), set);
        Ok(())
    }
}
