//! Conversation/event/client/HIL persistence with optimistic concurrency.
//!
//! Same enum-dispatch house style as [`crate::catalog::Catalog`]: one
//! concrete backend ([`InMemoryStore`]) today, room for a persistent one
//! later.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::catalog::SharedEvents;
use crate::error::StoreError;
use crate::model::{Client, Conversation, Event, HilStatus, HilTask, HilTaskType};

/// In-memory reference store. `events` is exposed via [`Self::events_handle`]
/// so an [`crate::catalog::InMemoryCatalog`] can share the same table for
/// room-availability lookups without this crate inventing a second copy.
pub struct InMemoryStore {
    conversations: RwLock<HashMap<String, Conversation>>,
    events: SharedEvents,
    clients: RwLock<HashMap<String, Client>>,
    hil_tasks: RwLock<HashMap<String, HilTask>>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            conversations: RwLock::new(HashMap::new()),
            events: Arc::new(RwLock::new(HashMap::new())),
            clients: RwLock::new(HashMap::new()),
            hil_tasks: RwLock::new(HashMap::new()),
        }
    }

    /// Shared handle for a catalog backend that needs to read bookings.
    pub fn events_handle(&self) -> SharedEvents {
        self.events.clone()
    }

    pub async fn load_conversation(&self, thread_id: &str) -> Option<Conversation> {
        self.conversations.read().await.get(thread_id).cloned()
    }

    /// Inserts a brand-new conversation (`version` must be 0 and absent).
    pub async fn create_conversation(&self, conversation: Conversation) -> Result<(), StoreError> {
        let mut map = self.conversations.write().await;
        if map.contains_key(&conversation.thread_id) {
            return Err(StoreError::Conflict {
                kind: "conversation",
                id: conversation.thread_id.clone(),
                expected: 0,
                actual: map[&conversation.thread_id].version,
            });
        }
        map.insert(conversation.thread_id.clone(), conversation);
        Ok(())
    }

    /// Saves an existing conversation; `expected_version` must match the
    /// stored version or this returns [`StoreError::Conflict`]. The saved
    /// copy's version is bumped by one.
    pub async fn save_conversation(
        &self,
        mut conversation: Conversation,
        expected_version: u64,
    ) -> Result<(), StoreError> {
        let mut map = self.conversations.write().await;
        let current = map
            .get(&conversation.thread_id)
            .ok_or_else(|| StoreError::NotFound {
                kind: "conversation",
                id: conversation.thread_id.clone(),
            })?;
        if current.version != expected_version {
            return Err(StoreError::Conflict {
                kind: "conversation",
                id: conversation.thread_id.clone(),
                expected: expected_version,
                actual: current.version,
            });
        }
        conversation.version = expected_version + 1;
        debug!(thread_id = %conversation.thread_id, version = conversation.version, "conversation saved");
        map.insert(conversation.thread_id.clone(), conversation);
        Ok(())
    }

    pub async fn load_event(&self, event_id: &str) -> Option<Event> {
        self.events.read().await.get(event_id).cloned()
    }

    pub async fn load_events_for_client(&self, client_id: &str) -> Vec<Event> {
        self.events
            .read()
            .await
            .values()
            .filter(|e| e.client_id == client_id)
            .cloned()
            .collect()
    }

    pub async fn create_event(&self, event: Event) -> Result<(), StoreError> {
        let mut map = self.events.write().await;
        if map.contains_key(&event.event_id) {
            return Err(StoreError::Conflict {
                kind: "event",
                id: event.event_id.clone(),
                expected: 0,
                actual: map[&event.event_id].version,
            });
        }
        map.insert(event.event_id.clone(), event);
        Ok(())
    }

    pub async fn save_event(&self, mut event: Event, expected_version: u64) -> Result<(), StoreError> {
        let mut map = self.events.write().await;
        let current = map.get(&event.event_id).ok_or_else(|| StoreError::NotFound {
            kind: "event",
            id: event.event_id.clone(),
        })?;
        if current.version != expected_version {
            return Err(StoreError::Conflict {
                kind: "event",
                id: event.event_id.clone(),
                expected: expected_version,
                actual: current.version,
            });
        }
        event.version = expected_version + 1;
        debug!(event_id = %event.event_id, version = event.version, "event saved");
        map.insert(event.event_id.clone(), event);
        Ok(())
    }

    pub async fn load_client_by_email(&self, email: &str) -> Option<Client> {
        let email = email.to_lowercase();
        self.clients.read().await.values().find(|c| c.email == email).cloned()
    }

    pub async fn upsert_client(&self, client: Client) -> Result<(), StoreError> {
        self.clients.write().await.insert(client.client_id.clone(), client);
        Ok(())
    }

    pub async fn list_pending_tasks(&self) -> Vec<HilTask> {
        self.hil_tasks
            .read()
            .await
            .values()
            .filter(|t| matches!(t.status, HilStatus::Pending))
            .cloned()
            .collect()
    }

    pub async fn load_task(&self, task_id: &str) -> Option<HilTask> {
        self.hil_tasks.read().await.get(task_id).cloned()
    }

    /// Inserts a task, superseding any pending task with the same
    /// `(thread_id, task_type)` key.
    pub async fn enqueue_task(&self, task: HilTask) -> Result<(), StoreError> {
        let mut map = self.hil_tasks.write().await;
        let key = task.dedup_key();
        let superseded: Vec<String> = map
            .values()
            .filter(|t| matches!(t.status, HilStatus::Pending) && t.dedup_key() == key)
            .map(|t| t.task_id.clone())
            .collect();
        for id in superseded {
            if let Some(old) = map.get_mut(&id) {
                old.status = HilStatus::Superseded;
            }
        }
        map.insert(task.task_id.clone(), task);
        Ok(())
    }

    pub async fn set_task_status(
        &self,
        task_id: &str,
        status: HilStatus,
        notes: Option<String>,
        edited_message: Option<String>,
    ) -> Result<HilTask, StoreError> {
        let mut map = self.hil_tasks.write().await;
        let task = map.get_mut(task_id).ok_or_else(|| StoreError::NotFound {
            kind: "hil_task",
            id: task_id.to_string(),
        })?;
        task.status = status;
        task.notes = notes;
        task.edited_message = edited_message;
        Ok(task.clone())
    }
}

/// Enum-dispatch wrapper; today there is only one backend.
pub enum ConversationStore {
    InMemory(InMemoryStore),
}

impl ConversationStore {
    pub async fn load_conversation(&self, thread_id: &str) -> Option<Conversation> {
        match self {
            Self::InMemory(s) => s.load_conversation(thread_id).await,
        }
    }

    pub async fn create_conversation(&self, conversation: Conversation) -> Result<(), StoreError> {
        match self {
            Self::InMemory(s) => s.create_conversation(conversation).await,
        }
    }

    pub async fn save_conversation(
        &self,
        conversation: Conversation,
        expected_version: u64,
    ) -> Result<(), StoreError> {
        match self {
            Self::InMemory(s) => s.save_conversation(conversation, expected_version).await,
        }
    }

    pub async fn load_event(&self, event_id: &str) -> Option<Event> {
        match self {
            Self::InMemory(s) => s.load_event(event_id).await,
        }
    }

    pub async fn load_events_for_client(&self, client_id: &str) -> Vec<Event> {
        match self {
            Self::InMemory(s) => s.load_events_for_client(client_id).await,
        }
    }

    pub async fn create_event(&self, event: Event) -> Result<(), StoreError> {
        match self {
            Self::InMemory(s) => s.create_event(event).await,
        }
    }

    pub async fn save_event(&self, event: Event, expected_version: u64) -> Result<(), StoreError> {
        match self {
            Self::InMemory(s) => s.save_event(event, expected_version).await,
        }
    }

    pub async fn load_client_by_email(&self, email: &str) -> Option<Client> {
        match self {
            Self::InMemory(s) => s.load_client_by_email(email).await,
        }
    }

    pub async fn upsert_client(&self, client: Client) -> Result<(), StoreError> {
        match self {
            Self::InMemory(s) => s.upsert_client(client).await,
        }
    }

    pub async fn list_pending_tasks(&self) -> Vec<HilTask> {
        match self {
            Self::InMemory(s) => s.list_pending_tasks().await,
        }
    }

    pub async fn load_task(&self, task_id: &str) -> Option<HilTask> {
        match self {
            Self::InMemory(s) => s.load_task(task_id).await,
        }
    }

    pub async fn enqueue_task(&self, task: HilTask) -> Result<(), StoreError> {
        match self {
            Self::InMemory(s) => s.enqueue_task(task).await,
        }
    }

    pub async fn set_task_status(
        &self,
        task_id: &str,
        status: HilStatus,
        notes: Option<String>,
        edited_message: Option<String>,
    ) -> Result<HilTask, StoreError> {
        match self {
            Self::InMemory(s) => s.set_task_status(task_id, status, notes, edited_message).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HilPayload, Step};

    fn sample_task(thread_id: &str, task_type: HilTaskType) -> HilTask {
        HilTask {
            task_id: uuid::Uuid::new_v4().to_string(),
            thread_id: thread_id.to_string(),
            event_id: "ev1".to_string(),
            step: Step::OfferPreparation,
            task_type,
            payload: HilPayload {
                body: "draft".into(),
                body_markdown: "**draft**".into(),
                event_summary: "summary".into(),
                current_step: Step::OfferPreparation,
            },
            status: HilStatus::Pending,
            notes: None,
            edited_message: None,
        }
    }

    #[tokio::test]
    async fn save_conversation_rejects_stale_version() {
        let store = InMemoryStore::new();
        let convo = Conversation::new("t1", "a@b.com");
        store.create_conversation(convo.clone()).await.unwrap();

        let err = store.save_conversation(convo, 7).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
    }

    #[tokio::test]
    async fn enqueue_task_supersedes_same_thread_and_type() {
        let store = InMemoryStore::new();
        let first = sample_task("t1", HilTaskType::OfferMessage);
        let first_id = first.task_id.clone();
        store.enqueue_task(first).await.unwrap();

        let second = sample_task("t1", HilTaskType::OfferMessage);
        store.enqueue_task(second).await.unwrap();

        let pending = store.list_pending_tasks().await;
        assert_eq!(pending.len(), 1);
        assert_ne!(pending[0].task_id, first_id);

        let old = store.load_task(&first_id).await.unwrap();
        assert!(matches!(old.status, HilStatus::Superseded));
    }
}
