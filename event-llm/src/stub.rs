//! Deterministic test double for [`crate::adapters::LlmAdapters`].
//!
//! Tests push canned responses onto each queue; calls pop them in FIFO
//! order. An empty queue is a test bug, not a fallback path, so it panics
//! rather than returning `EmptyOutput` — callers that want to exercise the
//! fallback path push an `Err` directly.

use std::sync::Mutex;

use crate::error::{AdaptersError, Result};
use crate::types::{EntityExtraction, IntentSignal};

/// Canned adapter outputs for one test scenario.
#[derive(Default)]
pub struct StubAdapters {
    intent: Mutex<Vec<Result<IntentSignal>>>,
    entity: Mutex<Vec<Result<EntityExtraction>>>,
    verbalize: Mutex<Vec<Result<String>>>,
}

impl StubAdapters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_intent(&self, signal: IntentSignal) -> &Self {
        self.intent.lock().unwrap().insert(0, Ok(signal));
        self
    }

    pub fn push_intent_err(&self, err: AdaptersError) -> &Self {
        self.intent.lock().unwrap().insert(0, Err(err));
        self
    }

    pub fn push_entity(&self, extraction: EntityExtraction) -> &Self {
        self.entity.lock().unwrap().insert(0, Ok(extraction));
        self
    }

    pub fn push_verbalize(&self, text: impl Into<String>) -> &Self {
        self.verbalize.lock().unwrap().insert(0, Ok(text.into()));
        self
    }

    pub fn push_verbalize_err(&self, err: AdaptersError) -> &Self {
        self.verbalize.lock().unwrap().insert(0, Err(err));
        self
    }

    pub async fn classify_intent(&self, _history: &str, _latest: &str) -> Result<IntentSignal> {
        self.intent
            .lock()
            .unwrap()
            .pop()
            .expect("StubAdapters: no queued intent response")
    }

    pub async fn extract_entities(&self, _history: &str, _latest: &str) -> Result<EntityExtraction> {
        self.entity
            .lock()
            .unwrap()
            .pop()
            .expect("StubAdapters: no queued entity response")
    }

    pub async fn verbalize(&self, _system_prompt: &str, _user_prompt: &str) -> Result<String> {
        self.verbalize
            .lock()
            .unwrap()
            .pop()
            .expect("StubAdapters: no queued verbalize response")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Intent;

    #[tokio::test]
    async fn pops_in_fifo_order() {
        let stub = StubAdapters::new();
        stub.push_intent(IntentSignal {
            intent: Intent::EventRequest,
            ..Default::default()
        });
        stub.push_intent(IntentSignal {
            intent: Intent::ChangeRequest,
            ..Default::default()
        });

        let first = stub.classify_intent("", "").await.unwrap();
        let second = stub.classify_intent("", "").await.unwrap();
        assert_eq!(first.intent, Intent::EventRequest);
        assert_eq!(second.intent, Intent::ChangeRequest);
    }

    #[tokio::test]
    #[should_panic(expected = "no queued intent response")]
    async fn panics_when_queue_drained() {
        let stub = StubAdapters::new();
        let _ = stub.classify_intent("", "").await;
    }
}
