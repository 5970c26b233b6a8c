//! `Client`: identity keyed by lowercased email.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

const HISTORY_PREVIEW_LEN: usize = 5;

/// A client, keyed by lowercased email. Deliberately carries no `status`
/// field — booking status lives only on `Event`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub client_id: String,
    pub email: String,
    pub name: Option<String>,
    pub company: Option<String>,
    /// Last 5 message previews, most recent last.
    pub history_preview: VecDeque<String>,
    pub preference_history: Vec<String>,
    /// Hash of the bounded-context snapshot last sent to an LLM call.
    pub context_hash: Option<String>,
}

impl Client {
    pub fn new(client_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            email: email.into().to_lowercase(),
            name: None,
            company: None,
            history_preview: VecDeque::new(),
            preference_history: Vec::new(),
            context_hash: None,
        }
    }

    pub fn push_history_preview(&mut self, preview: impl Into<String>) {
        self.history_preview.push_back(preview.into());
        while self.history_preview.len() > HISTORY_PREVIEW_LEN {
            self.history_preview.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_lowercased_on_construction() {
        let c = Client::new("c1", "Jane.DOE@Example.com");
        assert_eq!(c.email, "jane.doe@example.com");
    }

    #[test]
    fn history_preview_caps_at_five() {
        let mut c = Client::new("c1", "a@b.com");
        for i in 0..8 {
            c.push_history_preview(format!("msg {i}"));
        }
        assert_eq!(c.history_preview.len(), 5);
        assert_eq!(c.history_preview.front().unwrap(), "msg 3");
    }
}
