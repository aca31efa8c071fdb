//! In-memory session store.
//!
//! Keeps each session's committed message history for the lifetime of the
//! process. Nothing is persisted across runs.

use dashmap::DashMap;

use devchat_types::agent::SessionId;
use devchat_types::llm::Message;

/// Committed conversation histories keyed by session id.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<SessionId, Vec<Message>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a session's history. Unknown sessions are empty.
    pub fn history(&self, session: &SessionId) -> Vec<Message> {
        self.sessions
            .get(session)
            .map(|h| h.clone())
            .unwrap_or_default()
    }

    /// Replace a session's history with the result of a completed turn.
    pub fn commit(&self, session: &SessionId, messages: Vec<Message>) {
        self.sessions.insert(session.clone(), messages);
    }

    /// Forget a session entirely.
    pub fn clear(&self, session: &SessionId) {
        self.sessions.remove(session);
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_session_has_empty_history() {
        let store = SessionStore::new();
        assert!(store.history(&SessionId::new("nope")).is_empty());
    }

    #[test]
    fn commit_replaces_history() {
        let store = SessionStore::new();
        let id = SessionId::new("main");

        store.commit(&id, vec![Message::user("one")]);
        store.commit(&id, vec![Message::user("one"), Message::user("two")]);

        let history = store.history(&id);
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].text(), "two");
    }

    #[test]
    fn sessions_are_isolated_and_clearable() {
        let store = SessionStore::new();
        let a = SessionId::new("a");
        let b = SessionId::new("b");

        store.commit(&a, vec![Message::user("for a")]);
        store.commit(&b, vec![Message::user("for b")]);
        store.clear(&a);

        assert!(store.history(&a).is_empty());
        assert_eq!(store.history(&b)[0].text(), "for b");
    }
}
