//! Per-user collection of chat threads.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::llm::Message;

use super::thread::{ChatSession, PLACEHOLDER_KEY, PLACEHOLDER_TITLE};
use super::title::title_from;

/// All chat threads of one user plus the current selection.
///
/// `active` is either the key of an existing session or [`PLACEHOLDER_KEY`]
/// while the placeholder has not been materialized yet. Every mutating
/// method keeps it that way.
#[derive(Debug, Clone)]
pub struct SessionStore {
    /// Insertion-ordered; keys are unique.
    sessions: Vec<ChatSession>,
    active: String,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// An empty store pointing at the not-yet-created placeholder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: Vec::new(),
            active: PLACEHOLDER_KEY.to_string(),
        }
    }

    /// An empty store with the placeholder session created and selected.
    #[must_use]
    pub fn init() -> Self {
        let mut store = Self::new();
        store.ensure_placeholder();
        store
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.sessions.iter().position(|s| s.key() == key)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ChatSession> {
        self.sessions.iter().find(|s| s.key() == key)
    }

    #[must_use]
    pub fn get_mut(&mut self, key: &str) -> Option<&mut ChatSession> {
        self.sessions.iter_mut().find(|s| s.key() == key)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Session keys in display order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.sessions.iter().map(ChatSession::key)
    }

    #[must_use]
    pub fn active_key(&self) -> &str {
        &self.active
    }

    /// The selected session, if it has been materialized.
    #[must_use]
    pub fn active(&self) -> Option<&ChatSession> {
        self.get(&self.active)
    }

    /// Make sure the selection resolves, creating the placeholder if needed.
    ///
    /// An existing placeholder is reused as is, so calling this repeatedly is
    /// a no-op once the selection resolves.
    pub fn ensure_placeholder(&mut self) -> &mut ChatSession {
        let idx = if let Some(idx) = self.position(&self.active) {
            idx
        } else {
            self.active = PLACEHOLDER_KEY.to_string();
            if let Some(idx) = self.position(PLACEHOLDER_KEY) {
                idx
            } else {
                tracing::debug!(name: "session.placeholder.created", "Created placeholder chat");
                self.sessions.push(ChatSession::placeholder());
                self.sessions.len() - 1
            }
        };
        &mut self.sessions[idx]
    }

    /// Switch to the placeholder chat, creating it if there is none.
    pub fn new_chat(&mut self) -> &mut ChatSession {
        self.active = PLACEHOLDER_KEY.to_string();
        self.ensure_placeholder()
    }

    /// Select an existing session. Unknown keys are rejected.
    pub fn select(&mut self, key: &str) -> bool {
        if !self.contains(key) {
            return false;
        }
        self.active = key.to_string();
        true
    }

    /// Remove a session; absent keys are a no-op.
    ///
    /// When the active session goes, the selection falls back to the first
    /// remaining session, or to the placeholder sentinel once the store is
    /// empty.
    pub fn delete(&mut self, key: &str) -> Option<ChatSession> {
        let idx = self.position(key)?;
        let removed = self.sessions.remove(idx);

        if let Some(first) = self.sessions.first() {
            if self.active == key {
                self.active = first.key().to_string();
            }
        } else {
            self.active = PLACEHOLDER_KEY.to_string();
        }

        tracing::debug!(
            name: "session.deleted",
            session = %key,
            remaining = self.sessions.len(),
            "Deleted chat"
        );
        Some(removed)
    }

    /// Append a user message to the session under `key`.
    pub fn append_user_message(&mut self, key: &str, text: impl Into<String>) -> bool {
        self.get_mut(key)
            .map(|session| session.add_user_message(text))
            .is_some()
    }

    /// Append an assistant message to the session under `key`.
    pub fn append_assistant_message(&mut self, key: &str, text: impl Into<String>) -> bool {
        self.get_mut(key)
            .map(|session| session.add_assistant_message(text))
            .is_some()
    }

    /// Rename a placeholder session after its first answered message.
    ///
    /// The session keeps its position, transcript and conversation; only its
    /// key and title change, and the selection follows it. Returns the new
    /// key, or `None` when the session is already named, absent, or the
    /// text yields no title.
    pub fn maybe_promote(&mut self, key: &str, first_user_text: &str) -> Option<String> {
        let idx = self.position(key)?;
        if !self.sessions[idx].is_placeholder() {
            return None;
        }

        let derived = title_from(first_user_text);
        if derived == PLACEHOLDER_TITLE {
            return None;
        }

        let new_key = self.unique_key(derived);
        self.sessions[idx].rekey(new_key.clone());
        if self.active == key {
            self.active.clone_from(&new_key);
        }

        tracing::info!(
            name: "session.promoted",
            from = %key,
            to = %new_key,
            "Named chat"
        );
        Some(new_key)
    }

    /// `base`, or `base (n)` for the smallest free `n >= 2`.
    fn unique_key(&self, base: String) -> String {
        if !self.contains(&base) {
            return base;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{base} ({n})");
            if !self.contains(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Immutable snapshot for rendering.
    #[must_use]
    pub fn view(&self) -> StoreView {
        StoreView {
            active_key: self.active.clone(),
            sessions: self
                .sessions
                .iter()
                .map(|s| SessionSummary {
                    key: s.key().to_string(),
                    title: s.title().to_string(),
                    message_count: s.message_count(),
                    active: s.key() == self.active,
                    created_at: s.created_at(),
                })
                .collect(),
            transcript: self
                .active()
                .map(|s| s.transcript().to_vec())
                .unwrap_or_default(),
        }
    }
}

/// Sidebar entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub key: String,
    pub title: String,
    pub message_count: usize,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Snapshot of a [`SessionStore`] taken at the end of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreView {
    pub active_key: String,
    pub sessions: Vec<SessionSummary>,
    /// Transcript of the active session, oldest first.
    pub transcript: Vec<Message>,
}
