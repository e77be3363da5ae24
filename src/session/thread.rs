//! A single chat thread and the model-facing conversation it carries.

use chrono::{DateTime, Utc};

use crate::llm::{Message, MessageRole};

/// Key of the unnamed session.
pub const PLACEHOLDER_KEY: &str = "New Chat";

/// Display title of the unnamed session. A session is eligible for promotion
/// while its title equals this.
pub const PLACEHOLDER_TITLE: &str = "💬 New Chat";

/// First message of every fresh session.
pub const GREETING: &str = "👋 Hi! I'm your Tennis Assistant. How can I help you today?";

/// Turns the model provider has already answered.
///
/// Only completed exchanges are recorded, so a user message whose reply
/// failed never reaches the provider as history.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    turns: Vec<Message>,
}

impl Conversation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one answered exchange.
    pub fn record_exchange(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.turns.push(Message::user(user));
        self.turns.push(Message::assistant(assistant));
    }

    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.turns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

/// One chat thread: its transcript plus the conversation sent to the model.
///
/// The key is only changed by the owning store (see
/// [`SessionStore::maybe_promote`](super::SessionStore::maybe_promote)).
#[derive(Debug, Clone)]
pub struct ChatSession {
    key: String,
    title: String,
    transcript: Vec<Message>,
    conversation: Conversation,
    created_at: DateTime<Utc>,
}

impl ChatSession {
    /// A fresh placeholder session seeded with the greeting.
    pub(crate) fn placeholder() -> Self {
        Self {
            key: PLACEHOLDER_KEY.to_string(),
            title: PLACEHOLDER_TITLE.to_string(),
            transcript: vec![Message::assistant(GREETING)],
            conversation: Conversation::new(),
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Whether this session still awaits its derived title.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.title == PLACEHOLDER_TITLE
    }

    #[must_use]
    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    #[must_use]
    pub fn message_count(&self) -> usize {
        self.transcript.len()
    }

    #[must_use]
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Append a user message to the transcript.
    pub fn add_user_message(&mut self, content: impl Into<String>) {
        self.transcript.push(Message::user(content));
    }

    /// Append an assistant message to the transcript.
    pub fn add_assistant_message(&mut self, content: impl Into<String>) {
        self.transcript.push(Message::assistant(content));
    }

    /// Record an answered exchange in the model conversation.
    pub fn record_exchange(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.conversation.record_exchange(user, assistant);
    }

    /// Number of user messages in the transcript.
    #[must_use]
    pub fn user_message_count(&self) -> usize {
        self.transcript
            .iter()
            .filter(|m| m.role == MessageRole::User)
            .count()
    }

    /// Move the session under a new key; the key doubles as its title.
    pub(crate) fn rekey(&mut self, key: String) {
        self.title.clone_from(&key);
        self.key = key;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_is_seeded_with_greeting() {
        let session = ChatSession::placeholder();

        assert_eq!(session.key(), PLACEHOLDER_KEY);
        assert!(session.is_placeholder());
        assert_eq!(session.message_count(), 1);
        assert_eq!(session.transcript()[0].role, MessageRole::Assistant);
        assert_eq!(session.transcript()[0].content, GREETING);
        assert!(session.conversation().is_empty());
    }

    #[test]
    fn test_transcript_and_conversation_are_separate() {
        let mut session = ChatSession::placeholder();

        session.add_user_message("How do I hit a kick serve?");
        assert_eq!(session.user_message_count(), 1);
        assert!(session.conversation().is_empty());

        session.add_assistant_message("Toss it behind your head.");
        session.record_exchange("How do I hit a kick serve?", "Toss it behind your head.");
        assert_eq!(session.message_count(), 3);
        assert_eq!(session.conversation().len(), 2);
    }

    #[test]
    fn test_rekey_sets_key_and_title() {
        let mut session = ChatSession::placeholder();
        session.rekey("💬 Kick serve help...".to_string());

        assert_eq!(session.key(), "💬 Kick serve help...");
        assert_eq!(session.title(), "💬 Kick serve help...");
        assert!(!session.is_placeholder());
    }
}
