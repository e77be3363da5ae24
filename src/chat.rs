//! One chat turn: user message in, assistant reply out.

use serde::Serialize;

use crate::error::TurnError;
use crate::llm::ReplyGenerator;
use crate::session::SessionStore;

/// Result of a successful turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnOutcome {
    /// The assistant reply that was appended.
    pub reply: String,
    /// Key of the session the turn landed in, after any promotion. This is
    /// also the selected key once the turn is done.
    pub active_key: String,
    /// Set when this turn named a placeholder chat.
    pub promoted_to: Option<String>,
}

/// Run a user message through the active session.
///
/// Order matters: the user message is appended before the provider is
/// called, the assistant message only after a successful reply, and the
/// rename happens last. On a provider error the user message stays in the
/// transcript and nothing else changes.
///
/// # Errors
///
/// [`TurnError::EmptyMessage`] for blank input (nothing is recorded and the
/// provider is not called), [`TurnError::Provider`] when no reply arrives.
pub async fn send_message(
    store: &mut SessionStore,
    generator: &dyn ReplyGenerator,
    text: &str,
) -> Result<TurnOutcome, TurnError> {
    if text.trim().is_empty() {
        return Err(TurnError::EmptyMessage);
    }

    let session = store.ensure_placeholder();
    session.add_user_message(text);
    let key = session.key().to_string();

    tracing::info!(
        name: "chat.turn.started",
        session = %key,
        message_length = text.len(),
        history_length = session.conversation().len(),
        "Generating reply"
    );

    let reply = match generator.generate_reply(session.conversation(), text).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::warn!(
                name: "chat.turn.failed",
                session = %key,
                error = %e,
                "Reply generation failed"
            );
            return Err(e.into());
        }
    };

    session.add_assistant_message(reply.clone());
    session.record_exchange(text, reply.clone());

    let promoted_to = store.maybe_promote(&key, text);
    let active_key = promoted_to.clone().unwrap_or(key);

    tracing::info!(
        name: "chat.turn.completed",
        session = %active_key,
        reply_length = reply.len(),
        promoted = promoted_to.is_some(),
        "Reply appended"
    );

    Ok(TurnOutcome {
        reply,
        active_key,
        promoted_to,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::error::ProviderError;
    use crate::llm::MessageRole;
    use crate::session::{Conversation, PLACEHOLDER_KEY};

    /// Replies with a fixed answer, or fails, and remembers what it saw.
    #[derive(Default)]
    struct Scripted {
        fail: bool,
        calls: Mutex<Vec<(usize, String)>>,
    }

    impl Scripted {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<(usize, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl ReplyGenerator for Scripted {
        async fn generate_reply(
            &self,
            conversation: &Conversation,
            user_text: &str,
        ) -> Result<String, ProviderError> {
            self.calls
                .lock()
                .unwrap()
                .push((conversation.len(), user_text.to_string()));
            if self.fail {
                Err(ProviderError::RateLimited)
            } else {
                Ok(format!("Coach says: {user_text}"))
            }
        }
    }

    #[tokio::test]
    async fn test_first_turn_appends_and_promotes() {
        let mut store = SessionStore::init();
        let generator = Scripted::default();

        let outcome = send_message(&mut store, &generator, "quick serve practice today")
            .await
            .unwrap();

        assert_eq!(outcome.reply, "Coach says: quick serve practice today");
        assert_eq!(
            outcome.promoted_to.as_deref(),
            Some("💬 Quick serve practice...")
        );
        assert_eq!(outcome.active_key, "💬 Quick serve practice...");
        assert!(!store.contains(PLACEHOLDER_KEY));

        let session = store.active().unwrap();
        let roles: Vec<MessageRole> = session.transcript().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                MessageRole::Assistant,
                MessageRole::User,
                MessageRole::Assistant
            ]
        );
        assert_eq!(session.conversation().len(), 2);
    }

    #[tokio::test]
    async fn test_later_turns_pass_history_and_keep_name() {
        let mut store = SessionStore::init();
        let generator = Scripted::default();

        send_message(&mut store, &generator, "backhand slice tips")
            .await
            .unwrap();
        let outcome = send_message(&mut store, &generator, "and for returns?")
            .await
            .unwrap();

        assert!(outcome.promoted_to.is_none());
        assert_eq!(outcome.active_key, "💬 Backhand slice tips...");
        assert_eq!(
            generator.calls(),
            vec![
                (0, "backhand slice tips".to_string()),
                (2, "and for returns?".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_input_is_rejected() {
        let mut store = SessionStore::init();
        let generator = Scripted::default();

        for text in ["", "   ", "\n\t"] {
            let err = send_message(&mut store, &generator, text).await.unwrap_err();
            assert!(matches!(err, TurnError::EmptyMessage));
        }

        assert!(generator.calls().is_empty());
        assert_eq!(store.active().unwrap().message_count(), 1);
    }

    #[tokio::test]
    async fn test_provider_failure_keeps_user_message_only() {
        let mut store = SessionStore::init();
        let generator = Scripted::failing();

        let err = send_message(&mut store, &generator, "volley drills")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TurnError::Provider(ProviderError::RateLimited)
        ));

        let session = store.active().unwrap();
        assert_eq!(session.key(), PLACEHOLDER_KEY);
        assert_eq!(session.message_count(), 2);
        assert_eq!(session.transcript()[1].content, "volley drills");
        assert!(session.conversation().is_empty());
    }

    #[tokio::test]
    async fn test_retry_after_failure_promotes_from_retry_text() {
        let mut store = SessionStore::init();

        send_message(&mut store, &Scripted::failing(), "volley drills")
            .await
            .unwrap_err();
        let outcome = send_message(&mut store, &Scripted::default(), "volley drills please")
            .await
            .unwrap();

        assert_eq!(outcome.active_key, "💬 Volley drills please...");
        // Both user messages stay visible.
        assert_eq!(store.active().unwrap().user_message_count(), 2);
    }

    #[tokio::test]
    async fn test_turn_recreates_deleted_placeholder() {
        let mut store = SessionStore::init();
        store.delete(PLACEHOLDER_KEY);
        assert!(store.is_empty());

        send_message(&mut store, &Scripted::default(), "grip change")
            .await
            .unwrap();
        assert_eq!(store.len(), 1);
    }
}
