//! Reply generation against a hosted LLM.
//!
//! The chat layer only ever talks to the [`ReplyGenerator`] trait: it hands
//! over the session's [`Conversation`] plus the new user text and gets back
//! either the assistant reply or a [`ProviderError`]. The production
//! implementation is [`ChatCompletionsDriver`], which speaks the `OpenAI`
//! Chat Completions API (`/v1/chat/completions`).
//!
//! # Example
//!
//! ```rust,ignore
//! use tennis_assistant::llm::{ChatCompletionsDriver, LlmSettings, ReplyGenerator};
//! use tennis_assistant::session::Conversation;
//!
//! let driver = ChatCompletionsDriver::new(settings);
//! let reply = driver
//!     .generate_reply(&Conversation::new(), "How do I fix my toss?")
//!     .await?;
//! ```

pub mod chat_completions;

pub use chat_completions::ChatCompletionsDriver;

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::session::Conversation;

/// LLM connection and model settings.
#[derive(Clone)]
pub struct LlmSettings {
    /// Base URL for the LLM API (e.g., `https://api.openai.com`).
    pub base_url: String,
    /// API key sent as a bearer token.
    pub api_key: String,
    /// Model identifier (e.g., `gpt-4o-mini`).
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// System prompt prepended to every request.
    pub system_prompt: String,
}

impl std::fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSettings")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("system_prompt", &self.system_prompt)
            .finish()
    }
}

/// Role of a message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System prompt. Only ever sent to the provider, never shown.
    System,
    /// User message.
    User,
    /// Assistant response.
    Assistant,
}

impl MessageRole {
    /// Lowercase name, as used on the wire and in CSS classes.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message author.
    pub role: MessageRole,
    /// Text content.
    pub content: String,
}

impl Message {
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Events decoded from a streamed completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Incremental text from the assistant.
    MessageDelta { text: String },
    /// The provider reported why generation stopped (`stop`, `length`, ...).
    Finished { reason: String },
    /// The `[DONE]` sentinel.
    Done,
}

/// Produces assistant replies for a conversation.
///
/// Implementations must not mutate the conversation; the caller records the
/// exchange only once a reply has been produced.
#[async_trait::async_trait]
pub trait ReplyGenerator: Send + Sync {
    /// Generate the assistant reply to `user_text`, given the prior turns.
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderError`] when the provider cannot be reached,
    /// rejects the request, or answers with something unusable.
    async fn generate_reply(
        &self,
        conversation: &Conversation,
        user_text: &str,
    ) -> Result<String, ProviderError>;
}
