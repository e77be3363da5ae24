//! `OpenAI` Chat Completions API driver.
//!
//! Streams `/v1/chat/completions` and folds the content deltas into a single
//! reply string for the [`ReplyGenerator`] seam.

use std::pin::Pin;

use futures::{Stream, StreamExt};

use crate::error::ProviderError;
use crate::session::Conversation;

use super::{LlmSettings, Message, ReplyGenerator, StreamEvent};

/// Longest provider error body we keep for display.
const MAX_ERROR_BODY: usize = 300;

type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, ProviderError>> + Send>>;

/// Driver for the `OpenAI` Chat Completions API.
#[derive(Clone)]
pub struct ChatCompletionsDriver {
    http: reqwest::Client,
    settings: LlmSettings,
}

impl std::fmt::Debug for ChatCompletionsDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsDriver")
            .field("settings", &self.settings)
            .finish()
    }
}

impl ChatCompletionsDriver {
    /// Create a new Chat Completions driver with the given settings.
    #[must_use]
    pub fn new(settings: LlmSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.settings.base_url.trim_end_matches('/')
        )
    }

    /// System prompt, then the answered turns, then the new user message.
    fn build_messages(&self, conversation: &Conversation, user_text: &str) -> Vec<Message> {
        let mut messages = Vec::with_capacity(conversation.len() + 2);
        messages.push(Message::system(self.settings.system_prompt.clone()));
        messages.extend(conversation.messages().iter().cloned());
        messages.push(Message::user(user_text));
        messages
    }

    fn request_body(&self, messages: &[Message]) -> serde_json::Value {
        serde_json::json!({
            "model": self.settings.model,
            "temperature": self.settings.temperature,
            "stream": true,
            "messages": messages,
        })
    }

    /// Start a streamed completion for `messages`.
    pub async fn stream(&self, messages: &[Message]) -> Result<EventStream, ProviderError> {
        let resp = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.settings.api_key)
            .json(&self.request_body(messages))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status.as_u16(), &body));
        }

        let byte_stream = resp.bytes_stream();

        let out = async_stream::try_stream! {
            let mut buf = Vec::<u8>::new();

            futures::pin_mut!(byte_stream);
            while let Some(chunk) = byte_stream.next().await {
                let chunk = chunk?;
                buf.extend_from_slice(&chunk);

                while let Some(pos) = find_double_newline(&buf) {
                    let frame = buf.drain(..pos + 2).collect::<Vec<_>>();
                    for event in decode_frame(&String::from_utf8_lossy(&frame))? {
                        yield event;
                    }
                }
            }

            // A final frame without the trailing blank line.
            if !buf.is_empty() {
                for event in decode_frame(&String::from_utf8_lossy(&buf))? {
                    yield event;
                }
            }
        };

        Ok(Box::pin(out))
    }
}

#[async_trait::async_trait]
impl ReplyGenerator for ChatCompletionsDriver {
    async fn generate_reply(
        &self,
        conversation: &Conversation,
        user_text: &str,
    ) -> Result<String, ProviderError> {
        let messages = self.build_messages(conversation, user_text);

        tracing::debug!(
            model = %self.settings.model,
            message_count = messages.len(),
            "Requesting completion"
        );

        let mut stream = self.stream(&messages).await?;
        let mut content = String::new();

        while let Some(event) = stream.next().await {
            match event? {
                StreamEvent::MessageDelta { text } => content.push_str(&text),
                StreamEvent::Finished { reason } => {
                    if reason == "length" {
                        tracing::warn!(
                            model = %self.settings.model,
                            "Completion truncated by the token limit"
                        );
                    }
                }
                StreamEvent::Done => break,
            }
        }

        if content.trim().is_empty() {
            return Err(ProviderError::EmptyReply);
        }

        tracing::debug!(content_length = content.len(), "Completion finished");
        Ok(content)
    }
}

/// Decode one SSE frame into stream events.
fn decode_frame(frame: &str) -> Result<Vec<StreamEvent>, ProviderError> {
    let mut events = Vec::new();

    for line in frame.lines() {
        let line = line.trim();
        let Some(data) = line.strip_prefix("data:") else {
            continue;
        };
        let data = data.trim();

        if data == "[DONE]" {
            events.push(StreamEvent::Done);
            continue;
        }

        let v: serde_json::Value = serde_json::from_str(data)?;

        if let Some(message) = v.get("error").map(error_message) {
            return Err(ProviderError::Api(message));
        }

        let choice = &v["choices"][0];

        if let Some(text) = choice["delta"].get("content").and_then(|x| x.as_str())
            && !text.is_empty()
        {
            events.push(StreamEvent::MessageDelta {
                text: text.to_string(),
            });
        }

        if let Some(reason) = choice.get("finish_reason").and_then(|x| x.as_str()) {
            events.push(StreamEvent::Finished {
                reason: reason.to_string(),
            });
        }
    }

    Ok(events)
}

/// Pull a readable message out of a provider `error` object.
fn error_message(error: &serde_json::Value) -> String {
    error
        .get("message")
        .and_then(|m| m.as_str())
        .or_else(|| error.as_str())
        .map_or_else(|| error.to_string(), ToString::to_string)
}

impl ProviderError {
    /// Classify a non-success HTTP response from the provider.
    pub(crate) fn from_status(status: u16, body: &str) -> Self {
        match status {
            401 | 403 => Self::Auth { status },
            429 => Self::RateLimited,
            _ => {
                let message = serde_json::from_str::<serde_json::Value>(body)
                    .ok()
                    .and_then(|v| v.get("error").map(error_message))
                    .unwrap_or_else(|| body.chars().take(MAX_ERROR_BODY).collect());
                Self::Status { status, message }
            }
        }
    }
}

/// Find the position of a double newline in the buffer.
fn find_double_newline(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\n\n")
}
