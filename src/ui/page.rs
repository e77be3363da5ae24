//! The chat page.

use std::fmt::Write as _;

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::llm::{Message, MessageRole};
use crate::session::{SessionSummary, StoreView};

use super::markdown::render_markdown;

const APP_TITLE: &str = "Virtual Tennis Assistant";

/// Render the whole page for a store snapshot.
///
/// `error` is shown where the assistant reply would have gone.
#[must_use]
pub fn render_page(view: &StoreView, error: Option<&str>) -> String {
    let sidebar = sidebar(view);
    let transcript = transcript(&view.transcript, error);
    html_shell(&view.active_key, &sidebar, &transcript)
}

/// Generate the HTML shell for the application.
fn html_shell(current_chat: &str, sidebar: &str, transcript: &str) -> String {
    let current_chat = encode_text(current_chat);
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="description" content="Your AI-powered tennis companion">
    <title>🎾 {APP_TITLE} - {current_chat}</title>
    <link rel="stylesheet" href="/static/app.css">
</head>
<body>
    <div class="layout">
        <aside class="sidebar">
            {sidebar}
        </aside>
        <main class="chat">
            <header class="chat-header">
                <h1>🎾 {APP_TITLE}</h1>
                <p>Your AI-powered tennis companion — get match strategies, training tips, and motivation!</p>
            </header>
            <section id="transcript" class="transcript">
                {transcript}
            </section>
            {input}
        </main>
    </div>
</body>
</html>"#,
        input = input_form(),
    )
}

fn sidebar(view: &StoreView) -> String {
    let mut items = String::new();
    for summary in &view.sessions {
        items.push_str(&session_item(summary));
    }

    let active = encode_double_quoted_attribute(&view.active_key);
    let current = encode_text(&view.active_key);

    format!(
        r#"<h2>💬 Chat Sessions</h2>
            <form method="post" action="/chats/new">
                <button type="submit" class="button button-primary">➕ New Chat</button>
            </form>
            <p class="sidebar-label">Select a chat:</p>
            <ul class="session-list">{items}</ul>
            <form method="post" action="/chats/delete">
                <input type="hidden" name="key" value="{active}">
                <button type="submit" class="button button-danger">🗑️ Delete Selected Chat</button>
            </form>
            <hr>
            <p class="sidebar-info">Current Chat: {current}</p>"#
    )
}

fn session_item(summary: &SessionSummary) -> String {
    let class = if summary.active {
        "session session-active"
    } else {
        "session"
    };
    format!(
        r#"
                <li>
                    <form method="post" action="/chats/select">
                        <input type="hidden" name="key" value="{key}">
                        <button type="submit" class="{class}" title="{count} messages, started {started}">{label}</button>
                    </form>
                </li>"#,
        key = encode_double_quoted_attribute(&summary.key),
        count = summary.message_count,
        started = summary.created_at.format("%Y-%m-%d %H:%M UTC"),
        label = encode_text(&summary.key),
    )
}

fn transcript(messages: &[Message], error: Option<&str>) -> String {
    let mut out = String::new();
    for msg in messages {
        let role = msg.role.as_str();
        let avatar = if msg.role == MessageRole::User {
            "🧑"
        } else {
            "🎾"
        };
        let _ = write!(
            out,
            r#"
                <div class="message message-{role}">
                    <div class="avatar">{avatar}</div>
                    <div class="content">{body}</div>
                </div>"#,
            body = render_markdown(&msg.content),
        );
    }

    if let Some(error) = error {
        let _ = write!(
            out,
            r#"
                <div class="message message-assistant message-error" role="alert">
                    <div class="avatar">⚠️</div>
                    <div class="content"><p>{}</p></div>
                </div>"#,
            encode_text(error)
        );
    }
    out
}

fn input_form() -> &'static str {
    r#"<form class="chat-input" method="post" action="/messages"
                onsubmit="this.querySelector('button').disabled = true; this.querySelector('.busy').hidden = false;">
                <textarea name="text" rows="2" placeholder="Type your message here..." required autofocus></textarea>
                <button type="submit" class="button button-primary">Send</button>
                <p class="busy" hidden>Thinking... 🎾</p>
            </form>"#
}
