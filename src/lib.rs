//! Virtual Tennis Assistant
//!
//! A single-page chat UI that forwards user messages to a hosted LLM and
//! keeps several named chat threads per browser.
//!
//! # Architecture
//!
//! - **Server**: Axum HTTP server rendering HTML with plain form posts
//! - **Sessions**: per-browser chat threads with auto-naming
//! - **LLM**: `OpenAI` Chat Completions driver behind a `ReplyGenerator` trait
//!
//! # Modules
//!
//! - [`chat`]: the user-message / reply / rename sequence
//! - [`config`]: layered configuration and credentials
//! - [`llm`]: reply generation
//! - [`session`]: chat thread lifecycle
//! - [`server`]: routes and handlers
//! - [`ui`]: HTML rendering

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::unused_async)]

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
pub mod server;
pub mod session;
pub mod ui;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::llm::ReplyGenerator;
use crate::session::Workspaces;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Produces assistant replies.
    pub generator: Arc<dyn ReplyGenerator>,
    /// Chat stores, one per browser.
    pub workspaces: Workspaces,
    /// Global Configuration
    pub config: Arc<AppConfig>,
}

impl AppState {
    #[must_use]
    pub fn new(generator: Arc<dyn ReplyGenerator>, config: Arc<AppConfig>) -> Self {
        Self {
            generator,
            workspaces: Workspaces::new(),
            config,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("workspaces", &self.workspaces.len())
            .field("config", &self.config)
            .finish()
    }
}
