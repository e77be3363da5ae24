//! Chat session lifecycle.
//!
//! Every browser owns one [`SessionStore`]: an ordered set of named chat
//! threads plus the current selection. A fresh store holds a single
//! placeholder chat ("New Chat") greeting the user; the placeholder is
//! renamed from the first answered message and can be deleted like any
//! other chat.
//!
//! # Architecture
//!
//! - [`ChatSession`]: one thread, with its transcript and model conversation
//! - [`SessionStore`]: one user's threads and selection
//! - [`Workspaces`]: stores keyed by client id
//!
//! # Example
//!
//! ```rust
//! use tennis_assistant::session::{SessionStore, PLACEHOLDER_KEY};
//!
//! let mut store = SessionStore::init();
//! store.append_user_message(PLACEHOLDER_KEY, "quick serve practice today");
//!
//! let key = store.maybe_promote(PLACEHOLDER_KEY, "quick serve practice today");
//! assert_eq!(key.as_deref(), Some("💬 Quick serve practice..."));
//! assert!(!store.contains(PLACEHOLDER_KEY));
//! ```

mod registry;
mod store;
mod thread;
mod title;

pub use registry::{DEFAULT_IDLE_TIMEOUT, SharedStore, Workspaces};
pub use store::{SessionStore, SessionSummary, StoreView};
pub use thread::{ChatSession, Conversation, GREETING, PLACEHOLDER_KEY, PLACEHOLDER_TITLE};
pub use title::title_from;
