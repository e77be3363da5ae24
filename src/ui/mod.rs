//! Server-rendered HTML.
//!
//! Plain forms posting back to the server; every action re-renders the
//! whole page from a [`StoreView`](crate::session::StoreView).

mod markdown;
mod page;

pub use markdown::render_markdown;
pub use page::render_page;
