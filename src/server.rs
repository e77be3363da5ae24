use std::sync::Arc;
use std::time::Duration;

use axum::{
    Form, Json, Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::AppState;
use crate::chat;
use crate::config::AppConfig;
use crate::error::{AppError, TurnError};
use crate::llm::{ChatCompletionsDriver, LlmSettings, ReplyGenerator};
use crate::session::{SharedStore, StoreView, Workspaces};
use crate::ui;

/// Cookie carrying the client id.
pub const CLIENT_COOKIE: &str = "tennis_client";

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>, settings: LlmSettings) -> anyhow::Result<()> {
    info!(
        name: "llm.config.loaded",
        base_url = %settings.base_url,
        model = %settings.model,
        "LLM configuration loaded"
    );

    let generator: Arc<dyn ReplyGenerator> = Arc::new(ChatCompletionsDriver::new(settings));
    let state = AppState::new(generator, Arc::clone(&config));

    spawn_idle_pruner(
        state.workspaces.clone(),
        config.chat.idle_timeout(),
        config.chat.prune_interval(),
    );

    let app = router(state);

    let addr = config.server.address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let timeout_duration = state.config.server.request_timeout();

    Router::new()
        .route("/", get(index_handler))
        .route("/chats/new", post(new_chat))
        .route("/chats/select", post(select_chat))
        .route("/chats/delete", post(delete_chat))
        .route("/messages", post(post_message))
        .route("/api/sessions", get(api_list_sessions))
        .route("/api/messages", post(api_send_message))
        .nest_service("/static", ServeDir::new("static"))
        .layer(axum::middleware::from_fn(
            move |req: Request, next: Next| async move {
                match tokio::time::timeout(timeout_duration, next.run(req)).await {
                    Ok(res) => res,
                    Err(_) => (StatusCode::REQUEST_TIMEOUT, "Request timed out").into_response(),
                }
            },
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Periodically drop the chats of browsers that went away.
fn spawn_idle_pruner(workspaces: Workspaces, idle_timeout: Duration, every: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            let removed = workspaces.prune_idle(idle_timeout);
            if removed > 0 {
                info!(
                    name: "workspace.pruned",
                    removed = removed,
                    remaining = workspaces.len(),
                    "Pruned idle workspaces"
                );
            }
        }
    });
}

/// Resolve the caller's store, issuing a client cookie when needed.
fn workspace(state: &AppState, jar: CookieJar) -> (CookieJar, SharedStore) {
    let existing = jar.get(CLIENT_COOKIE).map(|c| c.value().to_string());
    let (client_id, store) = state.workspaces.open_or_create(existing.as_deref());

    if existing.as_deref() == Some(client_id.as_str()) {
        return (jar, store);
    }

    let cookie = Cookie::build((CLIENT_COOKIE, client_id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    (jar.add(cookie), store)
}

/// Snapshot the store after making sure the selection resolves.
async fn current_view(store: &SharedStore) -> StoreView {
    let mut store = store.lock().await;
    store.ensure_placeholder();
    store.view()
}

// ─────────────────────────────────────────────────────────────────────────────
// HTML Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET / - Render the chat page.
async fn index_handler(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let (jar, store) = workspace(&state, jar);
    let view = current_view(&store).await;
    (jar, Html(ui::render_page(&view, None)))
}

/// POST /chats/new - Switch to the placeholder chat.
async fn new_chat(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let (jar, store) = workspace(&state, jar);
    store.lock().await.new_chat();
    (jar, Redirect::to("/"))
}

#[derive(Debug, Deserialize)]
struct SelectForm {
    key: String,
}

/// POST /chats/select - Switch to an existing chat.
async fn select_chat(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<SelectForm>,
) -> Response {
    let (jar, store) = workspace(&state, jar);
    if !store.lock().await.select(&form.key) {
        tracing::debug!(session = %form.key, "Select for unknown chat");
        return (jar, AppError::UnknownSession(form.key)).into_response();
    }
    (jar, Redirect::to("/")).into_response()
}

#[derive(Debug, Deserialize)]
struct DeleteForm {
    /// Defaults to the active chat.
    #[serde(default)]
    key: Option<String>,
}

/// POST /chats/delete - Delete a chat.
async fn delete_chat(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<DeleteForm>,
) -> impl IntoResponse {
    let (jar, store) = workspace(&state, jar);
    {
        let mut store = store.lock().await;
        let key = form
            .key
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| store.active_key().to_string());
        store.delete(&key);
    }
    (jar, Redirect::to("/"))
}

#[derive(Debug, Deserialize)]
struct MessageForm {
    #[serde(default)]
    text: String,
}

/// POST /messages - Send a message from the page form.
async fn post_message(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<MessageForm>,
) -> Response {
    let (jar, store) = workspace(&state, jar);
    let mut store = store.lock().await;

    match chat::send_message(&mut store, state.generator.as_ref(), &form.text).await {
        Ok(_) => (jar, Redirect::to("/")).into_response(),
        Err(err) => {
            store.ensure_placeholder();
            let view = store.view();
            let notice = match &err {
                TurnError::EmptyMessage => "Please type a message first.".to_string(),
                TurnError::Provider(e) => format!("Sorry, I couldn't get a reply: {e}"),
            };
            let status = AppError::from(err).status();
            (status, jar, Html(ui::render_page(&view, Some(&notice)))).into_response()
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// JSON API Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET /api/sessions - Snapshot of the caller's chats.
async fn api_list_sessions(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let (jar, store) = workspace(&state, jar);
    let view = current_view(&store).await;
    (jar, Json(view))
}

/// Request body for the message API.
#[derive(Debug, Deserialize)]
struct ApiMessageRequest {
    text: String,
}

/// POST /api/messages - Send a message and get the reply as JSON.
async fn api_send_message(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<ApiMessageRequest>,
) -> Response {
    let (jar, store) = workspace(&state, jar);
    let mut store = store.lock().await;

    match chat::send_message(&mut store, state.generator.as_ref(), &req.text).await {
        Ok(outcome) => (jar, Json(outcome)).into_response(),
        Err(err) => (jar, AppError::from(err)).into_response(),
    }
}
