use std::sync::Arc;

use axum::{
    Form, Router,
    extract::State,
    response::Html,
    routing::{get, post},
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::{Instrument, info};
use uuid::Uuid;

use crate::AppState;
use crate::assistants::{MessageRole, OpenAiAssistants};
use crate::config::AppConfig;
use crate::conversation::{ConversationManager, SessionStore};
use crate::error::Result;
use crate::news::NewsClient;
use crate::tools::{GetNewsTool, ToolRegistry};

/// Name given to a newly created assistant.
pub const ASSISTANT_NAME: &str = "News Summarizer";

/// Instructions given to a newly created assistant.
pub const ASSISTANT_INSTRUCTIONS: &str = "You are a personal article summarizer Assistant who knows how to take a list of article's titles and descriptions and then write a short summary of all the news articles";

/// Per-run instructions.
pub const RUN_INSTRUCTIONS: &str =
    "Please call the getNews function to get the list of articles/news for the given topic";

/// Build the application state from configuration.
pub fn build_state(config: Arc<AppConfig>) -> Result<AppState> {
    let http = reqwest::Client::new();

    let assistants = OpenAiAssistants::with_client(
        &config.assistant.base_url,
        config.assistant.api_key.clone(),
        http.clone(),
    )?;
    let news = NewsClient::with_client(&config.news.base_url, config.news.api_key.clone(), http)?
        .page_size(config.news.page_size);
    let tools = ToolRegistry::new().with_tool(Arc::new(GetNewsTool::new(news)));

    Ok(AppState {
        assistants: Arc::new(assistants),
        tools,
        sessions: SessionStore::new(config.session_ids()),
        settings: config.conversation_settings(),
        shutdown: tokio_util::sync::CancellationToken::new(),
    })
}

/// Routes of the web form.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/submit", post(submit_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    info!(
        name: "assistant.config.loaded",
        base_url = %config.assistant.base_url,
        model = %config.assistant.model,
        poll_interval_secs = config.polling.interval_secs,
        run_timeout_secs = config.polling.timeout_secs,
        "Assistant configuration loaded"
    );

    let state = build_state(Arc::clone(&config))?;
    for name in state.tools.names() {
        info!(name: "tool.registered", tool = %name, "Tool registered");
    }
    let shutdown = state.shutdown.clone();
    let app = router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!(name: "server.shutdown", "Shutdown requested");
            shutdown.cancel();
        })
        .await?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// HTML Page Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Generate the HTML shell for a page.
fn html_shell(content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <link href="https://cdn.jsdelivr.net/npm/bootstrap@5.3.3/dist/css/bootstrap.min.css" rel="stylesheet" integrity="sha384-QWTKZyjpPEjISv5WaRU9OFeRpok6YctnYmDr5pNlyT2bRjXh0JMhjY6hW+ALEwIH" crossorigin="anonymous">
    <title>OpenAI Assistant API</title>
</head>
<body>
    <div class="container mt-5">
        {content}
    </div>
</body>
</html>"#
    )
}

/// Escape text for inclusion in HTML.
fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// GET / - Topic form.
async fn index_handler() -> Html<String> {
    Html(html_shell(
        r#"<h1>Submit Your Information</h1>
        <form action="/submit" method="POST" class="mt-3">
            <div class="mb-3">
                <label for="topic" class="form-label">Enter Topic</label>
                <input type="text" id="topic" name="topic" class="form-control" required>
            </div>
            <button type="submit" class="btn btn-primary">Run Assistant</button>
        </form>"#,
    ))
}

/// Form body of `POST /submit`.
#[derive(Debug, Deserialize)]
struct TopicForm {
    topic: String,
}

/// POST /submit - Summarize the news on a topic.
async fn submit_handler(
    State(state): State<AppState>,
    Form(form): Form<TopicForm>,
) -> Result<Html<String>> {
    let request_id = Uuid::new_v4().to_string();
    let span = tracing::info_span!("submit", request_id = %request_id, topic = %form.topic);

    let summary = summarize_topic(&state, &form.topic).instrument(span).await?;

    Ok(Html(html_shell(&format!(
        "<h1>Thank you! You submitted: {}</h1>\n        <section>{}</section>",
        escape_html(&form.topic),
        escape_html(&summary)
    ))))
}

/// Run one assistant turn for `topic` and return the reply.
///
/// The session lock is held for the whole turn.
pub async fn summarize_topic(state: &AppState, topic: &str) -> Result<String> {
    let mut session = state.sessions.lock().await;

    let mut manager = ConversationManager::create(
        Arc::clone(&state.assistants),
        state.tools.clone(),
        state.settings.clone(),
        session.clone(),
    )
    .await?;

    let outcome = async {
        manager
            .create_assistant(
                ASSISTANT_NAME,
                ASSISTANT_INSTRUCTIONS,
                state.tools.assistant_tools(),
            )
            .await?;
        manager.create_thread().await?;
        manager
            .add_message(
                MessageRole::User,
                &format!("summarize the news on this topic {topic}?"),
            )
            .await?;
        manager.run_assistant(RUN_INSTRUCTIONS).await?;
        manager.wait_for_run_completion(&state.shutdown).await?;
        manager.process_message().await
    }
    .await;

    // Keep ids created before a failure.
    *session = manager.session().clone();
    outcome?;

    info!(name: "submit.completed", summary_length = manager.summary().len(), "Summary ready");
    Ok(manager.summary().to_string())
}
