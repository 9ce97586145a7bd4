//! One assistant conversation turn.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::assistants::{
    Assistant, AssistantTool, AssistantsApi, CreateAssistantRequest, MessageRole, Run, RunStep,
    Thread,
};
use crate::error::{AppError, Result};
use crate::tools::{ToolDispatcher, ToolRegistry};

use super::poller::{PollPolicy, RunPoller};
use super::session::SessionIds;

/// Default model for newly created assistants.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo-16k";

/// Settings shared by all conversations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSettings {
    /// Model used when an assistant has to be created.
    pub model: String,
    /// Run polling schedule.
    pub poll: PollPolicy,
}

impl Default for ConversationSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            poll: PollPolicy::default(),
        }
    }
}

/// Drives an assistant/thread pair through one user turn.
///
/// The manager starts from the identifiers in a [`SessionIds`], creates what
/// is missing, and exposes the updated identifiers through
/// [`ConversationManager::session`] so the caller can store them back.
pub struct ConversationManager {
    api: Arc<dyn AssistantsApi>,
    tools: ToolRegistry,
    settings: ConversationSettings,
    session: SessionIds,
    assistant: Option<Assistant>,
    thread: Option<Thread>,
    run: Option<Run>,
    summary: String,
}

impl std::fmt::Debug for ConversationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationManager")
            .field("session", &self.session)
            .field("run", &self.run.as_ref().map(|r| &r.id))
            .field("tools", &self.tools)
            .finish_non_exhaustive()
    }
}

impl ConversationManager {
    /// Load the assistant and thread named by `session`.
    ///
    /// Unset ids are skipped. An id the service reports as not found (404)
    /// does not fail the turn: it is cleared, so the following
    /// `create_assistant`/`create_thread` call makes a fresh resource. Any
    /// other lookup failure is returned.
    pub async fn create(
        api: Arc<dyn AssistantsApi>,
        tools: ToolRegistry,
        settings: ConversationSettings,
        session: SessionIds,
    ) -> Result<Self> {
        tracing::info!(name: "conversation.init", session = ?session, "Initializing conversation");

        let mut manager = Self {
            api,
            tools,
            settings,
            session,
            assistant: None,
            thread: None,
            run: None,
            summary: String::new(),
        };

        if let Some(id) = manager.session.assistant_id.clone() {
            match manager.api.retrieve_assistant(&id).await {
                Ok(assistant) => manager.assistant = Some(assistant),
                Err(e) if e.is_not_found() => {
                    tracing::warn!(name: "conversation.assistant.missing", assistant_id = %id, "Configured assistant not found");
                    manager.session.assistant_id = None;
                }
                Err(e) => return Err(e),
            }
        }

        if let Some(id) = manager.session.thread_id.clone() {
            match manager.api.retrieve_thread(&id).await {
                Ok(thread) => manager.thread = Some(thread),
                Err(e) if e.is_not_found() => {
                    tracing::warn!(name: "conversation.thread.missing", thread_id = %id, "Configured thread not found");
                    manager.session.thread_id = None;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(manager)
    }

    /// Create the assistant unless one is already loaded.
    pub async fn create_assistant(
        &mut self,
        name: &str,
        instructions: &str,
        tools: Vec<AssistantTool>,
    ) -> Result<()> {
        if self.assistant.is_some() {
            return Ok(());
        }

        let assistant = self
            .api
            .create_assistant(CreateAssistantRequest {
                name: name.to_string(),
                instructions: instructions.to_string(),
                tools,
                model: self.settings.model.clone(),
            })
            .await?;

        tracing::info!(name: "conversation.assistant.created", assistant_id = %assistant.id, "Assistant created");
        self.session.assistant_id = Some(assistant.id.clone());
        self.assistant = Some(assistant);
        Ok(())
    }

    /// Create the thread unless one is already loaded.
    pub async fn create_thread(&mut self) -> Result<()> {
        if self.thread.is_some() {
            return Ok(());
        }

        let thread = self.api.create_thread().await?;
        tracing::info!(name: "conversation.thread.created", thread_id = %thread.id, "Thread created");
        self.session.thread_id = Some(thread.id.clone());
        self.thread = Some(thread);
        Ok(())
    }

    pub async fn add_message(&self, role: MessageRole, content: &str) -> Result<()> {
        let thread = self.thread.as_ref().ok_or(AppError::NotInitialized("thread"))?;
        self.api.create_message(&thread.id, role, content).await?;
        tracing::debug!(thread_id = %thread.id, role = role.as_str(), "Message added");
        Ok(())
    }

    /// Start a run of the assistant on the thread.
    pub async fn run_assistant(&mut self, instructions: &str) -> Result<()> {
        let (Some(thread), Some(assistant)) = (&self.thread, &self.assistant) else {
            return Err(AppError::NotInitialized("thread or assistant"));
        };

        let run = self
            .api
            .create_run(&thread.id, &assistant.id, instructions)
            .await?;
        tracing::info!(name: "conversation.run.created", run_id = %run.id, thread_id = %thread.id, "Run started");
        self.run = Some(run);
        Ok(())
    }

    /// Block until the current run completes, answering its tool calls.
    pub async fn wait_for_run_completion(&mut self, cancel: &CancellationToken) -> Result<()> {
        let (Some(thread), Some(run)) = (&self.thread, &self.run) else {
            return Err(AppError::NotInitialized("run"));
        };

        let dispatcher = ToolDispatcher::new(&self.tools, self.api.as_ref());
        let poller = RunPoller::new(self.api.as_ref(), self.settings.poll);
        let completed = poller.wait(&thread.id, &run.id, &dispatcher, cancel).await?;

        self.run = Some(completed);
        Ok(())
    }

    /// Store the text of the newest thread message as the summary.
    pub async fn process_message(&mut self) -> Result<()> {
        let thread = self.thread.as_ref().ok_or(AppError::NotInitialized("thread"))?;

        let messages = self.api.list_messages(&thread.id, 1).await?;
        let Some(message) = messages.first() else {
            return Err(AppError::EmptyThread(thread.id.clone()));
        };
        let Some(text) = message.text() else {
            return Err(AppError::EmptyThread(thread.id.clone()));
        };

        tracing::info!(
            name: "conversation.reply",
            role = message.role.as_str(),
            reply_length = text.len(),
            "Reply received"
        );
        self.summary = text.to_string();
        Ok(())
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Steps (message creation, tool calls) taken by the current run.
    pub async fn run_steps(&self) -> Result<Vec<RunStep>> {
        let (Some(thread), Some(run)) = (&self.thread, &self.run) else {
            return Err(AppError::NotInitialized("run"));
        };
        self.api.list_run_steps(&thread.id, &run.id).await
    }

    /// Identifiers to reuse on the next turn.
    pub fn session(&self) -> &SessionIds {
        &self.session
    }

    pub fn assistant(&self) -> Option<&Assistant> {
        self.assistant.as_ref()
    }

    pub fn thread(&self) -> Option<&Thread> {
        self.thread.as_ref()
    }

    pub fn run(&self) -> Option<&Run> {
        self.run.as_ref()
    }
}
