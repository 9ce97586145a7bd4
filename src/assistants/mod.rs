//! Remote assistant service access.
//!
//! The [`AssistantsApi`] trait covers the operations this service needs from
//! the `OpenAI` Assistants API: assistants, threads, messages, runs, tool
//! output submission and run steps. [`OpenAiAssistants`] implements it over
//! HTTP.

pub mod client;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use client::OpenAiAssistants;
pub use types::{
    Assistant, AssistantTool, CreateAssistantRequest, FunctionDefinition, MessageRole, Run,
    RunStatus, RunStep, Thread, ThreadMessage, ToolCall, ToolCallFunction, ToolOutput,
};

use crate::error::Result;

/// Operations of the remote assistant service.
#[async_trait::async_trait]
pub trait AssistantsApi: Send + Sync {
    /// Retrieve an assistant by id.
    async fn retrieve_assistant(&self, assistant_id: &str) -> Result<Assistant>;

    /// Create an assistant.
    async fn create_assistant(&self, req: CreateAssistantRequest) -> Result<Assistant>;

    /// Retrieve a thread by id.
    async fn retrieve_thread(&self, thread_id: &str) -> Result<Thread>;

    /// Create an empty thread.
    async fn create_thread(&self) -> Result<Thread>;

    /// Append a message to a thread.
    async fn create_message(
        &self,
        thread_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<ThreadMessage>;

    /// List messages of a thread, newest first.
    async fn list_messages(&self, thread_id: &str, limit: u32) -> Result<Vec<ThreadMessage>>;

    /// Start a run of `assistant_id` on a thread.
    async fn create_run(
        &self,
        thread_id: &str,
        assistant_id: &str,
        instructions: &str,
    ) -> Result<Run>;

    /// Retrieve the current state of a run.
    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run>;

    /// Report tool outputs to a run waiting in `requires_action`.
    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: Vec<ToolOutput>,
    ) -> Result<Run>;

    /// List the steps a run has taken.
    async fn list_run_steps(&self, thread_id: &str, run_id: &str) -> Result<Vec<RunStep>>;
}
