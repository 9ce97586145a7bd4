//! Scripted in-memory assistant service for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::error::{AppError, Result};

use super::types::{MessageContent, RequiredAction, SubmitToolOutputs, TextContent};
use super::{
    Assistant, AssistantsApi, CreateAssistantRequest, MessageRole, Run, RunStatus, RunStep,
    Thread, ThreadMessage, ToolCall, ToolOutput,
};

pub(crate) fn run(status: RunStatus) -> Run {
    Run {
        id: "run_1".to_string(),
        thread_id: None,
        status,
        required_action: None,
        last_error: None,
        created_at: Some(1_700_000_000),
        completed_at: None,
    }
}

pub(crate) fn run_requiring(calls: Vec<ToolCall>) -> Run {
    Run {
        required_action: Some(RequiredAction {
            action_type: "submit_tool_outputs".to_string(),
            submit_tool_outputs: Some(SubmitToolOutputs { tool_calls: calls }),
        }),
        ..run(RunStatus::RequiresAction)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Submission {
    pub thread_id: String,
    pub run_id: String,
    pub outputs: Vec<ToolOutput>,
}

#[derive(Debug, Default)]
struct Inner {
    assistants: HashMap<String, Assistant>,
    threads: HashMap<String, Vec<ThreadMessage>>,
    script: VecDeque<Run>,
    last: Option<Run>,
    reply: Option<String>,
    submissions: Vec<Submission>,
    created_assistants: Vec<CreateAssistantRequest>,
    created_threads: usize,
    run_instructions: Vec<String>,
    retrievals: usize,
    fail_status: Option<u16>,
}

/// Fake service whose run statuses follow a fixed script.
#[derive(Debug, Default)]
pub(crate) struct ScriptedAssistants {
    inner: Mutex<Inner>,
}

impl ScriptedAssistants {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_assistant(self, id: &str) -> Self {
        self.inner.lock().unwrap().assistants.insert(
            id.to_string(),
            Assistant {
                id: id.to_string(),
                name: Some("News Summarizer".to_string()),
                model: None,
            },
        );
        self
    }

    pub fn with_thread(self, id: &str) -> Self {
        self.inner
            .lock()
            .unwrap()
            .threads
            .insert(id.to_string(), Vec::new());
        self
    }

    pub fn with_script(self, runs: Vec<Run>) -> Self {
        self.inner.lock().unwrap().script = runs.into();
        self
    }

    /// Assistant message appended to the thread once the run completes.
    pub fn with_reply(self, text: &str) -> Self {
        self.inner.lock().unwrap().reply = Some(text.to_string());
        self
    }

    /// Every call answers with this HTTP status.
    pub fn failing_with(self, status: u16) -> Self {
        self.inner.lock().unwrap().fail_status = Some(status);
        self
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.inner.lock().unwrap().submissions.clone()
    }

    pub fn created_assistants(&self) -> Vec<CreateAssistantRequest> {
        self.inner.lock().unwrap().created_assistants.clone()
    }

    pub fn created_threads(&self) -> usize {
        self.inner.lock().unwrap().created_threads
    }

    pub fn run_instructions(&self) -> Vec<String> {
        self.inner.lock().unwrap().run_instructions.clone()
    }

    pub fn retrievals(&self) -> usize {
        self.inner.lock().unwrap().retrievals
    }

    pub fn messages(&self, thread_id: &str) -> Vec<ThreadMessage> {
        self.inner
            .lock()
            .unwrap()
            .threads
            .get(thread_id)
            .cloned()
            .unwrap_or_default()
    }

    fn check(inner: &Inner) -> Result<()> {
        match inner.fail_status {
            Some(status) => Err(AppError::Api {
                status,
                message: "scripted failure".to_string(),
            }),
            None => Ok(()),
        }
    }
}

fn not_found(what: &str, id: &str) -> AppError {
    AppError::Api {
        status: 404,
        message: format!("No {what} found with id '{id}'."),
    }
}

fn text_message(id: String, role: MessageRole, text: &str) -> ThreadMessage {
    ThreadMessage {
        id,
        role,
        content: vec![MessageContent::Text {
            text: TextContent {
                value: text.to_string(),
                annotations: Vec::new(),
            },
        }],
    }
}

#[async_trait::async_trait]
impl AssistantsApi for ScriptedAssistants {
    async fn retrieve_assistant(&self, assistant_id: &str) -> Result<Assistant> {
        let inner = self.inner.lock().unwrap();
        Self::check(&inner)?;
        inner
            .assistants
            .get(assistant_id)
            .cloned()
            .ok_or_else(|| not_found("assistant", assistant_id))
    }

    async fn create_assistant(&self, req: CreateAssistantRequest) -> Result<Assistant> {
        let mut inner = self.inner.lock().unwrap();
        Self::check(&inner)?;
        let id = format!("asst_{}", inner.created_assistants.len() + 1);
        let assistant = Assistant {
            id: id.clone(),
            name: Some(req.name.clone()),
            model: Some(req.model.clone()),
        };
        inner.created_assistants.push(req);
        inner.assistants.insert(id, assistant.clone());
        Ok(assistant)
    }

    async fn retrieve_thread(&self, thread_id: &str) -> Result<Thread> {
        let inner = self.inner.lock().unwrap();
        Self::check(&inner)?;
        if inner.threads.contains_key(thread_id) {
            Ok(Thread {
                id: thread_id.to_string(),
            })
        } else {
            Err(not_found("thread", thread_id))
        }
    }

    async fn create_thread(&self) -> Result<Thread> {
        let mut inner = self.inner.lock().unwrap();
        Self::check(&inner)?;
        inner.created_threads += 1;
        let id = format!("thread_{}", inner.created_threads);
        inner.threads.insert(id.clone(), Vec::new());
        Ok(Thread { id })
    }

    async fn create_message(
        &self,
        thread_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<ThreadMessage> {
        let mut inner = self.inner.lock().unwrap();
        Self::check(&inner)?;
        let messages = inner
            .threads
            .get_mut(thread_id)
            .ok_or_else(|| not_found("thread", thread_id))?;
        let message = text_message(format!("msg_{}", messages.len() + 1), role, content);
        messages.push(message.clone());
        Ok(message)
    }

    async fn list_messages(&self, thread_id: &str, limit: u32) -> Result<Vec<ThreadMessage>> {
        let inner = self.inner.lock().unwrap();
        Self::check(&inner)?;
        let messages = inner
            .threads
            .get(thread_id)
            .ok_or_else(|| not_found("thread", thread_id))?;
        Ok(messages.iter().rev().take(limit as usize).cloned().collect())
    }

    async fn create_run(
        &self,
        thread_id: &str,
        _assistant_id: &str,
        instructions: &str,
    ) -> Result<Run> {
        let mut inner = self.inner.lock().unwrap();
        Self::check(&inner)?;
        if !inner.threads.contains_key(thread_id) {
            return Err(not_found("thread", thread_id));
        }
        inner.run_instructions.push(instructions.to_string());
        Ok(run(RunStatus::Queued))
    }

    async fn retrieve_run(&self, thread_id: &str, _run_id: &str) -> Result<Run> {
        let mut inner = self.inner.lock().unwrap();
        Self::check(&inner)?;
        inner.retrievals += 1;
        let next = match inner.script.pop_front() {
            Some(run) => run,
            None => inner
                .last
                .clone()
                .unwrap_or_else(|| run(RunStatus::InProgress)),
        };
        if next.status == RunStatus::Completed && inner.last.as_ref() != Some(&next) {
            if let Some(reply) = inner.reply.clone() {
                if let Some(messages) = inner.threads.get_mut(thread_id) {
                    let id = format!("msg_{}", messages.len() + 1);
                    messages.push(text_message(id, MessageRole::Assistant, &reply));
                }
            }
        }
        inner.last = Some(next.clone());
        Ok(next)
    }

    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: Vec<ToolOutput>,
    ) -> Result<Run> {
        let mut inner = self.inner.lock().unwrap();
        Self::check(&inner)?;
        inner.submissions.push(Submission {
            thread_id: thread_id.to_string(),
            run_id: run_id.to_string(),
            outputs,
        });
        Ok(run(RunStatus::Queued))
    }

    async fn list_run_steps(&self, _thread_id: &str, run_id: &str) -> Result<Vec<RunStep>> {
        let inner = self.inner.lock().unwrap();
        Self::check(&inner)?;
        Ok(vec![
            RunStep {
                id: "step_1".to_string(),
                step_type: "tool_calls".to_string(),
                status: "completed".to_string(),
                step_details: serde_json::json!({ "run_id": run_id }),
            },
            RunStep {
                id: "step_2".to_string(),
                step_type: "message_creation".to_string(),
                status: "completed".to_string(),
                step_details: serde_json::Value::Null,
            },
        ])
    }
}
