//! HTTP client for the `OpenAI` Assistants API (v2).

use serde::de::DeserializeOwned;
use serde_json::json;
use url::Url;

use crate::error::{AppError, Result};

use super::types::ListResponse;
use super::{
    Assistant, AssistantsApi, CreateAssistantRequest, MessageRole, Run, RunStep, Thread,
    ThreadMessage, ToolOutput,
};

/// Beta header value selecting the v2 Assistants API.
const ASSISTANTS_BETA: &str = "assistants=v2";

/// Assistants API client over `reqwest`.
#[derive(Clone)]
pub struct OpenAiAssistants {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl std::fmt::Debug for OpenAiAssistants {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiAssistants")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl OpenAiAssistants {
    /// Create a client for the service at `base_url` (e.g. `https://api.openai.com`).
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self> {
        Self::with_client(base_url, api_key, reqwest::Client::new())
    }

    /// Create a client sharing an existing `reqwest` client.
    pub fn with_client(
        base_url: &str,
        api_key: impl Into<String>,
        http: reqwest::Client,
    ) -> Result<Self> {
        Ok(Self {
            http,
            base_url: Url::parse(base_url)?,
            api_key: api_key.into(),
        })
    }

    fn url(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    fn get(&self, url: Url) -> reqwest::RequestBuilder {
        self.http
            .get(url)
            .bearer_auth(&self.api_key)
            .header("OpenAI-Beta", ASSISTANTS_BETA)
    }

    fn post(&self, url: Url) -> reqwest::RequestBuilder {
        self.http
            .post(url)
            .bearer_auth(&self.api_key)
            .header("OpenAI-Beta", ASSISTANTS_BETA)
    }

    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".into());
            Err(AppError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[async_trait::async_trait]
impl AssistantsApi for OpenAiAssistants {
    async fn retrieve_assistant(&self, assistant_id: &str) -> Result<Assistant> {
        let url = self.url(&format!("/v1/assistants/{assistant_id}"))?;
        let response = self.get(url).send().await?;
        Self::handle_response(response).await
    }

    async fn create_assistant(&self, req: CreateAssistantRequest) -> Result<Assistant> {
        let url = self.url("/v1/assistants")?;
        let response = self.post(url).json(&req).send().await?;
        Self::handle_response(response).await
    }

    async fn retrieve_thread(&self, thread_id: &str) -> Result<Thread> {
        let url = self.url(&format!("/v1/threads/{thread_id}"))?;
        let response = self.get(url).send().await?;
        Self::handle_response(response).await
    }

    async fn create_thread(&self) -> Result<Thread> {
        let url = self.url("/v1/threads")?;
        let response = self.post(url).json(&json!({})).send().await?;
        Self::handle_response(response).await
    }

    async fn create_message(
        &self,
        thread_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<ThreadMessage> {
        let url = self.url(&format!("/v1/threads/{thread_id}/messages"))?;
        let body = json!({ "role": role, "content": content });
        let response = self.post(url).json(&body).send().await?;
        Self::handle_response(response).await
    }

    async fn list_messages(&self, thread_id: &str, limit: u32) -> Result<Vec<ThreadMessage>> {
        let mut url = self.url(&format!("/v1/threads/{thread_id}/messages"))?;
        url.query_pairs_mut()
            .append_pair("order", "desc")
            .append_pair("limit", &limit.to_string());
        let response = self.get(url).send().await?;
        let page: ListResponse<ThreadMessage> = Self::handle_response(response).await?;
        Ok(page.data)
    }

    async fn create_run(
        &self,
        thread_id: &str,
        assistant_id: &str,
        instructions: &str,
    ) -> Result<Run> {
        let url = self.url(&format!("/v1/threads/{thread_id}/runs"))?;
        let body = json!({ "assistant_id": assistant_id, "instructions": instructions });
        let response = self.post(url).json(&body).send().await?;
        Self::handle_response(response).await
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        let url = self.url(&format!("/v1/threads/{thread_id}/runs/{run_id}"))?;
        let response = self.get(url).send().await?;
        Self::handle_response(response).await
    }

    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: Vec<ToolOutput>,
    ) -> Result<Run> {
        let url = self.url(&format!(
            "/v1/threads/{thread_id}/runs/{run_id}/submit_tool_outputs"
        ))?;
        let body = json!({ "tool_outputs": outputs });
        let response = self.post(url).json(&body).send().await?;
        Self::handle_response(response).await
    }

    async fn list_run_steps(&self, thread_id: &str, run_id: &str) -> Result<Vec<RunStep>> {
        let url = self.url(&format!("/v1/threads/{thread_id}/runs/{run_id}/steps"))?;
        let response = self.get(url).send().await?;
        let page: ListResponse<RunStep> = Self::handle_response(response).await?;
        Ok(page.data)
    }
}
