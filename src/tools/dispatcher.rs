//! Execution of run function calls.

use crate::assistants::{AssistantsApi, ToolCall, ToolOutput};
use crate::error::{AppError, Result};

use super::ToolRegistry;

/// Runs the pending function calls of a run against a [`ToolRegistry`] and
/// reports the outputs back in one batch.
#[derive(Clone, Copy)]
pub struct ToolDispatcher<'a> {
    registry: &'a ToolRegistry,
    api: &'a dyn AssistantsApi,
}

impl std::fmt::Debug for ToolDispatcher<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDispatcher")
            .field("registry", self.registry)
            .finish_non_exhaustive()
    }
}

impl<'a> ToolDispatcher<'a> {
    pub fn new(registry: &'a ToolRegistry, api: &'a dyn AssistantsApi) -> Self {
        Self { registry, api }
    }

    /// Execute every `function` call and collect one output per call.
    ///
    /// Fails on the first unknown function, malformed argument payload or
    /// handler error.
    pub async fn execute(&self, calls: &[ToolCall]) -> Result<Vec<ToolOutput>> {
        let mut outputs = Vec::with_capacity(calls.len());

        for call in calls.iter().filter(|c| c.call_type == "function") {
            let name = &call.function.name;
            let Some(tool) = self.registry.get(name) else {
                tracing::error!(name: "tool.unknown", tool_name = %name, tool_id = %call.id, "Unknown function");
                return Err(AppError::UnknownFunction(name.clone()));
            };

            let args: serde_json::Value = serde_json::from_str(&call.function.arguments)?;

            tracing::info!(name: "tool.call", tool_name = %name, tool_id = %call.id, "Executing tool call");
            tracing::debug!(tool_id = %call.id, arguments = %call.function.arguments, "Tool call arguments");

            let result = tool.call(args).await.map_err(|e| {
                tracing::error!(name: "tool.call.failed", tool_name = %name, tool_id = %call.id, error = %e, "Tool call failed");
                AppError::ToolExecution {
                    name: name.clone(),
                    message: e.to_string(),
                }
            })?;

            let output = serde_json::to_string(&result)?;
            tracing::info!(
                name: "tool.call.done",
                tool_name = %name,
                tool_id = %call.id,
                result_length = output.len(),
                "Tool call succeeded"
            );

            outputs.push(ToolOutput {
                tool_call_id: call.id.clone(),
                output,
            });
        }

        Ok(outputs)
    }

    /// Execute `calls` and submit their outputs to the run.
    ///
    /// Nothing is submitted when any call fails.
    pub async fn dispatch(
        &self,
        thread_id: &str,
        run_id: &str,
        calls: &[ToolCall],
    ) -> Result<usize> {
        let outputs = self.execute(calls).await?;
        let count = outputs.len();

        tracing::info!(
            name: "tool.outputs.submit",
            thread_id = %thread_id,
            run_id = %run_id,
            output_count = count,
            "Submitting tool outputs"
        );
        self.api
            .submit_tool_outputs(thread_id, run_id, outputs)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistants::testing::ScriptedAssistants;
    use crate::news::{NewsArticle, NewsClient};
    use crate::tools::{GET_NEWS, GetNewsTool, NativeTool};
    use async_trait::async_trait;
    use axum::{Json, Router, extract::Query, routing::get};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Arc;

    async fn spawn_news() -> String {
        let app = Router::new().route(
            "/v2/everything",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                let topic = q.get("q").cloned().unwrap_or_default();
                Json(json!({
                    "status": "ok",
                    "articles": [
                        {
                            "source": { "id": null, "name": "Wire" },
                            "author": "Reporter",
                            "title": format!("{topic} hits new high"),
                            "description": "Markets moved",
                            "url": "https://news.example/1",
                            "content": "Full story"
                        },
                        {
                            "source": { "id": null, "name": "Daily" },
                            "author": null,
                            "title": format!("{topic} regulation update"),
                            "description": null,
                            "url": "https://news.example/2",
                            "content": null
                        }
                    ]
                }))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[derive(Debug)]
    struct Failing;

    #[async_trait]
    impl NativeTool for Failing {
        fn name(&self) -> &str {
            "getNews"
        }

        fn description(&self) -> &str {
            "Always fails"
        }

        fn schema(&self) -> serde_json::Value {
            json!({ "type": "object" })
        }

        async fn call(&self, _args: serde_json::Value) -> anyhow::Result<serde_json::Value> {
            anyhow::bail!("connection refused")
        }
    }

    #[tokio::test]
    async fn test_get_news_output_matches_lookup() {
        let base = spawn_news().await;
        let client = NewsClient::new(&base, "news-key").unwrap();
        let registry = ToolRegistry::new().with_tool(Arc::new(GetNewsTool::new(client.clone())));
        let api = ScriptedAssistants::new();
        let dispatcher = ToolDispatcher::new(&registry, &api);

        let calls = vec![ToolCall::function("call_1", GET_NEWS, r#"{"topic":"bitcoin"}"#)];
        let count = dispatcher.dispatch("thread_1", "run_1", &calls).await.unwrap();
        assert_eq!(count, 1);

        let submissions = api.submissions();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].thread_id, "thread_1");
        assert_eq!(submissions[0].run_id, "run_1");
        assert_eq!(submissions[0].outputs.len(), 1);
        assert_eq!(submissions[0].outputs[0].tool_call_id, "call_1");

        let submitted: Vec<NewsArticle> =
            serde_json::from_str(&submissions[0].outputs[0].output).unwrap();
        let expected = client.get_news("bitcoin").await.unwrap();
        assert_eq!(submitted, expected);
        assert_eq!(submitted[0].title, "bitcoin hits new high");
    }

    #[tokio::test]
    async fn test_unknown_function_submits_nothing() {
        let registry = ToolRegistry::new();
        let api = ScriptedAssistants::new();
        let dispatcher = ToolDispatcher::new(&registry, &api);

        let calls = vec![ToolCall::function("call_1", "doesNotExist", "{}")];
        let err = dispatcher
            .dispatch("thread_1", "run_1", &calls)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::UnknownFunction(ref n) if n == "doesNotExist"));
        assert!(api.submissions().is_empty());
    }

    #[tokio::test]
    async fn test_handler_failure_aborts_whole_batch() {
        let registry = ToolRegistry::new().with_tool(Arc::new(Failing));
        let api = ScriptedAssistants::new();
        let dispatcher = ToolDispatcher::new(&registry, &api);

        let calls = vec![
            ToolCall::function("call_1", "getNews", r#"{"topic":"a"}"#),
            ToolCall::function("call_2", "getNews", r#"{"topic":"b"}"#),
        ];
        let err = dispatcher
            .dispatch("thread_1", "run_1", &calls)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ToolExecution { ref name, .. } if name == "getNews"));
        assert!(api.submissions().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_arguments_are_rejected() {
        let base = spawn_news().await;
        let client = NewsClient::new(&base, "news-key").unwrap();
        let registry = ToolRegistry::new().with_tool(Arc::new(GetNewsTool::new(client)));
        let api = ScriptedAssistants::new();
        let dispatcher = ToolDispatcher::new(&registry, &api);

        let calls = vec![ToolCall::function("call_1", GET_NEWS, "{not json")];
        let err = dispatcher.execute(&calls).await.unwrap_err();
        assert!(matches!(err, AppError::Json(_)));

        let calls = vec![ToolCall::function("call_1", GET_NEWS, r#"{"subject":"x"}"#)];
        let err = dispatcher.execute(&calls).await.unwrap_err();
        assert!(err.to_string().contains("Missing topic"));
    }

    #[tokio::test]
    async fn test_non_function_calls_are_skipped() {
        let registry = ToolRegistry::new();
        let api = ScriptedAssistants::new();
        let dispatcher = ToolDispatcher::new(&registry, &api);

        let mut call = ToolCall::function("call_1", "code", "{}");
        call.call_type = "code_interpreter".to_string();
        let outputs = dispatcher.execute(&[call]).await.unwrap();
        assert!(outputs.is_empty());
    }
}
