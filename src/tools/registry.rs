use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::assistants::{AssistantTool, FunctionDefinition};

/// A locally executed function the assistant can call.
#[async_trait]
pub trait NativeTool: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn schema(&self) -> serde_json::Value;
    async fn call(&self, args: serde_json::Value) -> anyhow::Result<serde_json::Value>;
}

/// Function name → handler lookup table.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Arc<HashMap<String, Arc<dyn NativeTool>>>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

impl ToolRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under its own name, replacing any previous handler.
    #[must_use]
    pub fn with_tool(self, tool: Arc<dyn NativeTool>) -> Self {
        let mut tools = (*self.tools).clone();
        tools.insert(tool.name().to_string(), tool);
        Self {
            tools: Arc::new(tools),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn NativeTool>> {
        self.tools.get(name)
    }

    /// Registered function names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Tool declarations to attach to a newly created assistant.
    pub fn assistant_tools(&self) -> Vec<AssistantTool> {
        self.names()
            .into_iter()
            .filter_map(|name| self.tools.get(name))
            .map(|t| AssistantTool::Function {
                function: FunctionDefinition {
                    name: t.name().to_string(),
                    description: t.description().to_string(),
                    parameters: t.schema(),
                },
            })
            .collect()
    }
}
