use async_trait::async_trait;
use serde_json::json;

use crate::news::NewsClient;

use super::NativeTool;

/// Function name the assistant uses to request news.
pub const GET_NEWS: &str = "getNews";

/// `getNews` tool backed by [`NewsClient`].
#[derive(Debug, Clone)]
pub struct GetNewsTool {
    client: NewsClient,
}

impl GetNewsTool {
    pub fn new(client: NewsClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl NativeTool for GetNewsTool {
    fn name(&self) -> &str {
        GET_NEWS
    }

    fn description(&self) -> &str {
        "Get the list of articles/news for the given topic"
    }

    fn schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "topic": {
                    "type": "string",
                    "description": "The topic of the news"
                }
            },
            "required": ["topic"]
        })
    }

    async fn call(&self, args: serde_json::Value) -> anyhow::Result<serde_json::Value> {
        let topic = args["topic"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing topic"))?;
        let articles = self.client.get_news(topic).await?;
        Ok(serde_json::to_value(articles)?)
    }
}
