//! 资料库查询工具（演示用内置数据）

use async_trait::async_trait;
use serde_json::Value;

use crate::tools::{Tool, ToolParam};

/// 资料库查询：按关键词返回内置条目
pub struct DatabaseTool;

const DB_ENTRIES: &[(&str, &str)] = &[
    (
        "python",
        "Python is a high-level programming language known for its readability and versatility.",
    ),
    (
        "langchain",
        "LangChain is a framework for developing applications powered by language models.",
    ),
    (
        "tools",
        "Tools allow language models to interact with external systems.",
    ),
    (
        "england",
        "England is a country that is part of the United Kingdom. Its capital is London.",
    ),
];

#[async_trait]
impl Tool for DatabaseTool {
    fn name(&self) -> &str {
        "search_database"
    }

    fn description(&self) -> &str {
        "Search a database for information about a given query"
    }

    fn parameters(&self) -> Vec<ToolParam> {
        vec![ToolParam::required("query", "string")]
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let query = args
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| "missing required arg: query".to_string())?;

        let key = query.trim().to_lowercase();
        match DB_ENTRIES.iter().find(|(k, _)| *k == key) {
            Some((_, entry)) => Ok(entry.to_string()),
            None => Ok(format!("No information found for query: {query}")),
        }
    }
}
