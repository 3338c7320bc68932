//! 结构化输出调用
//!
//! 将目标类型的 JSON Schema（schemars 生成）注入 system prompt，从回复文本中提取 JSON
//! 并反序列化；格式不符时把错误作为纠正消息回喂重试，重试预算耗尽返回 SchemaValidation。
//! 对应原型中 result_type + result_retries 的语义。

use std::sync::Arc;

use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;

use crate::llm::{LlmClient, LlmError, Message};

/// 从 LLM 输出中提取 JSON 块（```json ... ``` 围栏或首个 { 到末个 }）
pub fn extract_json(output: &str) -> Option<&str> {
    let trimmed = output.trim();

    if let Some(start) = trimmed.find("```json") {
        let rest = &trimmed[start + 7..];
        let block = rest
            .find("```")
            .map(|end| rest[..end].trim())
            .unwrap_or_else(|| rest.trim());
        return Some(block);
    }
    if let Some(start) = trimmed.find('{') {
        if let Some(end) = trimmed.rfind('}') {
            return Some(&trimmed[start..=end]);
        }
    }
    None
}

/// 结构化调用包装：持有 LLM 与校验重试预算
pub struct StructuredLlm {
    llm: Arc<dyn LlmClient>,
    max_retries: usize,
}

impl StructuredLlm {
    pub fn new(llm: Arc<dyn LlmClient>, max_retries: usize) -> Self {
        Self { llm, max_retries }
    }

    /// 调用 LLM 并解析为 T；system 为业务提示词，Schema 约束由本方法追加
    pub async fn call<T>(&self, system: &str, user: &str) -> Result<T, LlmError>
    where
        T: DeserializeOwned + JsonSchema,
    {
        let schema = serde_json::to_string_pretty(&schema_for!(T))
            .unwrap_or_else(|_| "{}".to_string());
        let system = format!(
            "{system}\n\nRespond with a single JSON object conforming to this JSON Schema. \
            Output only the JSON, no prose, no code fences.\n\n{schema}"
        );

        let mut messages = vec![Message::system(system), Message::user(user)];
        let mut last_error = String::new();

        for _attempt in 0..=self.max_retries {
            let output = self.llm.complete(&messages).await?;

            match Self::parse::<T>(&output) {
                Ok(value) => return Ok(value),
                Err(e) => {
                    tracing::debug!(error = %e, "structured output rejected, retrying");
                    last_error = e;
                    // 把原始输出与错误回喂，让模型自行纠正
                    messages.push(Message::assistant(output));
                    messages.push(Message::user(format!(
                        "Your previous output was not valid: {last_error}. \
                        Output only a single JSON object matching the schema, nothing else."
                    )));
                }
            }
        }

        Err(LlmError::SchemaValidation {
            attempts: self.max_retries + 1,
            last_error,
        })
    }

    fn parse<T: DeserializeOwned>(output: &str) -> Result<T, String> {
        let json = extract_json(output).ok_or_else(|| "no JSON object found".to_string())?;
        serde_json::from_str(json).map_err(|e| e.to_string())
    }
}
