//! Mock LLM 客户端（用于测试，无需 API）
//!
//! 支持三种模式：按脚本依次吐出预置回复（编排集成测试用）、
//! 回显最后一条 User 消息（默认）、始终失败（降级路径测试用）。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::{LlmClient, LlmError, Message, Role};

/// Mock 客户端：脚本回复 / 回显 / 恒定失败
#[derive(Debug, Default)]
pub struct MockLlmClient {
    responses: Mutex<VecDeque<String>>,
    scripted: bool,
    always_fail: bool,
}

impl MockLlmClient {
    /// 按顺序吐出预置回复；耗尽后返回 Api 错误（脚本与实际调用次数不符即测试缺陷）
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            scripted: true,
            always_fail: false,
        }
    }

    /// 每次调用都失败
    pub fn failing() -> Self {
        Self {
            always_fail: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError> {
        if self.always_fail {
            return Err(LlmError::Api("mock failure".to_string()));
        }

        let mut queue = self.responses.lock().expect("mock lock poisoned");
        if let Some(next) = queue.pop_front() {
            return Ok(next);
        }
        drop(queue);

        if self.scripted {
            return Err(LlmError::Api("mock: scripted responses exhausted".to_string()));
        }

        // 无脚本时回显最后一条用户消息
        let last_user = messages
            .iter()
            .rev()
            .find(|m| matches!(m.role, Role::User))
            .map(|m| m.content.as_str())
            .unwrap_or("(no input)");
        Ok(format!("Echo from Mock: {last_user}"))
    }
}
