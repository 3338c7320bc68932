//! Agent 错误类型
//!
//! 传播策略：只有构造期与规划期错误允许中止一次运行；
//! 步骤级与重规划级失败在各自阶段内降级，不会以错误形式离开 `run`。

use thiserror::Error;

use crate::llm::LlmError;

/// 编排运行过程中可能出现的错误（注册、规划、工具、取消等）
#[derive(Error, Debug)]
pub enum AgentError {
    /// 构造期：注册表为空（期望至少注册一个工具）
    #[error("No tools registered")]
    NoToolsRegistered,

    /// 构造期：两个工具同名
    #[error("Duplicate tool name: {0}")]
    DuplicateTool(String),

    /// 规划期：结构化校验重试耗尽或 LLM 调用失败
    #[error("Planning failed: {0}")]
    PlanningFailed(String),

    #[error("LLM error: {0}")]
    LlmError(#[from] LlmError),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Tool execution failed: {0}")]
    ToolExecutionFailed(String),

    #[error("Tool timeout: {0}")]
    ToolTimeout(String),

    #[error("JSON parse error: {0}")]
    JsonParseError(String),

    #[error("Cancelled")]
    Cancelled,

    #[error("Config error: {0}")]
    ConfigError(String),
}
