//! 编排过程事件：用于控制台/前端展示输入、思考、步骤进度、工具调用与错误
//!
//! 核心只依赖 EventSink 接口，所有通知都是 fire-and-forget：
//! sink 不可用或发送失败一律吞掉，绝不影响编排控制流。

use serde::Serialize;
use tokio::sync::mpsc;

use crate::core::StepRecord;

/// 过程事件的可序列化投影（可序列化为 JSON 供前端展示）
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// 运行开始，记录用户目标
    Input { text: String },
    /// 正在调用 LLM 思考（规划 / 执行 / 重规划）
    Thinking { text: String },
    /// 步骤进度更新：已执行历史 + 剩余计划
    StepUpdate {
        history: Vec<StepRecord>,
        plan: Vec<String>,
    },
    /// 调用工具及其结果
    ToolCall {
        tool: String,
        args: serde_json::Value,
        result: String,
    },
    /// 错误（步骤降级、重规划失败等，不中断运行）
    Error { text: String },
}

/// 事件接收端：全部方法默认 no-op，实现方自行决定展示方式。
/// 要求线程安全；同一运行内多个阶段会交错调用。
pub trait EventSink: Send + Sync {
    fn input(&self, _text: &str) {}
    fn thinking(&self, _text: &str) {}
    fn update_steps(&self, _history: &[StepRecord], _plan: &[String]) {}
    fn tool_call(&self, _tool: &str, _args: &serde_json::Value, _result: &str) {}
    fn error(&self, _text: &str) {}
}

/// 空接收端：丢弃所有事件
#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {}

/// 通道接收端：将事件转为 AgentEvent 投递到 unbounded mpsc，接收端掉线时静默丢弃
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<AgentEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<AgentEvent>) -> Self {
        Self { tx }
    }

    fn send(&self, event: AgentEvent) {
        let _ = self.tx.send(event);
    }
}

impl EventSink for ChannelSink {
    fn input(&self, text: &str) {
        self.send(AgentEvent::Input {
            text: text.to_string(),
        });
    }

    fn thinking(&self, text: &str) {
        self.send(AgentEvent::Thinking {
            text: text.to_string(),
        });
    }

    fn update_steps(&self, history: &[StepRecord], plan: &[String]) {
        self.send(AgentEvent::StepUpdate {
            history: history.to_vec(),
            plan: plan.to_vec(),
        });
    }

    fn tool_call(&self, tool: &str, args: &serde_json::Value, result: &str) {
        self.send(AgentEvent::ToolCall {
            tool: tool.to_string(),
            args: args.clone(),
            result: result.to_string(),
        });
    }

    fn error(&self, text: &str) {
        self.send(AgentEvent::Error {
            text: text.to_string(),
        });
    }
}

/// 控制台接收端：事件走 tracing 输出（CLI 用）
#[derive(Debug, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn input(&self, text: &str) {
        tracing::info!(objective = %text, "input");
    }

    fn thinking(&self, text: &str) {
        tracing::info!(%text, "thinking");
    }

    fn update_steps(&self, history: &[StepRecord], plan: &[String]) {
        tracing::info!(executed = history.len(), remaining = plan.len(), "steps");
        for (i, step) in plan.iter().enumerate() {
            tracing::debug!("plan[{}]: {}", i + 1, step);
        }
    }

    fn tool_call(&self, tool: &str, args: &serde_json::Value, result: &str) {
        tracing::info!(%tool, args = %args.to_string(), %result, "tool_call");
    }

    fn error(&self, text: &str) {
        tracing::warn!(%text, "agent error");
    }
}
