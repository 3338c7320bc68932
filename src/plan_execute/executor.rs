//! StepExecutor：执行计划头部的单个步骤
//!
//! 将步骤与完整计划、步骤序号拼成任务提示，驱动一次可调用工具的模型会话：
//! 模型每轮输出 `{"tool": ..., "args": ...}` JSON（执行后回喂 Observation）或纯文本的
//! 步骤答案。轮数耗尽或任何 LLM/工具异常都不致命——降级为结果文本记录失败的
//! StepRecord，循环继续。事件仅观测，绝不影响控制流。

use std::sync::Arc;

use serde::Deserialize;

use crate::core::{OrchestrationState, StepRecord};
use crate::llm::{extract_json, LlmClient, Message};
use crate::plan_execute::EventSink;
use crate::tools::ToolExecutor;

const DOER_PROMPT: &str = "You are a helpful assistant executing one step of a plan. Be \
concise, reply with one sentence. If you can't find the answer even after retries just say \
you can't find the answer.\n\nTo use a tool, output exactly one JSON object and nothing \
else: {\"tool\": \"tool_name\", \"args\": {...}}. When you have the answer for the step, \
reply in plain text without JSON.\n\nAvailable tools:\n{tools}";

/// LLM 输出的 Tool Call（简化 JSON：{"tool": "calculator", "args": {"expression": "..."}}）
#[derive(Debug, Clone, Deserialize)]
struct ToolCall {
    tool: String,
    #[serde(default)]
    args: serde_json::Value,
}

/// 单轮模型输出的解析结果
#[derive(Debug)]
enum StepOutput {
    /// 需要执行工具
    ToolCall(ToolCall),
    /// 该步骤的最终文本答案
    Answer(String),
    /// 形似 Tool Call 但 JSON 不合法，需纠正重试
    Malformed(String),
}

/// 解析单轮输出：含 "tool" 键的 JSON 为 ToolCall，其余为纯文本答案
fn parse_step_output(output: &str) -> StepOutput {
    let trimmed = output.trim();
    let Some(json_str) = extract_json(trimmed) else {
        return StepOutput::Answer(trimmed.to_string());
    };
    // 只把带 "tool" 键的 JSON 当作工具调用；其它 JSON 一律视为答案文本
    if !json_str.contains("\"tool\"") {
        return StepOutput::Answer(trimmed.to_string());
    }
    match serde_json::from_str::<ToolCall>(json_str) {
        Ok(tc) if !tc.tool.is_empty() => StepOutput::ToolCall(tc),
        Ok(_) => StepOutput::Answer(trimmed.to_string()),
        Err(e) => StepOutput::Malformed(format!("{e}: {json_str}")),
    }
}

/// 步骤执行器：持有 LLM、工具执行器与单步工具轮数上限
pub struct StepExecutor {
    llm: Arc<dyn LlmClient>,
    tools: ToolExecutor,
    system_prompt: String,
    max_tool_rounds: usize,
}

impl StepExecutor {
    pub fn new(llm: Arc<dyn LlmClient>, tools: ToolExecutor, max_tool_rounds: usize) -> Self {
        let catalog = tools.registry().catalog_text();
        Self {
            llm,
            tools,
            system_prompt: DOER_PROMPT.replace("{tools}", &catalog),
            max_tool_rounds,
        }
    }

    /// 执行计划头部步骤，总是返回一条 StepRecord（失败时为降级记录）
    pub async fn execute(&self, state: &OrchestrationState, sink: &dyn EventSink) -> StepRecord {
        let Some(task) = state.next_step() else {
            // 调用方保证计划非空；防御性降级
            return StepRecord::new("", "Error: no step to execute (empty plan)");
        };
        let task = task.to_string();

        sink.thinking(&format!("Executing step: {task}"));

        let plan_str = state
            .plan
            .iter()
            .enumerate()
            .map(|(i, step)| format!("{}. {}", i + 1, step))
            .collect::<Vec<_>>()
            .join("\n");
        let step_index = state.history.len() + 1;
        let user = format!(
            "Current plan:\n{plan_str}\n\nExecute step {step_index}: {task}\n\
            Report the answer in a human readable form. If you face a problem, just report \
            the error."
        );

        let mut messages = vec![Message::system(self.system_prompt.clone()), Message::user(user)];

        for _round in 0..self.max_tool_rounds {
            let output = match self.llm.complete(&messages).await {
                Ok(o) => o,
                Err(e) => {
                    let error_msg = format!("Error executing '{task}': {e}");
                    sink.error(&error_msg);
                    return StepRecord::new(task, error_msg);
                }
            };

            match parse_step_output(&output) {
                StepOutput::Answer(answer) => {
                    return StepRecord::new(task, answer);
                }
                StepOutput::ToolCall(tc) => {
                    let observation = match self.tools.execute(&tc.tool, tc.args.clone()).await {
                        Ok(result) => result,
                        Err(e) => {
                            sink.error(&format!("Tool '{}' failed: {e}", tc.tool));
                            format!("Error: {e}")
                        }
                    };
                    sink.tool_call(&tc.tool, &tc.args, &observation);
                    // 工具调用与观察写回会话，供下一轮使用
                    messages.push(Message::assistant(output));
                    messages.push(Message::user(format!(
                        "Observation from {}: {}",
                        tc.tool, observation
                    )));
                }
                StepOutput::Malformed(detail) => {
                    sink.error(&format!("Malformed tool call: {detail}"));
                    messages.push(Message::assistant(output));
                    messages.push(Message::user(
                        "Your tool call JSON was invalid. Output exactly one JSON object of \
                        the form {\"tool\": \"tool_name\", \"args\": {...}}, or answer the \
                        step in plain text."
                            .to_string(),
                    ));
                }
            }
        }

        let error_msg = format!(
            "Usage limit exceeded: tried {} rounds but could not get an answer for this step",
            self.max_tool_rounds
        );
        sink.error(&error_msg);
        StepRecord::new(task, error_msg)
    }
}
