//! Replanner：每步执行后决定终止或继续
//!
//! 输入目标、最近一次计划与全部历史，输出 Action：历史已能回答目标则 Respond，
//! 否则 Continue 且只含尚未完成的步骤（与历史逐字相同的步骤被过滤，防止无限重放）。
//! 任何异常或畸形输出都不致命：保留上一计划继续循环，仅向 sink 记录。

use std::sync::Arc;

use crate::core::OrchestrationState;
use crate::llm::{LlmClient, StructuredLlm};
use crate::plan_execute::{Action, EventSink, Plan};

const REPLANNER_PROMPT: &str = "For the given objective, come up with a simple step by step \
plan. This plan should involve individual tasks, that if executed correctly will yield the \
correct answer. Do not add any superfluous steps. The result of the final step should be the \
final answer. Make sure that each step has all the information needed - do not skip steps.\n\n\
If the steps already done are enough to answer the objective, respond to the user with the \
final answer ({\"response\": ...}). Otherwise continue with a plan that contains ONLY the \
steps that still need to be done ({\"steps\": [...]}) - never repeat previously done steps.\n\n\
you have only following tools at disposal:\n{tools}";

/// Replanner：持有结构化 LLM 调用与工具目录文本
pub struct Replanner {
    structured: StructuredLlm,
    system_prompt: String,
}

impl Replanner {
    pub fn new(llm: Arc<dyn LlmClient>, structured_retries: usize, catalog_text: &str) -> Self {
        Self {
            structured: StructuredLlm::new(llm, structured_retries),
            system_prompt: REPLANNER_PROMPT.replace("{tools}", catalog_text),
        }
    }

    /// 重规划；None 表示失败或畸形输出，调用方保留上一计划
    pub async fn replan(&self, state: &OrchestrationState, sink: &dyn EventSink) -> Option<Action> {
        sink.thinking("Replanning based on executed steps...");

        let plan_str = state
            .plan
            .iter()
            .enumerate()
            .map(|(i, step)| format!("{}. {}", i + 1, step))
            .collect::<Vec<_>>()
            .join("\n");
        let history_str = state
            .history
            .iter()
            .map(|r| format!("- {}: {}", r.step, r.result))
            .collect::<Vec<_>>()
            .join("\n");
        let input = format!(
            "Your objective was this:\n{}\n\nYour original plan was this:\n{}\n\n\
            You have currently done the follow steps:\n{}",
            state.objective, plan_str, history_str
        );

        let action: Action = match self.structured.call(&self.system_prompt, &input).await {
            Ok(a) => a,
            Err(e) => {
                sink.error(&format!("Error in replanning: {e}"));
                return None;
            }
        };

        match action {
            Action::Respond(response) => {
                sink.thinking("Final response determined");
                Some(Action::Respond(response))
            }
            Action::Continue(plan) => {
                // 与历史逐字相同的步骤一律过滤，防止已完成工作被重放
                let remaining: Vec<String> = plan
                    .steps
                    .into_iter()
                    .filter(|step| !state.history.iter().any(|r| &r.step == step))
                    .collect();
                if remaining.is_empty() {
                    sink.error("Replanner returned only completed steps; keeping previous plan");
                    return None;
                }
                sink.thinking(&format!("New plan with {} steps", remaining.len()));
                Some(Action::Continue(Plan { steps: remaining }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{StateDelta, StepRecord};
    use crate::llm::MockLlmClient;
    use crate::plan_execute::NullSink;

    fn state_after_one_step() -> OrchestrationState {
        OrchestrationState::new("objective")
            .apply(StateDelta::Plan(vec!["step one".into(), "step two".into()]))
            .apply(StateDelta::Step(StepRecord::new("step one", "result one")))
    }

    #[tokio::test]
    async fn test_replan_respond() {
        let llm = Arc::new(MockLlmClient::with_responses(vec![
            r#"{"response": "the final answer"}"#.to_string(),
        ]));
        let replanner = Replanner::new(llm, 2, "tools");
        let action = replanner.replan(&state_after_one_step(), &NullSink).await;
        assert!(matches!(
            action,
            Some(Action::Respond(r)) if r.response == "the final answer"
        ));
    }

    #[tokio::test]
    async fn test_replan_filters_completed_steps() {
        // 模型把已完成的 step one 又放了回来：必须被过滤
        let llm = Arc::new(MockLlmClient::with_responses(vec![
            r#"{"steps": ["step one", "step two"]}"#.to_string(),
        ]));
        let replanner = Replanner::new(llm, 2, "tools");
        let action = replanner.replan(&state_after_one_step(), &NullSink).await;
        match action {
            Some(Action::Continue(plan)) => {
                assert_eq!(plan.steps, vec!["step two".to_string()]);
            }
            other => panic!("expected Continue, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_replan_only_completed_steps_keeps_previous_plan() {
        let llm = Arc::new(MockLlmClient::with_responses(vec![
            r#"{"steps": ["step one"]}"#.to_string(),
        ]));
        let replanner = Replanner::new(llm, 2, "tools");
        let action = replanner.replan(&state_after_one_step(), &NullSink).await;
        assert!(action.is_none());
    }

    #[tokio::test]
    async fn test_replan_failure_is_non_fatal() {
        let replanner = Replanner::new(Arc::new(MockLlmClient::failing()), 1, "tools");
        let action = replanner.replan(&state_after_one_step(), &NullSink).await;
        assert!(action.is_none());
    }
}
