//! Planner：目标 → 初始计划
//!
//! 每次运行调用一次。产出最小化、严格有序的步骤序列：按序执行且只用目录中的工具即可在
//! 末步得到最终答案。结构化校验重试耗尽即致命（PlanningFailed），不会代之以猜测的计划。

use std::sync::Arc;

use crate::core::AgentError;
use crate::llm::{LlmClient, StructuredLlm};
use crate::plan_execute::{EventSink, Plan};

const PLANNER_PROMPT: &str = "For the given objective, come up with a simple step by step \
execution plan. This plan should involve individual tasks including the tool name, that if \
executed correctly will yield the correct answer. Do not add any superfluous steps. The result \
of the final step should be the final answer. Make sure that each step has all the information \
needed - do not skip steps.\n\ntools you can use:\n{tools}";

/// Planner：持有结构化 LLM 调用与工具目录文本
pub struct Planner {
    structured: StructuredLlm,
    system_prompt: String,
}

impl Planner {
    pub fn new(llm: Arc<dyn LlmClient>, structured_retries: usize, catalog_text: &str) -> Self {
        Self {
            structured: StructuredLlm::new(llm, structured_retries),
            system_prompt: PLANNER_PROMPT.replace("{tools}", catalog_text),
        }
    }

    /// 为目标生成初始计划；空计划视为规划失败
    pub async fn plan(&self, objective: &str, sink: &dyn EventSink) -> Result<Plan, AgentError> {
        sink.thinking(&format!("Planning steps for objective: {objective}"));

        let plan: Plan = self
            .structured
            .call(&self.system_prompt, objective)
            .await
            .map_err(|e| AgentError::PlanningFailed(e.to_string()))?;

        if plan.steps.is_empty() {
            return Err(AgentError::PlanningFailed(
                "planner returned an empty plan".to_string(),
            ));
        }

        sink.thinking(&format!("Generated plan with {} steps", plan.steps.len()));
        Ok(plan)
    }
}
