//! 主控状态机：PLAN → { EXECUTE → REPLAN }* → TERMINAL
//!
//! Orchestrator 将 Planner / StepExecutor / Replanner 接成一个必然终止的循环，
//! 对外暴露单一入口 run(objective)。各阶段产出 StateDelta，由本层按序合并进
//! OrchestrationState；规划失败致命，步骤与重规划失败降级；max_iterations 为
//! 安全上限，超出时以「未能完成」的终态回复收束而非报错。取消在阶段之间检查。

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::core::{AgentError, OrchestrationState, StateDelta};
use crate::llm::LlmClient;
use crate::plan_execute::{
    Action, EventSink, FinalResponse, NullSink, Planner, Replanner, StepExecutor,
};
use crate::tools::{ToolExecutor, ToolRegistry};

/// 编排器：持有三个阶段、事件接收端与循环上限；可多次 run，互不共享状态
pub struct Orchestrator {
    planner: Planner,
    executor: StepExecutor,
    replanner: Replanner,
    sink: Arc<dyn EventSink>,
    max_iterations: usize,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("max_iterations", &self.max_iterations)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    pub fn builder(llm: Arc<dyn LlmClient>) -> OrchestratorBuilder {
        OrchestratorBuilder::new(llm)
    }

    /// 对一个目标跑完整编排，返回最终回复
    pub async fn run(&self, objective: &str) -> Result<FinalResponse, AgentError> {
        self.run_with_cancel(objective, CancellationToken::new())
            .await
    }

    /// 带取消令牌的运行；取消在阶段之间生效，不回滚已发生的工具副作用
    pub async fn run_with_cancel(
        &self,
        objective: &str,
        cancel: CancellationToken,
    ) -> Result<FinalResponse, AgentError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("orchestration", run_id = %run_id);
        self.run_inner(objective, cancel).instrument(span).await
    }

    async fn run_inner(
        &self,
        objective: &str,
        cancel: CancellationToken,
    ) -> Result<FinalResponse, AgentError> {
        let sink = &*self.sink;
        sink.input(objective);

        // PLAN：唯一的初始状态；失败即致命
        let plan = self.planner.plan(objective, sink).await?;
        let mut state =
            OrchestrationState::new(objective).apply(StateDelta::Plan(plan.steps));

        for iteration in 0..self.max_iterations {
            if cancel.is_cancelled() {
                sink.error("Cancelled");
                return Err(AgentError::Cancelled);
            }
            if state.plan.is_empty() {
                break;
            }
            tracing::debug!(iteration, remaining = state.plan.len(), "execute");
            sink.update_steps(&state.history, &state.plan);

            // EXECUTE：消费计划头部，总是产出一条记录
            let record = self.executor.execute(&state, sink).await;
            state = state.apply(StateDelta::Step(record));

            if cancel.is_cancelled() {
                sink.error("Cancelled");
                return Err(AgentError::Cancelled);
            }

            // REPLAN：终态回复或新的剩余计划；失败保留上一计划
            match self.replanner.replan(&state, sink).await {
                Some(Action::Respond(response)) => {
                    state = state.apply(StateDelta::Response(response.response));
                }
                Some(Action::Continue(plan)) => {
                    state = state.apply(StateDelta::Plan(plan.steps));
                }
                None => {}
            }

            if !state.should_continue() {
                sink.update_steps(&state.history, &state.plan);
                let response = state.response.unwrap_or_default();
                return Ok(FinalResponse { response });
            }
        }

        // 安全上限或空计划：以显式「未能完成」回复收束，不向调用方抛错
        let last = state
            .history
            .last()
            .map(|r| format!(" Last step result: {}", r.result))
            .unwrap_or_default();
        let response = format!(
            "Could not complete the objective within {} iterations.{}",
            self.max_iterations, last
        );
        sink.error(&response);
        Ok(FinalResponse { response })
    }
}

/// Orchestrator 构建器：注册工具、按阶段覆盖 LLM、接入事件接收端
///
/// planner / executor / replanner 可用不同模型（原型中的 llm_think / llm_do 分工），
/// 未覆盖时共用默认 LLM。build 时做构造期检查：注册表为空即失败。
pub struct OrchestratorBuilder {
    llm: Arc<dyn LlmClient>,
    planner_llm: Option<Arc<dyn LlmClient>>,
    executor_llm: Option<Arc<dyn LlmClient>>,
    replanner_llm: Option<Arc<dyn LlmClient>>,
    registry: ToolRegistry,
    sink: Arc<dyn EventSink>,
    max_iterations: usize,
    structured_retries: usize,
    max_tool_rounds: usize,
    tool_timeout_secs: u64,
}

impl OrchestratorBuilder {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        let defaults = crate::config::OrchestratorSection::default();
        Self {
            llm,
            planner_llm: None,
            executor_llm: None,
            replanner_llm: None,
            registry: ToolRegistry::new(),
            sink: Arc::new(NullSink),
            max_iterations: defaults.max_iterations,
            structured_retries: defaults.structured_retries,
            max_tool_rounds: defaults.max_tool_rounds,
            tool_timeout_secs: crate::config::ToolsSection::default().tool_timeout_secs,
        }
    }

    /// 应用配置中的循环/重试/超时边界
    pub fn with_config(mut self, config: &AppConfig) -> Self {
        self.max_iterations = config.orchestrator.max_iterations;
        self.structured_retries = config.orchestrator.structured_retries;
        self.max_tool_rounds = config.orchestrator.max_tool_rounds;
        self.tool_timeout_secs = config.tools.tool_timeout_secs;
        self
    }

    /// 使用已构建的工具注册表
    pub fn with_registry(mut self, registry: ToolRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// 覆盖规划阶段的 LLM
    pub fn with_planner_llm(mut self, llm: Arc<dyn LlmClient>) -> Self {
        self.planner_llm = Some(llm);
        self
    }

    /// 覆盖执行阶段的 LLM
    pub fn with_executor_llm(mut self, llm: Arc<dyn LlmClient>) -> Self {
        self.executor_llm = Some(llm);
        self
    }

    /// 覆盖重规划阶段的 LLM
    pub fn with_replanner_llm(mut self, llm: Arc<dyn LlmClient>) -> Self {
        self.replanner_llm = Some(llm);
        self
    }

    /// 设置事件接收端
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// 设置循环安全上限
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// 构造期检查并组装 Orchestrator
    pub fn build(self) -> Result<Orchestrator, AgentError> {
        if self.registry.is_empty() {
            return Err(AgentError::NoToolsRegistered);
        }

        let catalog = self.registry.catalog_text();
        let planner_llm = self.planner_llm.unwrap_or_else(|| self.llm.clone());
        let executor_llm = self.executor_llm.unwrap_or_else(|| self.llm.clone());
        let replanner_llm = self.replanner_llm.unwrap_or_else(|| self.llm.clone());

        let tools = ToolExecutor::new(Arc::new(self.registry), self.tool_timeout_secs);

        Ok(Orchestrator {
            planner: Planner::new(planner_llm, self.structured_retries, &catalog),
            executor: StepExecutor::new(executor_llm, tools, self.max_tool_rounds),
            replanner: Replanner::new(replanner_llm, self.structured_retries, &catalog),
            sink: self.sink,
            max_iterations: self.max_iterations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;
    use crate::tools::CalculatorTool;

    #[test]
    fn test_build_requires_tools() {
        let err = OrchestratorBuilder::new(Arc::new(MockLlmClient::default()))
            .build()
            .unwrap_err();
        assert!(matches!(err, AgentError::NoToolsRegistered));
    }

    #[tokio::test]
    async fn test_cancelled_between_stages() {
        let mut registry = ToolRegistry::new();
        registry.register(CalculatorTool).unwrap();
        let orchestrator = OrchestratorBuilder::new(Arc::new(MockLlmClient::with_responses(
            vec![r#"{"steps": ["do something"]}"#.to_string()],
        )))
        .with_registry(registry)
        .build()
        .unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = orchestrator
            .run_with_cancel("objective", cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Cancelled));
    }
}
