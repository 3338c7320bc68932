//! 编排状态与状态增量
//!
//! OrchestrationState 为单次运行的全部状态：目标、剩余计划、已执行历史、终态回复。
//! 各阶段不直接修改共享状态，而是返回 StateDelta，由 Orchestrator 按序 apply 合并，
//! 保证历史只追加、计划只整体替换。

use serde::{Deserialize, Serialize};

/// 一条已执行步骤的记录：步骤描述 + 结果文本。入史后不可变
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: String,
    pub result: String,
}

impl StepRecord {
    pub fn new(step: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            result: result.into(),
        }
    }
}

/// 阶段产出的部分更新：新计划 / 追加一条历史 / 终态回复
#[derive(Debug, Clone)]
pub enum StateDelta {
    /// 整体替换剩余计划（Planner / Replanner 产出）
    Plan(Vec<String>),
    /// 追加一条执行记录（StepExecutor 产出）
    Step(StepRecord),
    /// 设置终态回复（Replanner 产出）
    Response(String),
}

/// 单次编排运行的状态，由 Orchestrator 独占
#[derive(Debug, Clone)]
pub struct OrchestrationState {
    /// 用户目标，运行开始时设置，之后不变
    pub objective: String,
    /// 剩余计划；非空时首元素即下一个要执行的步骤
    pub plan: Vec<String>,
    /// 已执行历史，只追加，顺序即执行顺序
    pub history: Vec<StepRecord>,
    /// 终态回复；非空时运行终止
    pub response: Option<String>,
}

impl OrchestrationState {
    pub fn new(objective: impl Into<String>) -> Self {
        Self {
            objective: objective.into(),
            plan: Vec::new(),
            history: Vec::new(),
            response: None,
        }
    }

    /// 函数式合并一个阶段增量，返回下一个状态
    pub fn apply(mut self, delta: StateDelta) -> Self {
        match delta {
            StateDelta::Plan(steps) => self.plan = steps,
            StateDelta::Step(record) => self.history.push(record),
            StateDelta::Response(text) => self.response = Some(text),
        }
        self
    }

    /// 是否继续循环：终态回复存在且非空则终止
    pub fn should_continue(&self) -> bool {
        !matches!(&self.response, Some(r) if !r.is_empty())
    }

    /// 下一个要执行的步骤（计划头部）
    pub fn next_step(&self) -> Option<&str> {
        self.plan.first().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_plan_replaces_wholesale() {
        let state = OrchestrationState::new("goal")
            .apply(StateDelta::Plan(vec!["a".into(), "b".into()]))
            .apply(StateDelta::Plan(vec!["c".into()]));
        assert_eq!(state.plan, vec!["c".to_string()]);
    }

    #[test]
    fn test_apply_step_appends_in_order() {
        let state = OrchestrationState::new("goal")
            .apply(StateDelta::Step(StepRecord::new("s1", "r1")))
            .apply(StateDelta::Step(StepRecord::new("s2", "r2")));
        assert_eq!(state.history.len(), 2);
        assert_eq!(state.history[0].step, "s1");
        assert_eq!(state.history[1].step, "s2");
    }

    #[test]
    fn test_should_continue() {
        let state = OrchestrationState::new("goal");
        assert!(state.should_continue());

        // 空回复不算终态
        let state = state.apply(StateDelta::Response(String::new()));
        assert!(state.should_continue());

        let state = state.apply(StateDelta::Response("done".into()));
        assert!(!state.should_continue());
    }

    #[test]
    fn test_next_step_is_plan_head() {
        let state = OrchestrationState::new("goal")
            .apply(StateDelta::Plan(vec!["first".into(), "second".into()]));
        assert_eq!(state.next_step(), Some("first"));
    }
}
