//! 结构化输出契约：所有面向模型的调用必须符合的结果形状
//!
//! Plan / FinalResponse 对应原型中的 result_type；Action 是 Replanner 的二选一输出，
//! 由 Orchestrator 穷尽匹配。

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// 有序执行计划
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Plan {
    /// 按执行顺序排列的步骤描述
    pub steps: Vec<String>,
}

/// 终态回复：结束一次编排运行的最终答案
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FinalResponse {
    /// 给用户的最终答案文本
    pub response: String,
}

/// Replanner 输出：回复用户或继续执行剩余计划，二者恰居其一
///
/// untagged：两个变体字段不同（response vs steps），可无歧义区分
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Action {
    /// 历史已足以回答目标，返回最终回复
    Respond(FinalResponse),
    /// 继续执行：仅包含尚未完成的步骤
    Continue(Plan),
}
