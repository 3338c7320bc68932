//! Waggle - Plan → Execute → Replan 智能体编排循环
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 编排状态、状态增量、主控状态机（Orchestrator）
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / Mock），结构化输出调用
//! - **observability**: 日志初始化
//! - **plan_execute**: Planner、StepExecutor、Replanner 与过程事件
//! - **tools**: 工具注册表、执行器与内置工具（calculator / weather / database）

pub mod config;
pub mod core;
pub mod llm;
pub mod observability;
pub mod plan_execute;
pub mod tools;

pub use crate::core::{AgentError, Orchestrator, OrchestratorBuilder};
pub use crate::plan_execute::{Action, FinalResponse, Plan};
