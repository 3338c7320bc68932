//! 核心编排层：错误类型、编排状态与增量、主控状态机

pub mod controller;
pub mod error;
pub mod state;

pub use controller::{Orchestrator, OrchestratorBuilder};
pub use error::AgentError;
pub use state::{OrchestrationState, StateDelta, StepRecord};
