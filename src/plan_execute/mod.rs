//! 认知层：Planner、StepExecutor、Replanner、结构化输出契约与过程事件

pub mod events;
pub mod executor;
pub mod output;
pub mod planner;
pub mod replanner;

pub use events::{AgentEvent, ChannelSink, EventSink, NullSink, TracingSink};
pub use executor::StepExecutor;
pub use output::{Action, FinalResponse, Plan};
pub use planner::Planner;
pub use replanner::Replanner;
