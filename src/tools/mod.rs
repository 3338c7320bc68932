//! 工具箱：注册表、执行器与内置工具（calculator / weather / database）

pub mod calculator;
pub mod database;
pub mod executor;
pub mod registry;
pub mod weather;

pub use calculator::CalculatorTool;
pub use database::DatabaseTool;
pub use executor::ToolExecutor;
pub use registry::{Tool, ToolDescriptor, ToolParam, ToolRegistry};
pub use weather::WeatherTool;
