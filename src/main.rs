//! Waggle - Plan → Execute → Replan 智能体编排循环
//!
//! 入口：初始化日志、加载配置、注册内置工具并对命令行给出的目标跑一次编排。

use std::sync::Arc;

use anyhow::Context;

use waggle::config::load_config;
use waggle::core::OrchestratorBuilder;
use waggle::llm::{LlmClient, OpenAiClient};
use waggle::plan_execute::TracingSink;
use waggle::tools::{CalculatorTool, DatabaseTool, ToolRegistry, WeatherTool};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    waggle::observability::init();

    let cfg = load_config(None).context("Failed to load config")?;

    let objective: String = {
        let args: Vec<String> = std::env::args().skip(1).collect();
        if args.is_empty() {
            "what is the weather in Tokyo, and what is 25+75?".to_string()
        } else {
            args.join(" ")
        }
    };

    let llm: Arc<dyn LlmClient> = Arc::new(OpenAiClient::new(
        cfg.llm.base_url.as_deref(),
        &cfg.llm.model,
        None,
    ));

    let mut registry = ToolRegistry::new();
    registry.register(CalculatorTool)?;
    registry.register(WeatherTool)?;
    registry.register(DatabaseTool)?;

    let mut builder = OrchestratorBuilder::new(llm)
        .with_config(&cfg)
        .with_registry(registry)
        .with_sink(Arc::new(TracingSink));

    // 规划/重规划可用单独的（通常更强的）模型
    if let Some(planner_model) = cfg.llm.planner_model.as_deref() {
        let think: Arc<dyn LlmClient> = Arc::new(OpenAiClient::new(
            cfg.llm.base_url.as_deref(),
            planner_model,
            None,
        ));
        builder = builder
            .with_planner_llm(think.clone())
            .with_replanner_llm(think);
    }

    let orchestrator = builder.build().context("Failed to build orchestrator")?;

    let result = orchestrator
        .run(&objective)
        .await
        .context("Orchestration failed")?;

    println!("{}", result.response);
    Ok(())
}
