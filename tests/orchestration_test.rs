//! 编排循环集成测试：用脚本化 Mock LLM 驱动完整的 Plan → Execute → Replan 流程

use std::sync::Arc;

use tokio::sync::mpsc;

use waggle::core::OrchestratorBuilder;
use waggle::llm::MockLlmClient;
use waggle::plan_execute::{AgentEvent, ChannelSink};
use waggle::tools::{CalculatorTool, DatabaseTool, ToolRegistry, WeatherTool};

fn builtin_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(CalculatorTool).unwrap();
    registry.register(WeatherTool).unwrap();
    registry.register(DatabaseTool).unwrap();
    registry
}

fn scripted(responses: &[&str]) -> Arc<MockLlmClient> {
    Arc::new(MockLlmClient::with_responses(
        responses.iter().map(|s| s.to_string()).collect(),
    ))
}

fn drain(rx: &mut mpsc::UnboundedReceiver<AgentEvent>) -> Vec<AgentEvent> {
    let mut events = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        events.push(ev);
    }
    events
}

/// 场景：东京天气 + 25+75，恰好两个 Execute/Replan 周期后得到包含两个值的终态回复
#[tokio::test]
async fn test_weather_then_math_scenario() {
    let planner_llm = scripted(&[
        r#"{"steps": ["get weather for Tokyo using get_weather", "compute 25+75 using calculator"]}"#,
    ]);
    let executor_llm = scripted(&[
        r#"{"tool": "get_weather", "args": {"location": "Tokyo"}}"#,
        "The weather in Tokyo is 78°F, Sunny.",
        r#"{"tool": "calculator", "args": {"expression": "25+75"}}"#,
        "25+75 is 100.",
    ]);
    let replanner_llm = scripted(&[
        r#"{"steps": ["compute 25+75 using calculator"]}"#,
        r#"{"response": "The weather in Tokyo is 78°F, Sunny, and 25+75 is 100."}"#,
    ]);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let orchestrator = OrchestratorBuilder::new(planner_llm)
        .with_executor_llm(executor_llm)
        .with_replanner_llm(replanner_llm)
        .with_registry(builtin_registry())
        .with_sink(Arc::new(ChannelSink::new(tx)))
        .build()
        .unwrap();

    let result = orchestrator
        .run("weather in Tokyo then 25+75")
        .await
        .unwrap();

    assert!(result.response.contains("78°F"), "got: {}", result.response);
    assert!(result.response.contains("100"), "got: {}", result.response);

    let events = drain(&mut rx);

    // 恰好两次工具调用，两个执行周期
    let tool_calls: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            AgentEvent::ToolCall { tool, result, .. } => Some((tool.clone(), result.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(tool_calls.len(), 2);
    assert_eq!(tool_calls[0].0, "get_weather");
    assert!(tool_calls[0].1.contains("78°F, Sunny"));
    assert_eq!(tool_calls[1].0, "calculator");
    assert!(tool_calls[1].1.contains("100"));

    // 历史顺序不变式：终态快照中历史与计划顺序一致，无重复
    let last_update = events
        .iter()
        .rev()
        .find_map(|e| match e {
            AgentEvent::StepUpdate { history, .. } => Some(history.clone()),
            _ => None,
        })
        .expect("expected at least one step update");
    assert_eq!(last_update.len(), 2);
    assert_eq!(last_update[0].step, "get weather for Tokyo using get_weather");
    assert_eq!(last_update[1].step, "compute 25+75 using calculator");
}

/// 有界终止：Replanner 连续 N 次给出剩余计划后才 Respond，运行必须在有限步内结束
#[tokio::test]
async fn test_terminates_after_n_replans() {
    let planner_llm = scripted(&[r#"{"steps": ["step 1"]}"#]);
    // 每步执行都直接给出文本答案，不调用工具
    let executor_llm = scripted(&["done 1", "done 2", "done 3", "done 4"]);
    let replanner_llm = scripted(&[
        r#"{"steps": ["step 2"]}"#,
        r#"{"steps": ["step 3"]}"#,
        r#"{"steps": ["step 4"]}"#,
        r#"{"response": "all steps done"}"#,
    ]);

    let orchestrator = OrchestratorBuilder::new(planner_llm)
        .with_executor_llm(executor_llm)
        .with_replanner_llm(replanner_llm)
        .with_registry(builtin_registry())
        .build()
        .unwrap();

    let result = orchestrator.run("multi step objective").await.unwrap();
    assert_eq!(result.response, "all steps done");
}

/// 降级步骤：执行侧 LLM 永远失败，run 仍以反映失败的终态回复结束，而非抛错
#[tokio::test]
async fn test_degraded_step_still_yields_final_response() {
    let planner_llm = scripted(&[r#"{"steps": ["fetch the data"]}"#]);
    let executor_llm = Arc::new(MockLlmClient::failing());
    let replanner_llm = scripted(&[
        r#"{"response": "The step could not be completed: the model call failed."}"#,
    ]);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let orchestrator = OrchestratorBuilder::new(planner_llm)
        .with_executor_llm(executor_llm)
        .with_replanner_llm(replanner_llm)
        .with_registry(builtin_registry())
        .with_sink(Arc::new(ChannelSink::new(tx)))
        .build()
        .unwrap();

    let result = orchestrator.run("objective").await.unwrap();
    assert!(result.response.contains("could not be completed"));

    // 降级记录进入历史，结果文本说明失败
    let events = drain(&mut rx);
    let last_update = events
        .iter()
        .rev()
        .find_map(|e| match e {
            AgentEvent::StepUpdate { history, .. } => Some(history.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(last_update.len(), 1);
    assert!(last_update[0].result.contains("Error executing"));
}

/// 失控重规划：Replanner 每次都原样返回同一步骤（缺陷模型），
/// 5 次迭代上限内必须以显式「未能完成」回复终止，而不是死循环
#[tokio::test]
async fn test_buggy_replanner_hits_iteration_cap() {
    let planner_llm = scripted(&[r#"{"steps": ["the only step"]}"#]);
    let executor_llm = scripted(&["ok", "ok", "ok", "ok", "ok"]);
    // 返回的步骤与历史逐字相同，会被过滤为空，于是上一计划被保留，循环重放直到上限
    let same_plan = r#"{"steps": ["the only step"]}"#;
    let replanner_llm = scripted(&[same_plan, same_plan, same_plan, same_plan, same_plan]);

    let orchestrator = OrchestratorBuilder::new(planner_llm)
        .with_executor_llm(executor_llm)
        .with_replanner_llm(replanner_llm)
        .with_registry(builtin_registry())
        .with_max_iterations(5)
        .build()
        .unwrap();

    let result = orchestrator.run("objective").await.unwrap();
    assert!(
        result.response.contains("Could not complete"),
        "got: {}",
        result.response
    );
    assert!(result.response.contains("5 iterations"));
}

/// 重规划失败非致命：Replanner LLM 挂掉时保留上一计划继续，最终由上限收束
#[tokio::test]
async fn test_replan_failure_keeps_previous_plan() {
    let planner_llm = scripted(&[r#"{"steps": ["step a", "step b"]}"#]);
    let executor_llm = scripted(&["done a", "done a again", "done a again"]);
    let replanner_llm = Arc::new(MockLlmClient::failing());

    let orchestrator = OrchestratorBuilder::new(planner_llm)
        .with_executor_llm(executor_llm)
        .with_replanner_llm(replanner_llm)
        .with_registry(builtin_registry())
        .with_max_iterations(3)
        .build()
        .unwrap();

    let result = orchestrator.run("objective").await.unwrap();
    assert!(result.response.contains("Could not complete"));
}

/// 规划失败致命：结构化校验预算耗尽时 run 返回错误，任何步骤都不会执行
#[tokio::test]
async fn test_planning_failure_aborts_run() {
    let planner_llm = scripted(&["not json", "still not json", "nope"]);
    let executor_llm = scripted(&[]);

    let orchestrator = OrchestratorBuilder::new(planner_llm)
        .with_executor_llm(executor_llm)
        .with_registry(builtin_registry())
        .build()
        .unwrap();

    // structured_retries 默认 5，多给几条垃圾回复
    let result = orchestrator.run("objective").await;
    assert!(result.is_err());
}
