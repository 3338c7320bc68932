//! 工具注册表
//!
//! 所有工具实现 Tool trait（name / description / parameters / execute），由 ToolRegistry
//! 按名注册与查找。注册即显式登记，不做运行时反射扫描；重名在注册期立即报错。
//! 注册完成后 discover 产出只读的 ToolDescriptor 目录，供 Planner / Replanner /
//! StepExecutor 共享。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::core::AgentError;

/// 工具参数元数据：名称、类型、必填或默认值
#[derive(Debug, Clone, Serialize)]
pub struct ToolParam {
    pub name: String,
    /// JSON 基本类型名，如 string / number
    pub param_type: String,
    pub required: bool,
    /// 非必填时的默认值
    pub default: Option<Value>,
}

impl ToolParam {
    /// 必填参数
    pub fn required(name: impl Into<String>, param_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            required: true,
            default: None,
        }
    }

    /// 带默认值的可选参数
    pub fn optional(
        name: impl Into<String>,
        param_type: impl Into<String>,
        default: Value,
    ) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            required: false,
            default: Some(default),
        }
    }
}

/// 工具描述符：注册期构建一次，之后只读
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ToolParam>,
}

impl ToolDescriptor {
    /// 渲染为目录行：`name: description (args: a: string, b?: number)`
    pub fn catalog_line(&self) -> String {
        if self.parameters.is_empty() {
            return format!("{}: {}", self.name, self.description);
        }
        let params: Vec<String> = self
            .parameters
            .iter()
            .map(|p| {
                if p.required {
                    format!("{}: {}", p.name, p.param_type)
                } else {
                    format!("{}?: {}", p.name, p.param_type)
                }
            })
            .collect();
        format!(
            "{}: {} (args: {})",
            self.name,
            self.description,
            params.join(", ")
        )
    }
}

/// 工具 trait：名称、描述（供 LLM 理解）、参数元数据、异步执行（args 为 JSON）
#[async_trait]
pub trait Tool: Send + Sync {
    /// 工具名称（用于 JSON 中的 "tool" 字段）
    fn name(&self) -> &str;

    /// 工具描述（供 LLM 理解功能）
    fn description(&self) -> &str;

    /// 参数元数据；默认无参数
    fn parameters(&self) -> Vec<ToolParam> {
        Vec::new()
    }

    /// 执行工具
    async fn execute(&self, args: Value) -> Result<String, String>;
}

/// 工具注册表：按名称存储 Arc<dyn Tool>，保持注册顺序，支持 register / resolve / discover
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册一个工具；重名立即返回 DuplicateTool
    pub fn register(&mut self, tool: impl Tool + 'static) -> Result<(), AgentError> {
        let name = tool.name().to_string();
        if self.index.contains_key(&name) {
            return Err(AgentError::DuplicateTool(name));
        }
        self.index.insert(name, self.tools.len());
        self.tools.push(Arc::new(tool));
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// 按名查找可调用工具
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.index.get(name).map(|&i| self.tools[i].clone())
    }

    /// 产出描述符目录（注册顺序稳定）
    pub fn discover(&self) -> Vec<ToolDescriptor> {
        self.tools
            .iter()
            .map(|t| ToolDescriptor {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters(),
            })
            .collect()
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name().to_string()).collect()
    }

    /// 渲染 prompt 中的 Available tools 段落
    pub fn catalog_text(&self) -> String {
        self.discover()
            .iter()
            .map(ToolDescriptor::catalog_line)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
