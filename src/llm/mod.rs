//! LLM 层：客户端抽象与实现（OpenAI 兼容 / Mock），结构化输出调用

pub mod mock;
pub mod openai;
pub mod structured;
pub mod traits;

pub use mock::MockLlmClient;
pub use openai::OpenAiClient;
pub use structured::{extract_json, StructuredLlm};
pub use traits::{LlmClient, LlmError, Message, Role};
