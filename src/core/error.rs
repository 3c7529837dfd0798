//! Agent 错误类型
//!
//! 四个步骤 Agent 的失败统一为「生成失败」：后端调用出错，或输出无法
//! 解析为预期的结构化形状。错误在图节点边界被吸收进状态的 error 字段，
//! 从不向 run() 之外传播。

use thiserror::Error;

/// Agent 调用生成后端过程中可能出现的错误
#[derive(Error, Debug)]
pub enum AgentError {
    /// 后端调用失败（网络、超时、API 错误）
    #[error("LLM error: {0}")]
    LlmError(String),

    /// 输出无法解析为预期的结构化形状
    #[error("JSON parse error: {0}")]
    JsonParseError(String),
}
