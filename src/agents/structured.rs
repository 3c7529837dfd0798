//! 结构化输出解析
//!
//! 各 Agent 要求 LLM 仅输出一个 JSON 对象；从文本中提取 JSON 块
//! （```json 围栏或最外层大括号）并反序列化为目标结构。

use serde::de::DeserializeOwned;

use crate::core::AgentError;

/// 从 LLM 输出中提取 JSON 并解析为目标结构；无 JSON 或解析失败均为 JsonParseError
pub fn parse_structured<T: DeserializeOwned>(output: &str) -> Result<T, AgentError> {
    let trimmed = output.trim();

    // 尝试提取 JSON 块（```json ... ``` 或纯 JSON）
    let json_str = if let Some(start) = trimmed.find("```json") {
        let rest = &trimmed[start + 7..];
        rest.find("```")
            .map(|end| rest[..end].trim())
            .unwrap_or_else(|| rest.trim())
    } else if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        &trimmed[start..=end]
    } else {
        return Err(AgentError::JsonParseError(format!(
            "no JSON object in output: {}",
            trimmed
        )));
    };

    serde_json::from_str(json_str)
        .map_err(|e| AgentError::JsonParseError(format!("{}: {}", e, json_str)))
}
