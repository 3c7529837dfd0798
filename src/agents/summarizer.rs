//! Summarizer Agent：汇总可用检索内容并生成摘要
//!
//! 先按标签过滤掉降级/失败的条目；若没有任何可用内容则直接返回固定
//! 回退文案，不调用模型。

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::agents::parse_structured;
use crate::core::{AgentError, RetrievedEntry};
use crate::llm::{LlmClient, Message};

/// 无可用内容时的固定回退摘要
pub const NO_VALID_INFORMATION: &str = "No valid information was available to summarize.";

/// 摘要输出
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarizedOutput {
    pub summary: String,
}

const SYSTEM_PROMPT: &str = "You are an expert summarizer. Your task is to create a concise and \
coherent summary of the provided text. Focus on the key information and present it clearly. \
Respond with ONLY a JSON object of the form {\"summary\": \"...\"}.";

/// 摘要 Agent：一次模板化 LLM 调用
#[derive(Clone)]
pub struct Summarizer {
    llm: Arc<dyn LlmClient>,
}

impl Summarizer {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    pub async fn summarize(
        &self,
        retrieved: &[RetrievedEntry],
    ) -> Result<SummarizedOutput, AgentError> {
        let combined: Vec<String> = retrieved
            .iter()
            .filter(|e| e.info.is_usable())
            .map(|e| format!("Information regarding '{}':\n{}\n---", e.query, e.info.text()))
            .collect();

        if combined.is_empty() {
            return Ok(SummarizedOutput {
                summary: NO_VALID_INFORMATION.to_string(),
            });
        }

        let human = format!(
            "Please summarize the following information:\n\n{}\n\nProvide a concise summary.",
            combined.join("\n\n")
        );
        let messages = vec![Message::system(SYSTEM_PROMPT), Message::user(human)];
        let output = self
            .llm
            .complete(&messages)
            .await
            .map_err(AgentError::LlmError)?;
        parse_structured(&output)
    }
}
