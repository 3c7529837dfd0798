//! Deconstructor Agent：把复杂问题拆成可独立检索的子问题

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::agents::parse_structured;
use crate::core::AgentError;
use crate::llm::{LlmClient, Message};

/// 拆解输出：子问题列表
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeconstructedQueries {
    pub queries: Vec<String>,
}

const SYSTEM_PROMPT: &str = "You are an expert query deconstructor. Your task is to break down \
a complex user query into smaller, manageable, and specific sub-queries that can be independently \
researched. Respond with ONLY a JSON object of the form {\"queries\": [\"...\", \"...\"]}.";

/// 拆解 Agent：一次模板化 LLM 调用，无内部重试、无跨调用状态
#[derive(Clone)]
pub struct QueryDeconstructor {
    llm: Arc<dyn LlmClient>,
}

impl QueryDeconstructor {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    pub async fn deconstruct(&self, query: &str) -> Result<DeconstructedQueries, AgentError> {
        let messages = vec![Message::system(SYSTEM_PROMPT), Message::user(query)];
        let output = self
            .llm
            .complete(&messages)
            .await
            .map_err(AgentError::LlmError)?;
        parse_structured(&output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;

    #[tokio::test]
    async fn test_deconstruct_parses_queries() {
        let llm = Arc::new(MockLlmClient::with_responses([
            r#"{"queries": ["What causes a black hole to form?", "What is the event horizon?"]}"#,
        ]));
        let agent = QueryDeconstructor::new(llm);
        let out = agent.deconstruct("Explain black holes").await.unwrap();
        assert_eq!(out.queries.len(), 2);
    }

    #[tokio::test]
    async fn test_deconstruct_llm_failure() {
        let llm = Arc::new(MockLlmClient::new());
        llm.push_err("connection refused");
        let agent = QueryDeconstructor::new(llm);
        let err = agent.deconstruct("anything").await.unwrap_err();
        assert!(matches!(err, AgentError::LlmError(_)));
    }

    #[tokio::test]
    async fn test_deconstruct_unparsable_output() {
        let llm = Arc::new(MockLlmClient::with_responses(["I cannot do that"]));
        let agent = QueryDeconstructor::new(llm);
        let err = agent.deconstruct("anything").await.unwrap_err();
        assert!(matches!(err, AgentError::JsonParseError(_)));
    }
}
