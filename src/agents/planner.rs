//! Planner Agent：根据原问题、子问题与检索结果生成综合计划

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::agents::parse_structured;
use crate::core::{AgentError, RetrievedEntry};
use crate::llm::{LlmClient, Message};

/// 计划输出：执行步骤与综合问题
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchPlan {
    pub plan_steps: Vec<String>,
    pub synthesis_questions: Vec<String>,
}

const SYSTEM_PROMPT: &str = "You are an expert research planner. Given a main query, \
deconstructed sub-queries, and retrieved information, create a plan to synthesize this \
information and answer the main query. Respond with ONLY a JSON object of the form \
{\"plan_steps\": [\"...\"], \"synthesis_questions\": [\"...\"]}.";

/// 计划 Agent：一次模板化 LLM 调用
#[derive(Clone)]
pub struct ResearchPlanner {
    llm: Arc<dyn LlmClient>,
}

impl ResearchPlanner {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    pub async fn create_plan(
        &self,
        original_query: &str,
        sub_queries: &[String],
        retrieved: &[RetrievedEntry],
    ) -> Result<ResearchPlan, AgentError> {
        let sub_query_list = sub_queries
            .iter()
            .map(|q| format!("- {}", q))
            .collect::<Vec<_>>()
            .join("\n");
        let retrieved_block = retrieved
            .iter()
            .map(|e| format!("'{}': {}", e.query, e.info.text()))
            .collect::<Vec<_>>()
            .join("\n");
        let human = format!(
            "Main Query: {}\n\nDeconstructed Queries:\n{}\n\nRetrieved Information:\n{}\n\nCreate a research plan.",
            original_query, sub_query_list, retrieved_block
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
