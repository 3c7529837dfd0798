//! 反馈分析 Agent：统计评分并用 LLM 归纳共性主题

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::agents::FeedbackLog;
use crate::llm::{LlmClient, Message};

/// 分析结果：总数、平均分、归纳摘要；LLM 出错时 error_message 置位
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeedbackAnalysisResult {
    pub total_feedback_entries: usize,
    pub average_rating: Option<f64>,
    pub feedback_summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

const ANALYSIS_PROMPT: &str = "Analyze the following user feedback entries for an AI Research \
Advisor application. Provide a concise summary of common themes, praises, criticisms, and \
suggestions. Focus on actionable insights that could help improve the application.";

/// 反馈分析 Agent：读取日志、算平均分、LLM 摘要
pub struct FeedbackAnalyzer {
    log: FeedbackLog,
    llm: Arc<dyn LlmClient>,
}

impl FeedbackAnalyzer {
    pub fn new(log: FeedbackLog, llm: Arc<dyn LlmClient>) -> Self {
        Self { log, llm }
    }

    pub async fn analyze(&self) -> FeedbackAnalysisResult {
        let entries = self.log.load();

        if entries.is_empty() {
            return FeedbackAnalysisResult {
                total_feedback_entries: 0,
                average_rating: None,
                feedback_summary: Some("No feedback entries found to analyze.".to_string()),
                error_message: None,
            };
        }

        let total = entries.len();
        let average_rating =
            Some(entries.iter().map(|e| e.rating as f64).sum::<f64>() / total as f64);

        let all_texts = entries
            .iter()
            .filter(|e| !e.feedback_text.trim().is_empty())
            .map(|e| format!("- Rating: {}/5, Feedback: {}", e.rating, e.feedback_text))
            .collect::<Vec<_>>()
            .join("\n");

        if all_texts.is_empty() {
            return FeedbackAnalysisResult {
                total_feedback_entries: total,
                average_rating,
                feedback_summary: Some("No textual feedback provided to summarize.".to_string()),
                error_message: None,
            };
        }

        let human = format!("Feedback Entries:\n{}\n\nSummary:", all_texts);
        let messages = vec![Message::system(ANALYSIS_PROMPT), Message::user(human)];
        match self.llm.complete(&messages).await {
            Ok(summary) => FeedbackAnalysisResult {
                total_feedback_entries: total,
                average_rating,
                feedback_summary: Some(summary),
                error_message: None,
            },
            Err(e) => {
                tracing::warn!(error = %e, "feedback summarization failed");
                FeedbackAnalysisResult {
                    total_feedback_entries: total,
                    average_rating,
                    feedback_summary: Some(
                        "Could not generate AI summary due to an error.".to_string(),
                    ),
                    error_message: Some(format!("LLM summarization error: {}", e)),
                }
            }
        }
    }
}
