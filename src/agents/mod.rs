//! Agent 层：四个步骤 Agent（拆解 / 检索 / 计划 / 摘要）与反馈侧通道
//!
//! 每个步骤 Agent 是对生成后端的一次模板化调用：输入齐备由编排器保证，
//! 失败携带原始错误文本，无内部重试，也无跨调用状态。

pub mod deconstructor;
pub mod feedback;
pub mod feedback_analyzer;
pub mod planner;
pub mod retriever;
pub mod structured;
pub mod summarizer;

pub use deconstructor::{DeconstructedQueries, QueryDeconstructor};
pub use feedback::{FeedbackEntry, FeedbackLog};
pub use feedback_analyzer::{FeedbackAnalysisResult, FeedbackAnalyzer};
pub use planner::{ResearchPlan, ResearchPlanner};
pub use retriever::InformationRetriever;
pub use structured::parse_structured;
pub use summarizer::{SummarizedOutput, Summarizer, NO_VALID_INFORMATION};
