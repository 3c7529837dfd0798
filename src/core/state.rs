//! 流水线状态：贯穿各节点的 ResearchState
//!
//! 节点采用不可变更新：取走旧状态，返回派生出的新状态，从不共享可变内存，
//! 因此每个转移都可以用相等性断言单独测试。

use crate::agents::{ResearchPlan, SummarizedOutput};

/// 单个子问题的检索结果。
///
/// 降级（未配置检索后端 / 空结果）与失败（后端出错）都是「值」而非异常，
/// 下游按标签过滤，不做字符串前缀匹配；text 保留对用户可见的原始文案。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Retrieved {
    /// 检索成功，携带正文
    Content(String),
    /// 检索后端不可用或无结果，携带占位文案
    Degraded(String),
    /// 检索后端出错，携带错误文案
    Failed(String),
}

impl Retrieved {
    /// 对用户/持久化可见的文本
    pub fn text(&self) -> &str {
        match self {
            Retrieved::Content(s) | Retrieved::Degraded(s) | Retrieved::Failed(s) => s,
        }
    }

    /// 是否可用于总结（只有真实检索到的内容可用）
    pub fn is_usable(&self) -> bool {
        matches!(self, Retrieved::Content(_))
    }
}

/// 检索映射中的一项；Vec 保序，键为子问题本身
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetrievedEntry {
    pub query: String,
    pub info: Retrieved,
}

/// 贯穿流水线的共享状态
#[derive(Clone, Debug, PartialEq)]
pub struct ResearchState {
    /// 原始问题，进入流水线后不再变化
    pub original_query: String,
    /// 拆解出的子问题，Deconstruct 成功前为 None
    pub sub_queries: Option<Vec<String>>,
    /// 检索结果，与 sub_queries 同序；单个子问题的失败是值而非缺位
    pub retrieved: Option<Vec<RetrievedEntry>>,
    /// 综合计划，仅 Plan 成功时为 Some
    pub plan: Option<ResearchPlan>,
    /// 最终摘要；只要到达 Summarize 节点必为 Some（成功或回退文案）
    pub summary: Option<SummarizedOutput>,
    /// 错误累积器，多次失败用 "; " 连接，保留发生顺序
    pub error: Option<String>,
}

impl ResearchState {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            original_query: query.into(),
            sub_queries: None,
            retrieved: None,
            plan: None,
            summary: None,
            error: None,
        }
    }

    /// retrieved 转为保序 JSON 对象（子问题 -> 文本），供会话记录与 API 响应共用
    pub fn retrieved_map(&self) -> Option<serde_json::Map<String, serde_json::Value>> {
        self.retrieved.as_ref().map(|entries| {
            entries
                .iter()
                .map(|e| {
                    (
                        e.query.clone(),
                        serde_json::Value::String(e.info.text().to_string()),
                    )
                })
                .collect()
        })
    }
}

/// 向错误累积器追加一条，已有内容时用 "; " 连接
pub fn push_error(existing: Option<String>, new: impl Into<String>) -> Option<String> {
    let new = new.into();
    Some(match existing {
        Some(prev) => format!("{}; {}", prev, new),
        None => new,
    })
}
