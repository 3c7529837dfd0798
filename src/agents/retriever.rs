//! Retriever Agent：按子问题做 Web 检索，任何情况下都返回值而非错误
//!
//! 检索后端未配置时返回占位内容，后端出错时返回错误文案，空结果返回
//! 无内容文案——三者都不会阻断下游步骤，只是被 Summarize 过滤掉。

use std::sync::Arc;

use crate::core::Retrieved;
use crate::tools::SearchProvider;

/// 检索 Agent：持有可选的检索后端，retrieve 永不失败
#[derive(Clone)]
pub struct InformationRetriever {
    search: Option<Arc<dyn SearchProvider>>,
}

impl InformationRetriever {
    pub fn new(search: Option<Arc<dyn SearchProvider>>) -> Self {
        Self { search }
    }

    /// 为单个子问题检索信息；降级与失败都表现为带文案的 Retrieved 值
    pub async fn retrieve(&self, sub_query: &str) -> Retrieved {
        let Some(search) = &self.search else {
            return Retrieved::Degraded(format!(
                "Placeholder information for '{}'. (Tavily API key not configured)",
                sub_query
            ));
        };

        tracing::info!(sub_query = %sub_query, "retrieving via search backend");
        match search.search(sub_query).await {
            Ok(content) if content.trim().is_empty() => Retrieved::Degraded(format!(
                "No content found by Tavily for '{}'.",
                sub_query
            )),
            Ok(content) => Retrieved::Content(content),
            Err(e) => {
                tracing::warn!(sub_query = %sub_query, error = %e, "search backend failed");
                Retrieved::Failed(format!(
                    "Error retrieving information for '{}' using Tavily: {}",
                    sub_query, e
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedSearch(Result<String, String>);

    #[async_trait]
    impl SearchProvider for FixedSearch {
        async fn search(&self, _query: &str) -> Result<String, String> {
            self.0.clone()
        }
    }

    #[tokio::test]
    async fn test_retrieve_without_backend_is_degraded() {
        let agent = InformationRetriever::new(None);
        let out = agent.retrieve("q1").await;
        assert_eq!(
            out,
            Retrieved::Degraded(
                "Placeholder information for 'q1'. (Tavily API key not configured)".into()
            )
        );
    }

    #[tokio::test]
    async fn test_retrieve_backend_error_is_failed_value() {
        let agent = InformationRetriever::new(Some(Arc::new(FixedSearch(Err(
            "HTTP 503 Service Unavailable".into(),
        )))));
        let out = agent.retrieve("q1").await;
        match out {
            Retrieved::Failed(text) => {
                assert!(text.contains("Error retrieving information for 'q1'"));
                assert!(text.contains("HTTP 503"));
            }
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_retrieve_empty_result_is_degraded() {
        let agent = InformationRetriever::new(Some(Arc::new(FixedSearch(Ok(String::new())))));
        let out = agent.retrieve("q1").await;
        assert_eq!(
            out,
            Retrieved::Degraded("No content found by Tavily for 'q1'.".into())
        );
    }

    #[tokio::test]
    async fn test_retrieve_content() {
        let agent =
            InformationRetriever::new(Some(Arc::new(FixedSearch(Ok("real content".into())))));
        assert_eq!(
            agent.retrieve("q1").await,
            Retrieved::Content("real content".into())
        );
    }
}
