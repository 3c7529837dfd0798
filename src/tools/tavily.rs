//! Tavily 检索客户端：带超时的 JSON POST，结果正文按行拼接
//!
//! API Key 由构造方显式传入；未配置时由 Retriever 走降级路径，这里不做判断。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Tavily 搜索端点
const TAVILY_API_URL: &str = "https://api.tavily.com/search";

/// 检索后端抽象：给定查询返回拼接后的正文；空字符串表示无结果
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<String, String>;
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Deserialize)]
struct SearchResult {
    #[serde(default)]
    content: String,
}

/// Tavily 客户端：超时与结果数由配置决定
pub struct TavilySearch {
    client: Client,
    api_key: String,
    max_results: usize,
}

impl TavilySearch {
    pub fn new(api_key: impl Into<String>, timeout_secs: u64, max_results: usize) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            client,
            api_key: api_key.into(),
            max_results,
        }
    }
}

#[async_trait]
impl SearchProvider for TavilySearch {
    async fn search(&self, query: &str) -> Result<String, String> {
        let request = SearchRequest {
            api_key: &self.api_key,
            query,
            max_results: self.max_results,
        };
        let resp = self
            .client
            .post(TAVILY_API_URL)
            .json(&request)
            .send()
            .await
            .map_err(|e| format!("Request failed: {}", e))?;
        if !resp.status().is_success() {
            return Err(format!("HTTP {}", resp.status()));
        }
        let body: SearchResponse = resp
            .json()
            .await
            .map_err(|e| format!("Read body: {}", e))?;

        let joined = body
            .results
            .iter()
            .map(|r| r.content.as_str())
            .filter(|c| !c.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        Ok(joined)
    }
}
