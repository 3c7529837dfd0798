//! Mock LLM 客户端（用于测试，无需 API）
//!
//! 按预置队列依次返回脚本化回复，可为每个 Agent 排好结构化 JSON；
//! 队列耗尽时回显最后一条 User 消息，便于无 Key 环境下跑通流程。

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::{LlmClient, Message, Role};

/// Mock 客户端：脚本化回复队列 + 调用计数
#[derive(Debug, Default)]
pub struct MockLlmClient {
    responses: Mutex<VecDeque<Result<String, String>>>,
    calls: AtomicUsize,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置一批按序返回的回复
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(|s| Ok(s.into())).collect()),
            calls: AtomicUsize::new(0),
        }
    }

    /// 追加一条成功回复
    pub fn push_ok(&self, response: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(response.into()));
    }

    /// 追加一条失败回复（模拟后端错误）
    pub fn push_err(&self, error: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(error.into()));
    }

    /// 已发生的 complete 调用次数
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// 队列中剩余的脚本化回复数
    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(scripted) = self.responses.lock().unwrap().pop_front() {
            return scripted;
        }

        let last_user = messages
            .iter()
            .rev()
            .find(|m| matches!(m.role, Role::User))
            .map(|m| m.content.as_str())
            .unwrap_or("(no input)");
        Ok(last_user.to_string())
    }
}
