//! LLM 层：客户端抽象与实现（OpenAI 兼容 / DeepSeek / Mock）

pub mod deepseek;
pub mod message;
pub mod mock;
pub mod openai;
pub mod traits;

use std::sync::Arc;

use anyhow::{bail, Context};

pub use deepseek::{create_deepseek_client, DEEPSEEK_CHAT};
pub use message::{Message, Role};
pub use mock::MockLlmClient;
pub use openai::{OpenAiClient, TokenUsage};
pub use traits::LlmClient;

use crate::config::AppConfig;

/// 根据配置与环境变量选择 LLM 后端（OpenAI 兼容 / DeepSeek / Mock）。
///
/// 凭据缺失或 provider 未知在此处直接失败，启动期即暴露，而非延迟到首次调用。
pub fn create_llm_from_config(cfg: &AppConfig) -> anyhow::Result<Arc<dyn LlmClient>> {
    match cfg.llm.provider.to_lowercase().as_str() {
        "mock" => {
            tracing::warn!("Using Mock LLM (provider = \"mock\"), responses are not real");
            Ok(Arc::new(MockLlmClient::new()))
        }
        "deepseek" => {
            let api_key = std::env::var("DEEPSEEK_API_KEY")
                .or_else(|_| std::env::var("OPENAI_API_KEY"))
                .context("DEEPSEEK_API_KEY is not set")?;
            tracing::info!("Using DeepSeek LLM ({})", cfg.llm.model);
            Ok(Arc::new(create_deepseek_client(
                &api_key,
                Some(&cfg.llm.model),
            )))
        }
        "openai" => {
            let api_key =
                std::env::var("OPENAI_API_KEY").context("OPENAI_API_KEY is not set")?;
            tracing::info!("Using OpenAI LLM ({})", cfg.llm.model);
            Ok(Arc::new(OpenAiClient::new(
                cfg.llm.base_url.as_deref(),
                &cfg.llm.model,
                &api_key,
            )))
        }
        other => bail!("Unknown LLM provider: {}", other),
    }
}
