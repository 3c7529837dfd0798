//! Sage - Rust 研究助理系统
//!
//! 模块划分：
//! - **agents**: 四个步骤 Agent（拆解 / 检索 / 计划 / 摘要）与反馈侧通道
//! - **api**: HTTP API 边界（research / sessions / feedback 路由）
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 流水线状态、编排状态机与错误类型
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / DeepSeek / Mock）
//! - **session**: 会话持久化（一次运行一条 JSON 记录）
//! - **tools**: 外部检索后端（Tavily）

pub mod agents;
pub mod api;
pub mod config;
pub mod core;
pub mod llm;
pub mod session;
pub mod tools;
