//! 工具层：外部检索后端

pub mod tavily;

pub use tavily::{SearchProvider, TavilySearch};
