//! 核心层：流水线状态、编排状态机与错误类型

pub mod error;
pub mod graph;
pub mod state;

pub use error::AgentError;
pub use graph::{Node, ResearchGraph};
pub use state::{push_error, ResearchState, Retrieved, RetrievedEntry};
