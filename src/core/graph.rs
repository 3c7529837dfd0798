//! 研究流水线编排器：有向图 + 条件路由
//!
//! 节点：Deconstruct -> Retrieve -> Plan -> Summarize，外加 ErrorHandler 汇点
//! 与 Done 终点。每个节点结束后用显式转移表（当前节点 × 状态谓词）决定下一步；
//! Plan 失败不致命（仍尝试 Summarize），其余错误进 ErrorHandler。
//! 整个节点循环跑在独立任务里：节点内的 panic 在最外层被转换为带灾难哨兵
//! 的合成终态，且该终态不落盘。

use crate::agents::{
    InformationRetriever, QueryDeconstructor, ResearchPlanner, SummarizedOutput, Summarizer,
    NO_VALID_INFORMATION,
};
use crate::core::{push_error, ResearchState, RetrievedEntry};
use crate::session::SessionStore;

/// 步数上限：转移逻辑若意外成环，整次运行强制终止
const MAX_GRAPH_STEPS: usize = 15;

/// 图节点
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Node {
    Deconstruct,
    Retrieve,
    Plan,
    Summarize,
    ErrorHandler,
    Done,
}

/// 错误文本是否源自 Plan 步骤（Plan 失败被视为非致命）
fn is_planner_error(error: &str) -> bool {
    error.contains("Failed to create plan")
}

/// 转移表：当前节点 × 状态谓词 -> 下一节点。
///
/// 逐条对应路由规则：先查错误（规则 1），再按字段就位情况推进（规则 2-5），
/// 拆解静默无产出视为内部不一致（规则 6），其余组合防御性走 Done（规则 7）。
pub(crate) fn next_node(current: Node, state: &ResearchState) -> Node {
    // ErrorHandler 只有一条固定出边
    if current == Node::ErrorHandler {
        return Node::Done;
    }

    // 规则 1：非 Plan 来源的错误一律进 ErrorHandler
    if let Some(error) = &state.error {
        if !is_planner_error(error) {
            return Node::ErrorHandler;
        }
    }

    match current {
        Node::Deconstruct => {
            if state.sub_queries.is_some() && state.retrieved.is_none() {
                Node::Retrieve
            } else if state.sub_queries.is_none() && state.error.is_none() {
                // 拆解既无子问题也无错误：静默失败，视为内部不一致
                Node::ErrorHandler
            } else {
                unexpected(current, state)
            }
        }
        Node::Retrieve => {
            if state.retrieved.is_some() && state.plan.is_none() {
                Node::Plan
            } else {
                unexpected(current, state)
            }
        }
        Node::Plan => {
            // Plan 成功，或 Plan 尝试过但无产出（失败/跳过），都继续 Summarize
            if state.summary.is_none() && (state.plan.is_some() || state.retrieved.is_some()) {
                Node::Summarize
            } else if state.summary.is_some() {
                Node::Done
            } else {
                unexpected(current, state)
            }
        }
        Node::Summarize => {
            if state.summary.is_some() {
                Node::Done
            } else {
                unexpected(current, state)
            }
        }
        Node::ErrorHandler | Node::Done => Node::Done,
    }
}

fn unexpected(current: Node, state: &ResearchState) -> Node {
    tracing::warn!(
        ?current,
        ?state,
        "transition reached an unexpected state combination, routing to Done"
    );
    Node::Done
}

/// 流水线编排器：持有四个步骤 Agent 与会话存储，run 为唯一入口
#[derive(Clone)]
pub struct ResearchGraph {
    deconstructor: QueryDeconstructor,
    retriever: InformationRetriever,
    planner: ResearchPlanner,
    summarizer: Summarizer,
    store: SessionStore,
}

impl ResearchGraph {
    pub fn new(
        deconstructor: QueryDeconstructor,
        retriever: InformationRetriever,
        planner: ResearchPlanner,
        summarizer: Summarizer,
        store: SessionStore,
    ) -> Self {
        Self {
            deconstructor,
            retriever,
            planner,
            summarizer,
            store,
        }
    }

    /// 执行一次完整运行并持久化终态。永不失败：节点级失败吸收进 error 字段，
    /// 驱动层 panic 转换为灾难哨兵终态（该终态不落盘）。
    pub async fn run(&self, query: &str) -> ResearchState {
        tracing::info!(query = %query, "graph invoking");

        let this = self.clone();
        let owned_query = query.to_string();
        let final_state = match tokio::spawn(async move { this.execute(owned_query).await }).await
        {
            Ok(state) => state,
            Err(e) => {
                tracing::error!(error = %e, "graph driver failed outside any node");
                let mut state = ResearchState::new(query);
                state.error = Some(format!("Critical error during graph execution: {}", e));
                state
            }
        };

        match self.store.save(&final_state) {
            Ok(Some(id)) => tracing::info!(id = %id, "run persisted"),
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "error saving session"),
        }

        final_state
    }

    /// 节点循环：每个节点结束后查转移表，步数超限强制终止
    async fn execute(&self, query: String) -> ResearchState {
        let mut state = ResearchState::new(query);
        let mut node = Node::Deconstruct;

        for _ in 0..MAX_GRAPH_STEPS {
            state = match node {
                Node::Deconstruct => self.deconstruct_node(state).await,
                Node::Retrieve => self.retrieval_node(state).await,
                Node::Plan => self.planner_node(state).await,
                Node::Summarize => self.summarizer_node(state).await,
                Node::ErrorHandler => self.error_handler_node(state),
                Node::Done => return state,
            };
            match next_node(node, &state) {
                Node::Done => return state,
                next => node = next,
            }
        }

        tracing::error!("graph exceeded step bound, aborting run");
        state.error = push_error(
            state.error.take(),
            format!(
                "Recursion limit of {} reached during graph execution.",
                MAX_GRAPH_STEPS
            ),
        );
        state
    }

    /// Deconstruct：成功写入 sub_queries 并清空 error，失败只记录错误
    async fn deconstruct_node(&self, state: ResearchState) -> ResearchState {
        tracing::info!("node: deconstruct");
        match self.deconstructor.deconstruct(&state.original_query).await {
            Ok(output) => ResearchState {
                sub_queries: Some(output.queries),
                error: None,
                ..state
            },
            Err(e) => {
                tracing::warn!(error = %e, "deconstruction failed");
                ResearchState {
                    error: Some(format!("Failed to deconstruct query: {}", e)),
                    ..state
                }
            }
        }
    }

    /// Retrieve：逐个子问题顺序检索，结果与子问题同序；检索本身永不硬失败
    async fn retrieval_node(&self, state: ResearchState) -> ResearchState {
        tracing::info!("node: retrieve");
        if state.error.is_some() {
            tracing::debug!("retrieval skipped due to previous error");
            return state;
        }

        let queries = match &state.sub_queries {
            Some(qs) if !qs.is_empty() => qs.clone(),
            _ => {
                return ResearchState {
                    error: Some("No deconstructed queries to retrieve.".to_string()),
                    ..state
                };
            }
        };

        let mut entries = Vec::with_capacity(queries.len());
        for query in &queries {
            let info = self.retriever.retrieve(query).await;
            entries.push(RetrievedEntry {
                query: query.clone(),
                info,
            });
        }

        ResearchState {
            retrieved: Some(entries),
            ..state
        }
    }

    /// Plan：前置错误或输入缺失则跳过；失败追加错误但不阻断 Summarize
    async fn planner_node(&self, state: ResearchState) -> ResearchState {
        tracing::info!("node: plan");
        if state.error.is_some() || state.sub_queries.is_none() || state.retrieved.is_none() {
            tracing::debug!("planning skipped due to previous error or missing data");
            return ResearchState {
                plan: None,
                summary: None,
                ..state
            };
        }

        let sub_queries = state.sub_queries.clone().unwrap_or_default();
        let retrieved = state.retrieved.clone().unwrap_or_default();
        match self
            .planner
            .create_plan(&state.original_query, &sub_queries, &retrieved)
            .await
        {
            Ok(plan) => ResearchState {
                plan: Some(plan),
                ..state
            },
            Err(e) => {
                tracing::warn!(error = %e, "planning failed");
                let error = push_error(state.error.clone(), format!("Failed to create plan: {}", e));
                ResearchState {
                    plan: None,
                    summary: None,
                    error,
                    ..state
                }
            }
        }
    }

    /// Summarize：无可用检索内容直接写回退摘要；失败时摘要字段仍保证非空
    async fn summarizer_node(&self, state: ResearchState) -> ResearchState {
        tracing::info!("node: summarize");
        let usable = state
            .retrieved
            .as_ref()
            .map(|entries| entries.iter().any(|e| e.info.is_usable()))
            .unwrap_or(false);
        if !usable {
            tracing::debug!("summarizing skipped due to missing or unusable retrieved data");
            return ResearchState {
                summary: Some(SummarizedOutput {
                    summary: NO_VALID_INFORMATION.to_string(),
                }),
                ..state
            };
        }

        let retrieved = state.retrieved.clone().unwrap_or_default();
        match self.summarizer.summarize(&retrieved).await {
            Ok(summary) => ResearchState {
                summary: Some(summary),
                ..state
            },
            Err(e) => {
                tracing::warn!(error = %e, "summarization failed");
                let error = push_error(
                    state.error.clone(),
                    format!("Failed to summarize information: {}", e),
                );
                ResearchState {
                    summary: Some(SummarizedOutput {
                        summary: format!("Failed to generate summary: {}", e),
                    }),
                    error,
                    ..state
                }
            }
        }
    }

    /// ErrorHandler：纯路由汇点，状态原样通过
    fn error_handler_node(&self, state: ResearchState) -> ResearchState {
        tracing::info!(error = ?state.error, "node: error handler");
        state
    }
}
