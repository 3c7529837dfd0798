//! HTTP API 边界
//!
//! POST /api/research 驱动一次完整流水线；error 非空时以 500 返回，
//! 但响应体仍携带已产出的全部部分数据（调用方不得假设出错即无数据）。
//! 会话与反馈路由只是 SessionStore / FeedbackLog 的薄封装。

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::agents::{
    FeedbackAnalysisResult, FeedbackAnalyzer, FeedbackEntry, FeedbackLog, InformationRetriever,
    QueryDeconstructor, ResearchPlan, ResearchPlanner, SummarizedOutput, Summarizer,
};
use crate::config::AppConfig;
use crate::core::{ResearchGraph, ResearchState};
use crate::llm::create_llm_from_config;
use crate::session::{SessionError, SessionStore};
use crate::tools::{SearchProvider, TavilySearch};

/// 应用组件：图、存储与反馈通道，多请求共享
pub struct AppState {
    pub graph: ResearchGraph,
    pub store: SessionStore,
    pub feedback: FeedbackLog,
    pub analyzer: FeedbackAnalyzer,
}

impl AppState {
    /// 从配置与环境变量构建全部组件。
    /// LLM 凭据缺失在此失败；Tavily Key 缺失只降级检索，不阻止启动。
    pub fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        let llm = create_llm_from_config(cfg)?;

        let search: Option<Arc<dyn SearchProvider>> = match std::env::var("TAVILY_API_KEY") {
            Ok(key) if !key.is_empty() => Some(Arc::new(TavilySearch::new(
                key,
                cfg.search.timeout_secs,
                cfg.search.max_results,
            ))),
            _ => {
                tracing::warn!("TAVILY_API_KEY not set, retrieval degrades to placeholder content");
                None
            }
        };

        let store = SessionStore::new(cfg.sessions.dir.clone())?;
        let graph = ResearchGraph::new(
            QueryDeconstructor::new(llm.clone()),
            InformationRetriever::new(search),
            ResearchPlanner::new(llm.clone()),
            Summarizer::new(llm.clone()),
            store.clone(),
        );
        let feedback = FeedbackLog::new(cfg.feedback.log_path.clone());
        let analyzer = FeedbackAnalyzer::new(feedback.clone(), llm);

        Ok(Self {
            graph,
            store,
            feedback,
            analyzer,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ResearchRequest {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct ResearchResponse {
    pub original_query: String,
    pub deconstructed_queries: Option<Vec<String>>,
    pub retrieved_information: Option<serde_json::Map<String, serde_json::Value>>,
    pub plan: Option<ResearchPlan>,
    pub summary: Option<SummarizedOutput>,
    pub error: Option<String>,
}

impl ResearchResponse {
    fn from_state(state: ResearchState) -> Self {
        let retrieved_information = state.retrieved_map();
        Self {
            original_query: state.original_query,
            deconstructed_queries: state.sub_queries,
            retrieved_information,
            plan: state.plan,
            summary: state.summary,
            error: state.error,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/research", post(api_research))
        .route("/api/sessions", get(api_sessions_list))
        .route("/api/sessions/:id", get(api_session_get))
        .route("/api/feedback", post(api_feedback))
        .route("/api/feedback/analyze", get(api_feedback_analyze))
        .route("/api/health", get(|| async { "OK" }))
        .with_state(state)
}

async fn index() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Welcome to the Sage research API. Use the /api/research endpoint to make requests."
    }))
}

/// POST /api/research：跑一次完整流水线；error 非空 -> 500 + 部分数据
async fn api_research(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResearchRequest>,
) -> (StatusCode, Json<ResearchResponse>) {
    tracing::info!(query = %req.query, "research request");
    let final_state = state.graph.run(&req.query).await;
    let status = if final_state.error.is_some() {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    };
    (status, Json(ResearchResponse::from_state(final_state)))
}

/// GET /api/sessions：全部记录 id，时间倒序
async fn api_sessions_list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<String>>, (StatusCode, String)> {
    state
        .store
        .list()
        .map(Json)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

/// GET /api/sessions/:id：单条记录，未知 id 返回 404
async fn api_session_get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    match state.store.get(&id) {
        Ok(record) => Ok(Json(record)),
        Err(SessionError::NotFound(_)) => Err((
            StatusCode::NOT_FOUND,
            "Session file not found".to_string(),
        )),
        Err(e) => Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}

/// POST /api/feedback：追加一条反馈；缺省时间戳由服务端补全
async fn api_feedback(
    State(state): State<Arc<AppState>>,
    Json(mut entry): Json<FeedbackEntry>,
) -> Result<(StatusCode, Json<serde_json::Value>), (StatusCode, String)> {
    if !(1..=5).contains(&entry.rating) {
        return Err((
            StatusCode::BAD_REQUEST,
            "rating must be between 1 and 5".to_string(),
        ));
    }
    if entry.timestamp.trim().is_empty() {
        entry.timestamp = chrono::Utc::now().to_rfc3339();
    }
    state
        .feedback
        .record(&entry)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Failed to record feedback: {}", e)))?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Feedback recorded successfully",
            "feedback_id": entry.timestamp,
        })),
    ))
}

/// GET /api/feedback/analyze：分析全部已持久化反馈；分析错误在响应体内报告
async fn api_feedback_analyze(
    State(state): State<Arc<AppState>>,
) -> Json<FeedbackAnalysisResult> {
    Json(state.analyzer.analyze().await)
}
