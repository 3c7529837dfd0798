//! 会话持久化：每次运行的终态落盘为一个 JSON 文件
//!
//! 文件名由微秒级时间戳导出（session_YYYYmmdd_HHMMSS_ffffff.json），
//! 固定宽度且单调，按字典序倒排即为时间倒序；并发写入靠 create_new
//! 语义检测同名碰撞并用新时间戳重试。

use std::io::Write;
use std::path::PathBuf;

use thiserror::Error;

use crate::core::ResearchState;

/// 驱动层灾难性失败的哨兵文案；命中的状态不落盘
pub const CRITICAL_ERROR_SENTINEL: &str = "Critical error during graph execution";

/// 碰撞重试上限（对抗性时钟下同一微秒重复出现时）
const SAVE_ATTEMPTS: usize = 5;

/// 会话存储错误
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("session not found: {0}")]
    NotFound(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid session record: {0}")]
    Parse(#[from] serde_json::Error),
}

/// 会话存储：目录内一文件一记录，写后不可变
#[derive(Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// 保存终态；灾难性哨兵状态跳过（返回 Ok(None)），否则返回新记录 id
    pub fn save(&self, state: &ResearchState) -> Result<Option<String>, SessionError> {
        if let Some(err) = &state.error {
            if err.contains(CRITICAL_ERROR_SENTINEL) {
                tracing::warn!("session saving skipped due to critical graph execution error");
                return Ok(None);
            }
        }

        let record = to_record(state);
        let json = serde_json::to_string_pretty(&record)?;

        let mut last_err = None;
        for _ in 0..SAVE_ATTEMPTS {
            let id = format!(
                "session_{}",
                chrono::Local::now().format("%Y%m%d_%H%M%S_%6f")
            );
            let path = self.dir.join(format!("{}.json", id));
            match std::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
            {
                Ok(mut file) => {
                    file.write_all(json.as_bytes())?;
                    tracing::info!(id = %id, "session saved");
                    return Ok(Some(id));
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    // 同一微秒内的并发写，换个时间戳再试
                    last_err = Some(e);
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(last_err
            .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "save exhausted"))
            .into())
    }

    /// 列出全部记录 id，时间倒序
    pub fn list(&self) -> Result<Vec<String>, SessionError> {
        let mut ids = Vec::new();
        for entry in std::fs::read_dir(&self.dir)?.flatten() {
            let path = entry.path();
            if path.extension().map_or(true, |e| e != "json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if stem.starts_with("session_") {
                ids.push(stem.to_string());
            }
        }
        // 固定宽度时间戳：字典序倒排即时间倒序
        ids.sort_by(|a, b| b.cmp(a));
        Ok(ids)
    }

    /// 读取单条记录；不存在（或 id 非法）为 NotFound
    pub fn get(&self, id: &str) -> Result<serde_json::Value, SessionError> {
        if !is_valid_id(id) {
            return Err(SessionError::NotFound(id.to_string()));
        }
        let path = self.dir.join(format!("{}.json", id));
        let data = match std::fs::read_to_string(&path) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SessionError::NotFound(id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&data)?)
    }
}

/// id 仅允许 session_ 前缀加时间戳字符，拒绝路径穿越
fn is_valid_id(id: &str) -> bool {
    id.starts_with("session_")
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// 终态转为持久化记录；缺席字段序列化为 null，retrieved 为保序对象
fn to_record(state: &ResearchState) -> serde_json::Value {
    serde_json::json!({
        "original_query": state.original_query,
        "deconstructed_queries": state.sub_queries,
        "retrieved_information": state.retrieved_map(),
        "plan": state.plan,
        "summary": state.summary,
        "error": state.error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::SummarizedOutput;
    use crate::core::{Retrieved, RetrievedEntry};
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> SessionStore {
        SessionStore::new(dir.path().join("sessions")).unwrap()
    }

    fn terminal_state() -> ResearchState {
        let mut state = ResearchState::new("Explain black holes");
        state.sub_queries = Some(vec!["q1".into(), "q2".into()]);
        state.retrieved = Some(vec![
            RetrievedEntry {
                query: "q1".into(),
                info: Retrieved::Content("info 1".into()),
            },
            RetrievedEntry {
                query: "q2".into(),
                info: Retrieved::Degraded("Placeholder information for 'q2'.".into()),
            },
        ]);
        state.summary = Some(SummarizedOutput {
            summary: "a summary".into(),
        });
        state
    }

    #[test]
    fn test_save_and_get_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let id = store.save(&terminal_state()).unwrap().unwrap();

        let record = store.get(&id).unwrap();
        assert_eq!(record["original_query"], "Explain black holes");
        assert_eq!(record["deconstructed_queries"][0], "q1");
        assert_eq!(record["retrieved_information"]["q1"], "info 1");
        assert_eq!(record["summary"]["summary"], "a summary");
        // 未到达的字段是 null，而非缺失
        assert!(record["plan"].is_null());
        assert!(record["error"].is_null());
    }

    #[test]
    fn test_save_skips_critical_error_state() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let mut state = ResearchState::new("q");
        state.error = Some("Critical error during graph execution: boom".into());

        assert_eq!(store.save(&state).unwrap(), None);
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_non_critical_error_state_is_saved() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let mut state = ResearchState::new("q");
        state.error = Some("Failed to deconstruct query: LLM error: timeout".into());

        let id = store.save(&state).unwrap().unwrap();
        let record = store.get(&id).unwrap();
        assert_eq!(
            record["error"],
            "Failed to deconstruct query: LLM error: timeout"
        );
        assert!(record["deconstructed_queries"].is_null());
    }

    #[test]
    fn test_list_is_reverse_chronological_and_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let first = store.save(&terminal_state()).unwrap().unwrap();
        let second = store.save(&terminal_state()).unwrap().unwrap();

        let ids = store.list().unwrap();
        assert_eq!(ids, vec![second.clone(), first.clone()]);
        // 无写入时重复调用结果一致
        assert_eq!(store.list().unwrap(), ids);
    }

    #[test]
    fn test_sequential_saves_get_distinct_ids() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let a = store.save(&terminal_state()).unwrap().unwrap();
        let b = store.save(&terminal_state()).unwrap().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_get_unknown_id_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let err = store.get("session_19700101_000000_000000").unwrap_err();
        assert!(matches!(err, SessionError::NotFound(_)));
    }

    #[test]
    fn test_get_rejects_traversal_ids() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let err = store.get("../etc/passwd").unwrap_err();
        assert!(matches!(err, SessionError::NotFound(_)));
    }

    #[test]
    fn test_retrieved_information_preserves_sub_query_order() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let mut state = ResearchState::new("q");
        state.sub_queries = Some(vec!["zebra".into(), "apple".into()]);
        state.retrieved = Some(vec![
            RetrievedEntry {
                query: "zebra".into(),
                info: Retrieved::Content("z".into()),
            },
            RetrievedEntry {
                query: "apple".into(),
                info: Retrieved::Content("a".into()),
            },
        ]);
        let id = store.save(&state).unwrap().unwrap();

        let record = store.get(&id).unwrap();
        let keys: Vec<&String> = record["retrieved_information"]
            .as_object()
            .unwrap()
            .keys()
            .collect();
        assert_eq!(keys, vec!["zebra", "apple"]);
    }
}
