//! 用户反馈日志：追加写入的 JSONL 文件，每行一条

use std::io::Write;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// 单条用户反馈
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub original_query: String,
    pub feedback_text: String,
    /// 1-5 星
    pub rating: u8,
    pub timestamp: String,
}

/// 反馈日志：append-only，读取时跳过坏行
#[derive(Clone)]
pub struct FeedbackLog {
    path: PathBuf,
}

impl FeedbackLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 追加一条反馈（一行 JSON）
    pub fn record(&self, entry: &FeedbackEntry) -> std::io::Result<()> {
        let line = serde_json::to_string(entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;
        tracing::info!(query = %entry.original_query, rating = entry.rating, "feedback recorded");
        Ok(())
    }

    /// 读取全部反馈；文件不存在视为空，坏行跳过并告警
    pub fn load(&self) -> Vec<FeedbackEntry> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(d) => d,
            Err(_) => return Vec::new(),
        };
        let mut entries = Vec::new();
        for line in data.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<FeedbackEntry>(line) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping invalid feedback entry");
                }
            }
        }
        entries
    }
}
