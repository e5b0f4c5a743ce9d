// Append-only record of answered questions.
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use tokio::io::AsyncWriteExt;

/// Appends `(timestamp, question, answer)` lines to a file.
#[derive(Debug, Clone)]
pub struct QueryLog {
    path: PathBuf,
}

impl QueryLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Never fails the caller; a write error is only logged.
    pub async fn record(&self, at: DateTime<Utc>, question: &str, answer: &str) {
        if let Err(e) = self.append(&format_entry(at, question, answer)).await {
            log::warn!("query log: cannot write {}: {e}", self.path.display());
        }
    }

    async fn append(&self, entry: &str) -> std::io::Result<()> {
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(entry.as_bytes()).await?;
        file.flush().await
    }
}

fn format_entry(at: DateTime<Utc>, question: &str, answer: &str) -> String {
    let ts = at.to_rfc3339_opts(SecondsFormat::Millis, true);
    format!("{ts} - User Query: {question}\n{ts} - Agent Answer: {answer}\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[tokio::test]
    async fn appends_question_and_answer() {
        let dir = tempfile::tempdir().unwrap();
        let log = QueryLog::new(dir.path().join("agent.log"));
        let at = Utc.with_ymd_and_hms(2024, 5, 2, 12, 0, 0).unwrap();

        log.record(at, "how many pods?", "One.").await;
        log.record(at, "which nodes?", "node-a").await;

        let body = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(
            lines,
            vec![
                "2024-05-02T12:00:00.000Z - User Query: how many pods?",
                "2024-05-02T12:00:00.000Z - Agent Answer: One.",
                "2024-05-02T12:00:00.000Z - User Query: which nodes?",
                "2024-05-02T12:00:00.000Z - Agent Answer: node-a",
            ]
        );
    }

    #[tokio::test]
    async fn unwritable_path_does_not_panic() {
        let dir = tempfile::tempdir().unwrap();
        let log = QueryLog::new(dir.path().join("missing").join("agent.log"));
        log.record(Utc::now(), "q", "a").await;
        assert!(!log.path().exists());
    }
}
