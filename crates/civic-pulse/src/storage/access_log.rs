//! Append-only access log, one JSON object per line.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

/// One logged access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessEvent {
    pub timestamp: DateTime<Utc>,
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub hashtag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub min_priority: Option<u8>,
}

impl AccessEvent {
    #[must_use]
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            event: event.into(),
            hashtag: None,
            min_priority: None,
        }
    }

    /// A store query.
    #[must_use]
    pub fn query(hashtag: &str, min_priority: u8) -> Self {
        Self {
            hashtag: Some(hashtag.to_string()),
            min_priority: Some(min_priority),
            ..Self::new("Search endpoint accessed")
        }
    }

    /// An ingest run for a hashtag.
    #[must_use]
    pub fn ingest(hashtag: &str) -> Self {
        Self {
            hashtag: Some(hashtag.to_string()),
            ..Self::new("Ingest completed")
        }
    }
}

/// JSON-lines access log.
#[derive(Debug, Clone)]
pub struct AccessLog {
    path: PathBuf,
}

impl AccessLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one event, creating the file and parent directories as needed.
    pub fn append(&self, event: &AccessEvent) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open access log {}", self.path.display()))?;
        let line = serde_json::to_string(event)?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    /// Read every event. Unparseable lines are skipped with a warning.
    pub fn read_all(&self) -> Result<Vec<AccessEvent>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read access log {}", self.path.display()))?;

        let mut events = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(line) {
                Ok(event) => events.push(event),
                Err(e) => {
                    tracing::warn!(line = line_no + 1, error = %e, "Skipping malformed access log line");
                }
            }
        }
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_append_and_read() {
        let dir = TempDir::new().unwrap();
        let log = AccessLog::new(dir.path().join("logs").join("access.jsonl"));

        log.append(&AccessEvent::query("pune", 50)).unwrap();
        log.append(&AccessEvent::ingest("roads")).unwrap();

        let events = log.read_all().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event, "Search endpoint accessed");
        assert_eq!(events[0].min_priority, Some(50));
        assert_eq!(events[1].hashtag.as_deref(), Some("roads"));
        assert_eq!(events[1].min_priority, None);
    }

    #[test]
    fn test_read_skips_malformed_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("access.jsonl");
        let log = AccessLog::new(&path);
        log.append(&AccessEvent::new("started")).unwrap();
        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "garbage").unwrap();

        assert_eq!(log.read_all().unwrap().len(), 1);
    }

    #[test]
    fn test_missing_log_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(AccessLog::new(dir.path().join("none.jsonl"))
            .read_all()
            .unwrap()
            .is_empty());
    }
}
