//! Best-effort audit log sink.
//!
//! Entries are appended to a date-stamped file so logs cut over daily.
//! The sink is fire-and-forget from the services' perspective: `record`
//! downgrades a failed append to a `warn!` and never propagates it, so a
//! full disk can never abort a lifecycle operation.

use chrono::Utc;
use std::fmt;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditLevel {
    Info,
    Warning,
}

impl fmt::Display for AuditLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditLevel::Info => write!(f, "Info"),
            AuditLevel::Warning => write!(f, "Warning"),
        }
    }
}

pub struct AuditLog {
    dir: PathBuf,
}

impl AuditLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Append an entry, reporting any failure to the caller.
    pub async fn append(&self, level: AuditLevel, message: &str) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let now = Utc::now();
        let path = self
            .dir
            .join(format!("{}-access-audit.log", now.format("%Y-%m-%d")));
        let line = format!("{} [{}]: {}\n", now.format("%Y-%m-%d %H:%M:%S"), level, message);

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        // Flush before the handle drops; a buffered write that never
        // reaches disk would report success for a lost entry.
        file.flush().await?;
        Ok(())
    }

    /// Append an entry, swallowing failures.
    pub async fn record(&self, level: AuditLevel, message: &str) {
        if let Err(e) = self.append(level, message).await {
            warn!("audit log write failed: {}", e);
        }
    }
}
