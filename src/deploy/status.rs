//! Deployment status record and the pure transitions applied to it.
//!
//! Only the owning rollout task calls the mutating helpers here; everyone
//! else reads snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Platform;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentState {
    Pending,
    Deploying,
    Success,
    Failed,
    Cancelled,
}

impl DeploymentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Deploying => "deploying",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failed | Self::Cancelled)
    }

    /// `pending -> deploying -> {success, failed, cancelled}`. A pending
    /// deployment may also fail before it starts deploying.
    pub fn can_transition_to(&self, next: DeploymentState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Deploying)
                | (Self::Pending, Self::Failed)
                | (Self::Deploying, Self::Success)
                | (Self::Deploying, Self::Failed)
                | (Self::Deploying, Self::Cancelled)
        )
    }
}

impl std::fmt::Display for DeploymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

const LOG_LIMIT_MARKER: &str = "Log limit reached; further entries are dropped";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentStatus {
    pub id: String,
    pub project_id: String,
    pub platform: Platform,
    pub status: DeploymentState,
    pub progress: u8,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub logs: Vec<LogEntry>,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Progress after finishing step `index` of `total`, held below 100 until success.
pub fn step_progress(index: usize, total: usize) -> u8 {
    if total == 0 {
        return 99;
    }
    let pct = (index + 1).saturating_mul(100) / total;
    pct.min(99) as u8
}

impl DeploymentStatus {
    pub fn pending(id: impl Into<String>, project_id: impl Into<String>, platform: Platform) -> Self {
        Self {
            id: id.into(),
            project_id: project_id.into(),
            platform,
            status: DeploymentState::Pending,
            progress: 0,
            message: "Deployment queued".to_string(),
            url: None,
            logs: Vec::new(),
            started_at: Utc::now(),
            completed_at: None,
            error: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Apply `next` if the state machine allows it. Returns whether it applied.
    pub fn transition(&mut self, next: DeploymentState) -> bool {
        if !self.status.can_transition_to(next) {
            return false;
        }
        self.status = next;
        if next.is_terminal() {
            self.completed_at = Some(Utc::now());
        }
        true
    }

    /// Append-only; once `max_entries` is reached a single marker is written
    /// and everything after it is dropped.
    pub fn append_log(&mut self, level: LogLevel, message: impl Into<String>, max_entries: usize) {
        let max_entries = max_entries.max(1);
        if self.logs.len() >= max_entries {
            return;
        }
        let entry = if self.logs.len() + 1 == max_entries {
            LogEntry {
                timestamp: Utc::now(),
                level: LogLevel::Warn,
                message: LOG_LIMIT_MARKER.to_string(),
            }
        } else {
            LogEntry {
                timestamp: Utc::now(),
                level,
                message: message.into(),
            }
        };
        self.logs.push(entry);
    }

    /// Raise progress to `value` (clamped to 100). Never lowers it.
    pub fn raise_progress(&mut self, value: u8) {
        self.progress = self.progress.max(value.min(100));
    }

    pub fn start(&mut self, max_logs: usize) -> bool {
        if !self.transition(DeploymentState::Deploying) {
            return false;
        }
        self.message = "Deploying".to_string();
        self.append_log(LogLevel::Info, "Deployment started", max_logs);
        true
    }

    pub fn succeed(&mut self, url: String, max_logs: usize) -> bool {
        if !self.transition(DeploymentState::Success) {
            return false;
        }
        self.progress = 100;
        self.message = "Deployment completed".to_string();
        self.append_log(LogLevel::Info, format!("Deployment live at {}", url), max_logs);
        self.url = Some(url);
        true
    }

    pub fn fail(&mut self, error: impl Into<String>, max_logs: usize) -> bool {
        let error = error.into();
        if !self.transition(DeploymentState::Failed) {
            return false;
        }
        self.message = "Deployment failed".to_string();
        self.append_log(LogLevel::Error, error.clone(), max_logs);
        self.error = Some(error);
        true
    }

    pub fn cancel(&mut self, max_logs: usize) -> bool {
        if !self.transition(DeploymentState::Cancelled) {
            return false;
        }
        self.message = "Deployment cancelled".to_string();
        self.append_log(LogLevel::Warn, "Deployment cancelled by request", max_logs);
        true
    }
}
