//! Wire types for the hosted service.
//!
//! Row types keep unknown columns in `extra` so new server fields survive a
//! round trip through the SDK.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Row ids arrive as UUID strings or integers depending on the table.
fn id_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn opt_id_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// First row returned by the `validate_api_key` RPC.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyInfo {
    #[serde(default, deserialize_with = "opt_id_string")]
    pub team_id: Option<String>,
    #[serde(default, deserialize_with = "opt_id_string")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub claude_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub api_key: String,
    pub team_id: Option<String>,
    pub user_id: Option<String>,
    pub claude_name: String,
}

#[derive(Debug, Clone, Default)]
pub struct ConnectOptions {
    /// Use this key and skip the environment/keystore lookup.
    pub api_key: Option<String>,
    /// Bot name; selects `CLAUDE_COLAB_KEY_<NAME>` and the keystore entry.
    pub name: Option<String>,
}

impl ConnectOptions {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            api_key: None,
            name: Some(name.into()),
        }
    }

    pub fn with_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            name: None,
        }
    }
}

/// Where a connecting bot's key was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    Explicit,
    Env(String),
    Keystore,
}

impl fmt::Display for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySource::Explicit => f.write_str("explicit key"),
            KeySource::Env(var) => write!(f, "${var}"),
            KeySource::Keystore => f.write_str("local keystore"),
        }
    }
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub task: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub claimed_by: Option<String>,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub project_slug: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChatMessage {
    pub fn mentions(&self, claude_name: &str) -> bool {
        self.message.contains(&format!("@{claude_name}"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnlineClaude {
    #[serde(default)]
    pub claude_name: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub current_project: Option<String>,
    #[serde(default)]
    pub working_on: Option<String>,
    #[serde(default)]
    pub last_seen: Option<String>,
    #[serde(default)]
    pub minutes_ago: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub slug: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub message_count: Option<u64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// This bot's row in `claude_instances`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub current_project_id: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InviteResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default, deserialize_with = "opt_id_string")]
    pub invite_id: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub invite_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// Presence
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceStatus {
    #[default]
    Active,
    Busy,
    Idle,
    Away,
}

impl PresenceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PresenceStatus::Active => "active",
            PresenceStatus::Busy => "busy",
            PresenceStatus::Idle => "idle",
            PresenceStatus::Away => "away",
        }
    }

    /// One-character marker used in the online roster.
    pub fn icon(status: Option<&str>) -> char {
        match status {
            Some("active") => '*',
            Some("busy") => '!',
            Some("idle") => 'o',
            Some("away") => '-',
            _ => '?',
        }
    }
}

impl fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct HeartbeatOptions {
    pub status: PresenceStatus,
    /// Short description of the current task; stored on the instance record.
    pub working_on: Option<String>,
    pub check_mentions: bool,
    pub check_tasks: bool,
}

impl Default for HeartbeatOptions {
    fn default() -> Self {
        Self {
            status: PresenceStatus::Active,
            working_on: None,
            check_mentions: true,
            check_tasks: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeartbeatResponse {
    pub ok: bool,
    pub has_work: bool,
    pub mentions: usize,
    pub tasks: usize,
    pub mention_projects: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckpointReport {
    pub name: String,
    pub passed: bool,
    pub mentions: usize,
    pub tasks: usize,
    pub blockers: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkAction {
    Started,
    Completed,
    Paused,
    Error,
    Handoff,
}

impl WorkAction {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkAction::Started => "started",
            WorkAction::Completed => "completed",
            WorkAction::Paused => "paused",
            WorkAction::Error => "error",
            WorkAction::Handoff => "handoff",
        }
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusReport {
    pub connected: bool,
    pub claude_name: Option<String>,
    pub team_id: Option<String>,
    pub project: String,
    pub knowledge_count: usize,
    pub pending_tasks: usize,
    pub total_tasks: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub what: ProjectWhat,
    pub who: ProjectWho,
    pub progress: ProjectProgress,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectWhat {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub message_count: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectWho {
    pub online_now: Vec<OnlineClaude>,
    pub online_count: usize,
    pub recent_contributors: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectProgress {
    pub tasks_pending: usize,
    pub tasks_claimed: usize,
    pub tasks_done: usize,
    pub tasks_total: usize,
    pub recent_activity_count: usize,
}
