//! Heartbeats, the online roster, and pre-work checkpoints.

use crate::client::ColabClient;
use crate::error::ClientError;
use crate::types::{CheckpointReport, HeartbeatOptions, HeartbeatResponse, OnlineClaude};
use crate::Result;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

/// Longest `working_on` text stored on the instance record.
pub const MAX_WORKING_ON: usize = 200;

/// Mentions scanned per heartbeat.
const HEARTBEAT_MENTION_WINDOW: usize = 20;

impl ColabClient {
    /// Report presence and check for work.
    ///
    /// Only a disconnected client is an error. A failed heartbeat RPC leaves
    /// `ok` false and the mention and task checks still run. Mention, task and
    /// `working_on` failures are logged and leave their counts at zero.
    pub fn heartbeat(&self, opts: &HeartbeatOptions) -> Result<HeartbeatResponse> {
        let session = self.session()?;
        let ack = self.rpc_value(
            "heartbeat",
            json!({
                "p_api_key": session.api_key,
                "p_status": opts.status.as_str(),
                "p_project": self.project(),
            }),
        );
        let ok = match ack {
            Ok(value) => value == Value::Bool(true),
            Err(e) => {
                warn!("heartbeat failed: {e}");
                false
            }
        };
        let mut resp = HeartbeatResponse {
            ok,
            ..Default::default()
        };

        if resp.ok {
            if let Some(text) = &opts.working_on {
                if let Err(e) = self.update_working_on(text) {
                    warn!("could not update working_on: {e}");
                }
            }
        }

        if opts.check_mentions {
            match self.get_mentions(HEARTBEAT_MENTION_WINDOW) {
                Ok(mentions) => {
                    resp.mentions = mentions.len();
                    for slug in mentions.iter().filter_map(|m| m.project_slug.as_ref()) {
                        if !resp.mention_projects.contains(slug) {
                            resp.mention_projects.push(slug.clone());
                        }
                    }
                }
                Err(e) => warn!("mention check failed: {e}"),
            }
        }

        if opts.check_tasks {
            match self.my_pending_tasks() {
                Ok(tasks) => resp.tasks = tasks.len(),
                Err(e) => warn!("task check failed: {e}"),
            }
        }

        resp.has_work = resp.mentions > 0 || resp.tasks > 0;
        debug!(ok = resp.ok, mentions = resp.mentions, tasks = resp.tasks, "heartbeat");
        Ok(resp)
    }

    /// Store a short description of the current task on this bot's instance.
    pub fn update_working_on(&self, text: &str) -> Result<()> {
        let session = self.session()?;
        let instance = self
            .get_my_instance()?
            .ok_or_else(|| ClientError::InstanceNotFound(session.claude_name.clone()))?;
        let text: String = text.chars().take(MAX_WORKING_ON).collect();
        self.update(
            "claude_instances",
            &[("id", format!("eq.{}", instance.id))],
            json!({ "working_on": text }),
        )
    }

    /// Bots seen within the last `minutes`.
    pub fn who_online(&self, minutes: u32) -> Result<Vec<OnlineClaude>> {
        let session = self.session()?;
        self.rpc(
            "get_online_claudes",
            json!({ "p_api_key": session.api_key, "p_minutes_threshold": minutes }),
        )
    }

    /// Look for unanswered mentions and pending tasks before starting work.
    ///
    /// A soft checkpoint returns the report either way. A hard checkpoint fails
    /// with [`ClientError::CheckpointBlocked`] while anything is outstanding.
    pub fn checkpoint(
        &self,
        name: &str,
        hard: bool,
        check_mentions: bool,
        check_tasks: bool,
    ) -> Result<CheckpointReport> {
        let mut report = CheckpointReport {
            name: name.to_string(),
            ..Default::default()
        };

        if check_mentions {
            let mentions = self.get_mentions(HEARTBEAT_MENTION_WINDOW)?;
            report.mentions = mentions.len();
            if !mentions.is_empty() {
                report
                    .blockers
                    .push(format!("{} unread mention(s)", mentions.len()));
            }
        }
        if check_tasks {
            let tasks = self.my_pending_tasks()?;
            report.tasks = tasks.len();
            if !tasks.is_empty() {
                report
                    .blockers
                    .push(format!("{} pending task(s) assigned", tasks.len()));
            }
        }
        report.passed = report.blockers.is_empty();

        if report.passed {
            info!(checkpoint = name, "checkpoint passed");
        } else if hard {
            return Err(ClientError::CheckpointBlocked {
                name: report.name,
                blockers: report.blockers,
            });
        } else {
            warn!(checkpoint = name, blockers = ?report.blockers, "checkpoint has blockers");
        }
        Ok(report)
    }
}
