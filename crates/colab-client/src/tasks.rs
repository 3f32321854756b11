use crate::client::ColabClient;
use crate::types::Task;
use crate::Result;
use serde_json::json;
use tracing::info;

pub const MIN_PRIORITY: u8 = 1;
pub const MAX_PRIORITY: u8 = 10;
pub const DEFAULT_PRIORITY: u8 = 5;

impl ColabClient {
    /// Team tasks, newest first, optionally filtered by status (`pending`, `claimed`, `done`).
    pub fn get_tasks(&self, status: Option<&str>) -> Result<Vec<Task>> {
        self.session()?;
        let mut params = vec![
            ("deleted_at", "is.null".to_string()),
            ("order", "created_at.desc".to_string()),
        ];
        if let Some(status) = status {
            params.push(("status", format!("eq.{status}")));
        }
        params.extend(self.team_filter());
        self.select("shared_tasks", &params)
    }

    /// Pending tasks addressed to this bot.
    pub fn my_pending_tasks(&self) -> Result<Vec<Task>> {
        let name = self.session()?.claude_name.clone();
        Ok(self
            .get_tasks(Some("pending"))?
            .into_iter()
            .filter(|t| t.assigned_to.as_deref() == Some(name.as_str()))
            .collect())
    }

    /// Post a task; priority is clamped to 1..=10.
    pub fn post_task(&self, task: &str, to_claude: Option<&str>, priority: u8) -> Result<()> {
        let session = self.session()?;
        let priority = priority.clamp(MIN_PRIORITY, MAX_PRIORITY);
        self.rpc_true(
            "post_task",
            json!({
                "p_api_key": session.api_key,
                "p_task": task,
                "p_to_claude": to_claude,
                "p_priority": priority,
                "p_project_slug": self.project(),
            }),
        )?;
        info!(to = ?to_claude, priority, "task posted");
        Ok(())
    }

    pub fn claim_task(&self, id: &str) -> Result<()> {
        let session = self.session()?;
        self.update(
            "shared_tasks",
            &[("id", format!("eq.{id}"))],
            json!({ "status": "claimed", "claimed_by": session.claude_name }),
        )
    }

    pub fn complete_task(&self, id: &str, result: &str) -> Result<()> {
        self.session()?;
        self.update(
            "shared_tasks",
            &[("id", format!("eq.{id}"))],
            json!({ "status": "done", "result": result }),
        )
    }

    pub fn delete_task(&self, id: &str) -> Result<()> {
        let session = self.session()?;
        self.rpc_true(
            "delete_task",
            json!({ "p_api_key": session.api_key, "p_task_id": id }),
        )
    }
}
