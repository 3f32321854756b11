use crate::client::ColabClient;
use crate::types::{Project, ProjectProgress, ProjectSummary, ProjectWhat, ProjectWho};
use crate::Result;
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;
use tracing::warn;

impl ColabClient {
    /// Projects visible to the team.
    ///
    /// Prefers the `get_channels` RPC, which includes message counts, and falls
    /// back to the `projects` table when it fails or returns nothing.
    pub fn get_projects(&self) -> Result<Vec<Project>> {
        let session = self.session()?;
        match self.rpc::<Vec<Project>>("get_channels", json!({ "p_api_key": session.api_key })) {
            Ok(projects) if !projects.is_empty() => return Ok(projects),
            Ok(_) => {}
            Err(e) => warn!("get_channels failed, reading projects table: {e}"),
        }
        let mut params = vec![
            ("select", "slug,name,description,created_at".to_string()),
            ("order", "created_at.desc".to_string()),
        ];
        params.extend(self.team_filter());
        self.select("projects", &params)
    }

    /// Project slugs, i.e. the chat channels a bot can post to.
    pub fn list_channels(&self) -> Result<Vec<String>> {
        Ok(self
            .get_projects()?
            .into_iter()
            .map(|p| p.slug)
            .filter(|s| !s.is_empty())
            .collect())
    }

    /// What the project is, who is on it, and how far along its tasks are.
    pub fn project_summary(&self, slug: Option<&str>) -> Result<ProjectSummary> {
        let slug = slug.unwrap_or(self.project()).to_string();
        let info = self.get_projects()?.into_iter().find(|p| p.slug == slug);

        let online: Vec<_> = self
            .who_online(60)?
            .into_iter()
            .filter(|c| c.current_project.as_deref() == Some(slug.as_str()))
            .collect();
        let tasks = self.get_tasks(None)?;
        let recent = self.get_recent(20)?;
        let count = |status: &str| tasks.iter().filter(|t| t.status == status).count();

        let contributors: BTreeSet<String> =
            recent.iter().filter_map(|k| k.author.clone()).collect();

        Ok(ProjectSummary {
            what: ProjectWhat {
                name: info
                    .as_ref()
                    .and_then(|p| p.name.clone())
                    .unwrap_or_else(|| slug.clone()),
                description: info
                    .as_ref()
                    .and_then(|p| p.description.clone())
                    .filter(|d| !d.is_empty())
                    .unwrap_or_else(|| "No description".to_string()),
                message_count: info.as_ref().and_then(|p| p.message_count).unwrap_or(0),
                slug,
            },
            who: ProjectWho {
                online_count: online.len(),
                online_now: online,
                recent_contributors: contributors.into_iter().collect(),
            },
            progress: ProjectProgress {
                tasks_pending: count("pending"),
                tasks_claimed: count("claimed"),
                tasks_done: count("done"),
                tasks_total: tasks.len(),
                recent_activity_count: recent.len(),
            },
        })
    }

    /// The active project's row with its leadership; empty when unknown.
    pub fn get_project_config(&self) -> Result<Map<String, Value>> {
        self.session()?;
        let rows: Vec<Map<String, Value>> = self.select(
            "projects",
            &[
                ("slug", format!("eq.{}", self.project())),
                ("select", "*,project_leadership(*)".to_string()),
            ],
        )?;
        Ok(rows.into_iter().next().unwrap_or_default())
    }

    /// Markdown briefing for this bot: assignment, project focus, and how to coordinate.
    pub fn startup_context(&self) -> Result<String> {
        let name = self.session()?.claude_name.clone();
        let instance = self.get_my_instance()?;
        let project = self.get_project_config()?;
        let slug = self.project();
        let project_name = project
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or(slug);
        let role = instance
            .as_ref()
            .and_then(|i| i.role.as_deref())
            .unwrap_or("worker");
        let status = instance
            .as_ref()
            .and_then(|i| i.status.as_deref())
            .unwrap_or("idle");

        Ok(format!(
            r#"# Claude Colab Assignment
# Generated for: {name}
# Project: {slug}

## Your Assignment
- **Name:** {name}
- **Role:** {role}
- **Status:** {status}
- **Current Project:** {project_name}

## Project Focus
Stay focused on: **{project_name}**

Do NOT work on other projects unless explicitly reassigned.

## Quick Commands
```sh
colab --name {name} status
colab --name {name} chat --project {slug} "Your message here"
colab --name {name} knowledge share "Knowledge to share" --tag tag1
colab --name {name} tasks list
```

## Coordination
- Check chat regularly for messages from other bots
- Post status updates when starting or completing work
- Use tasks for formal handoffs
"#
        ))
    }
}
