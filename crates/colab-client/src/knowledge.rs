use crate::client::ColabClient;
use crate::types::KnowledgeEntry;
use crate::Result;
use serde_json::{json, Map, Value};
use tracing::info;

impl ColabClient {
    /// Share a lesson with the team, scoped to the active project.
    pub fn share(&self, content: &str, tags: &[&str]) -> Result<()> {
        let session = self.session()?;
        self.rpc_true(
            "share_knowledge",
            json!({
                "p_api_key": session.api_key,
                "p_content": content,
                "p_tags": tags,
                "p_type": "lesson",
                "p_project_slug": self.project(),
            }),
        )?;
        info!(project = self.project(), "knowledge shared");
        Ok(())
    }

    /// Case-insensitive substring search over the team's knowledge, newest first.
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<KnowledgeEntry>> {
        self.session()?;
        let mut params = vec![
            ("content", format!("ilike.*{query}*")),
            ("deleted_at", "is.null".to_string()),
            ("order", "created_at.desc".to_string()),
            ("limit", limit.to_string()),
        ];
        params.extend(self.team_filter());
        self.select("shared_knowledge", &params)
    }

    pub fn get_recent(&self, limit: usize) -> Result<Vec<KnowledgeEntry>> {
        self.session()?;
        let mut params = vec![
            ("deleted_at", "is.null".to_string()),
            ("order", "created_at.desc".to_string()),
            ("limit", limit.to_string()),
        ];
        params.extend(self.team_filter());
        self.select("shared_knowledge", &params)
    }

    /// Replace an entry's content, and its tags when given.
    pub fn update_knowledge(&self, id: &str, content: &str, tags: Option<&[&str]>) -> Result<()> {
        self.session()?;
        let mut body = Map::new();
        body.insert("content".to_string(), Value::from(content));
        if let Some(tags) = tags {
            body.insert("tags".to_string(), json!(tags));
        }
        let mut params = vec![("id", format!("eq.{id}"))];
        params.extend(self.team_filter());
        self.update("shared_knowledge", &params, Value::Object(body))
    }

    /// Soft-delete an entry; the service enforces ownership.
    pub fn delete_knowledge(&self, id: &str) -> Result<()> {
        let session = self.session()?;
        self.rpc_true(
            "delete_knowledge",
            json!({ "p_api_key": session.api_key, "p_knowledge_id": id }),
        )
    }
}
