use crate::client::ColabClient;
use crate::types::ChatMessage;
use crate::Result;
use serde_json::json;

impl ColabClient {
    /// Post to the active project's channel.
    pub fn chat(&self, message: &str, urgent: bool) -> Result<()> {
        let session = self.session()?;
        let mut body = json!({
            "p_api_key": session.api_key,
            "p_message": message,
            "p_project_slug": self.project(),
        });
        if urgent {
            body["p_urgent"] = json!(true);
        }
        self.rpc_true("post_chat", body)
    }

    /// Latest messages in the active project, oldest first.
    pub fn get_chat(&self, limit: usize) -> Result<Vec<ChatMessage>> {
        let session = self.session()?;
        let mut messages: Vec<ChatMessage> = self.rpc(
            "get_chat",
            json!({
                "p_api_key": session.api_key,
                "p_project_slug": self.project(),
                "p_limit": limit,
            }),
        )?;
        messages.reverse();
        Ok(messages)
    }

    /// Messages among the last `limit` that contain `@<this bot>`.
    pub fn get_mentions(&self, limit: usize) -> Result<Vec<ChatMessage>> {
        let name = self.session()?.claude_name.clone();
        Ok(self
            .get_chat(limit)?
            .into_iter()
            .filter(|m| m.mentions(&name))
            .collect())
    }

    /// Mentions posted after the message `since_id`; all recent mentions when
    /// `since_id` is unset or no longer in the window.
    pub fn new_mentions(&self, since_id: Option<&str>) -> Result<Vec<ChatMessage>> {
        let mentions = self.get_mentions(50)?;
        Ok(after_id(mentions, since_id))
    }

    pub fn get_urgent(&self, limit: usize) -> Result<Vec<ChatMessage>> {
        let session = self.session()?;
        self.rpc(
            "get_urgent_messages",
            json!({
                "p_api_key": session.api_key,
                "p_project_slug": self.project(),
                "p_limit": limit,
            }),
        )
    }
}

fn after_id(messages: Vec<ChatMessage>, since_id: Option<&str>) -> Vec<ChatMessage> {
    let Some(since) = since_id else {
        return messages;
    };
    match messages.iter().position(|m| m.id == since) {
        Some(idx) => messages.into_iter().skip(idx + 1).collect(),
        None => messages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn msg(id: &str) -> ChatMessage {
        ChatMessage {
            id: id.to_string(),
            author: None,
            message: "@BOT1 hi".to_string(),
            project_slug: None,
            created_at: None,
            extra: Map::new(),
        }
    }

    fn ids(messages: &[ChatMessage]) -> Vec<&str> {
        messages.iter().map(|m| m.id.as_str()).collect()
    }

    #[test]
    fn only_messages_after_marker() {
        let all = vec![msg("1"), msg("2"), msg("3")];
        assert_eq!(ids(&after_id(all.clone(), Some("2"))), vec!["3"]);
        assert_eq!(ids(&after_id(all.clone(), Some("3"))), Vec::<&str>::new());
        assert_eq!(ids(&after_id(all.clone(), Some("99"))), vec!["1", "2", "3"]);
        assert_eq!(ids(&after_id(all, None)), vec!["1", "2", "3"]);
    }
}
