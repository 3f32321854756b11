use crate::error::ClientError;
use crate::types::{
    ConnectOptions, Instance, InviteResult, KeyInfo, KeySource, Session, StatusReport, WorkAction,
};
use crate::Result;
use colab_core::config::{ServiceConfig, DEFAULT_PROJECT};
use colab_core::{keystore, paths};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Generic key variable, checked after the per-bot `CLAUDE_COLAB_KEY_<NAME>`.
pub const ENV_API_KEY: &str = "CLAUDE_COLAB_KEY";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_ERROR_BODY: usize = 200;

/// Blocking client for the hosted coordination service.
///
/// Create one per bot process, [`connect`](ColabClient::connect) once, then
/// call [`heartbeat`](ColabClient::heartbeat) on an interval.
pub struct ColabClient {
    http: Client,
    service: ServiceConfig,
    home: Option<PathBuf>,
    project: String,
    session: Option<Session>,
}

impl ColabClient {
    pub fn new(service: ServiceConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("colab/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            service,
            home: None,
            project: DEFAULT_PROJECT.to_string(),
            session: None,
        })
    }

    /// Install location whose `keystore.json` backs key vending.
    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }

    // -----------------------------------------------------------------------
    // Connection
    // -----------------------------------------------------------------------

    /// Resolve an API key, validate it remotely, and start a session.
    pub fn connect(&mut self, opts: ConnectOptions) -> Result<&Session> {
        let (api_key, source) =
            resolve_api_key(&opts, self.home.as_deref(), |var| std::env::var(var).ok())?;
        debug!(%source, "resolved API key");

        let info = self.validate_key(&api_key)?.ok_or(ClientError::InvalidApiKey)?;
        let claude_name = info
            .claude_name
            .or_else(|| opts.name.as_deref().map(paths::normalize_bot_name))
            .unwrap_or_else(|| "unknown".to_string());
        info!(name = %claude_name, %source, "connected to Claude Colab");

        Ok(&*self.session.insert(Session {
            api_key,
            team_id: info.team_id,
            user_id: info.user_id,
            claude_name,
        }))
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Result<&Session> {
        self.session.as_ref().ok_or(ClientError::NotConnected)
    }

    pub fn claude_name(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.claude_name.as_str())
    }

    /// Switch the project that knowledge, tasks, chat and heartbeats are scoped to.
    pub fn set_project(&mut self, slug: &str) -> Result<()> {
        paths::validate_project_slug(slug)?;
        self.project = slug.to_string();
        info!(project = slug, "active project set");
        Ok(())
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    /// `validate_api_key` RPC; `None` when the service does not recognise the key.
    pub(crate) fn validate_key(&self, api_key: &str) -> Result<Option<KeyInfo>> {
        let rows: Vec<KeyInfo> = self.rpc("validate_api_key", json!({ "p_key": api_key }))?;
        Ok(rows.into_iter().next())
    }

    // -----------------------------------------------------------------------
    // Instance, status, invites
    // -----------------------------------------------------------------------

    /// Connection summary with knowledge and task counts.
    pub fn status(&self) -> Result<StatusReport> {
        let Some(session) = self.session.as_ref() else {
            return Ok(StatusReport {
                project: self.project.clone(),
                ..Default::default()
            });
        };
        let knowledge = self.get_recent(100)?;
        let tasks = self.get_tasks(None)?;
        Ok(StatusReport {
            connected: true,
            claude_name: Some(session.claude_name.clone()),
            team_id: session.team_id.clone(),
            project: self.project.clone(),
            knowledge_count: knowledge.len(),
            pending_tasks: tasks.iter().filter(|t| t.status == "pending").count(),
            total_tasks: tasks.len(),
        })
    }

    /// This bot's row in `claude_instances`, looked up by name within the team.
    pub fn get_my_instance(&self) -> Result<Option<Instance>> {
        let session = self.session()?;
        let mut query = vec![
            ("name", format!("eq.{}", session.claude_name)),
            ("select", "*".to_string()),
        ];
        if let Some(team) = &session.team_id {
            query.push(("team_id", format!("eq.{team}")));
        }
        let rows: Vec<Instance> = self.select("claude_instances", &query)?;
        Ok(rows.into_iter().next())
    }

    /// Record a work event against this bot's instance.
    pub fn log_work(&self, action: WorkAction, details: Option<&Value>) -> Result<()> {
        let session = self.session()?;
        let instance = self
            .get_my_instance()?
            .ok_or_else(|| ClientError::InstanceNotFound(session.claude_name.clone()))?;
        let details = details.map(Value::to_string);
        self.rpc_value(
            "log_claude_work",
            json!({
                "p_claude_id": instance.id,
                "p_project_id": instance.current_project_id,
                "p_action": action.as_str(),
                "p_details": details,
            }),
        )?;
        Ok(())
    }

    pub fn invite(&self, email: &str, role: &str) -> Result<InviteResult> {
        let session = self.session()?;
        let result: InviteResult = self.rpc(
            "invite_via_api_key",
            json!({
                "p_api_key": session.api_key,
                "p_email": email,
                "p_role": role,
            }),
        )?;
        if result.success {
            info!(email, url = ?result.invite_url, "invite sent");
        }
        Ok(result)
    }

    /// Stock another bot's key in the local keystore so it can reconnect.
    ///
    /// The caller's own key is re-validated first; only a live member of the
    /// team may write to the keystore on someone else's behalf.
    pub fn help_buddy(&self, buddy: &str, buddy_key: &str) -> Result<()> {
        let session = self.session()?;
        let home = self.home.as_deref().ok_or(ClientError::NoKeystore)?;
        if self.validate_key(&session.api_key)?.is_none() {
            return Err(ClientError::InvalidApiKey);
        }
        let buddy = paths::bot_name(buddy)?;
        keystore::stock_key(home, &buddy, buddy_key)?;
        info!(helper = %session.claude_name, %buddy, "key stocked for buddy");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // HTTP plumbing
    // -----------------------------------------------------------------------

    fn rest_url(&self, endpoint: &str) -> String {
        format!("{}/rest/v1/{endpoint}", self.service.url)
    }

    fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        self.http
            .request(method, self.rest_url(endpoint))
            .header("apikey", &self.service.anon_key)
            .header("Content-Type", "application/json")
    }

    fn send(&self, endpoint: &str, req: RequestBuilder) -> Result<(StatusCode, String)> {
        debug!(endpoint, "request");
        let resp = req.send()?;
        let status = resp.status();
        let body = resp.text()?;
        debug!(endpoint, status = status.as_u16(), "response");
        Ok((status, body))
    }

    fn rejected(endpoint: &str, status: StatusCode, body: &str) -> ClientError {
        ClientError::Rejected {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            body: body.chars().take(MAX_ERROR_BODY).collect(),
        }
    }

    /// POST an RPC and return its JSON result (`null` for an empty body).
    pub(crate) fn rpc_value(&self, function: &str, body: Value) -> Result<Value> {
        let endpoint = format!("rpc/{function}");
        let req = self.request(Method::POST, &endpoint).json(&body);
        let (status, text) = self.send(&endpoint, req)?;
        if status != StatusCode::OK {
            return Err(Self::rejected(&endpoint, status, &text));
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    pub(crate) fn rpc<T: DeserializeOwned>(&self, function: &str, body: Value) -> Result<T> {
        Ok(serde_json::from_value(self.rpc_value(function, body)?)?)
    }

    /// POST an RPC whose only success answer is the JSON literal `true`.
    pub(crate) fn rpc_true(&self, function: &str, body: Value) -> Result<()> {
        match self.rpc_value(function, body)? {
            Value::Bool(true) => Ok(()),
            other => Err(Self::rejected(
                &format!("rpc/{function}"),
                StatusCode::OK,
                &other.to_string(),
            )),
        }
    }

    pub(crate) fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let (status, text) = self.send(table, self.request(Method::GET, table).query(query))?;
        if status != StatusCode::OK {
            return Err(Self::rejected(table, status, &text));
        }
        Ok(serde_json::from_str(&text)?)
    }

    pub(crate) fn update(&self, table: &str, query: &[(&str, String)], body: Value) -> Result<()> {
        let req = self
            .request(Method::PATCH, table)
            .header("Prefer", "return=minimal")
            .query(query)
            .json(&body);
        let (status, text) = self.send(table, req)?;
        if status != StatusCode::OK && status != StatusCode::NO_CONTENT {
            return Err(Self::rejected(table, status, &text));
        }
        Ok(())
    }

    /// `team_id=eq.<id>` filter for the connected team, when known.
    pub(crate) fn team_filter(&self) -> Option<(&'static str, String)> {
        self.session
            .as_ref()
            .and_then(|s| s.team_id.as_ref())
            .map(|team| ("team_id", format!("eq.{team}")))
    }
}

impl std::fmt::Debug for ColabClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.session {
            Some(s) => write!(f, "<ColabClient '{}' connected>", s.claude_name),
            None => f.write_str("<ColabClient disconnected>"),
        }
    }
}

/// Find the API key for a connecting bot.
///
/// Order: explicit key, `CLAUDE_COLAB_KEY_<NAME>`, `CLAUDE_COLAB_KEY`, then
/// the keystore under `home`. The name-based lookups need `opts.name`.
pub fn resolve_api_key(
    opts: &ConnectOptions,
    home: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(String, KeySource)> {
    if let Some(key) = opts.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
        return Ok((key.trim().to_string(), KeySource::Explicit));
    }

    let name = opts.name.as_deref().map(paths::normalize_bot_name);
    let mut checked = Vec::new();
    let mut env_vars = Vec::new();
    if let Some(name) = &name {
        env_vars.push(format!("{ENV_API_KEY}_{name}"));
    }
    env_vars.push(ENV_API_KEY.to_string());

    for var in env_vars {
        if let Some(key) = lookup(&var).filter(|k| !k.trim().is_empty()) {
            return Ok((key.trim().to_string(), KeySource::Env(var)));
        }
        checked.push(format!("${var}"));
    }

    if let (Some(name), Some(home)) = (&name, home) {
        if let Some(key) = keystore::vend_key(home, name)? {
            return Ok((key, KeySource::Keystore));
        }
        checked.push(paths::keystore_path(home).display().to_string());
    }

    Err(ClientError::NoApiKey {
        name: name.unwrap_or_else(|| "this bot".to_string()),
        checked: checked.join(", "),
    })
}
