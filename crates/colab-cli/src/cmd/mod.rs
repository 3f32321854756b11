pub mod bot;
pub mod chat;
pub mod checkpoint;
pub mod context;
pub mod install;
pub mod invite;
pub mod keys;
pub mod knowledge;
pub mod online;
pub mod projects;
pub mod run;
pub mod status;
pub mod tasks;

use anyhow::Context;
use colab_client::{ColabClient, ConnectOptions};
use colab_core::config::{BotConfig, ServiceConfig};
use colab_core::paths;
use std::path::PathBuf;

/// Who a remote command acts as, and where.
pub struct Remote {
    pub home: PathBuf,
    pub bot: Option<String>,
    pub project: Option<String>,
}

impl Remote {
    /// The selected bot's canonical name, required by commands that act as a bot.
    pub fn bot_name(&self) -> anyhow::Result<String> {
        let raw = self
            .bot
            .as_deref()
            .context("no bot selected: pass --name <BOT> or set COLAB_BOT")?;
        Ok(paths::bot_name(raw)?)
    }

    /// Connect as the selected bot and switch to the requested project.
    ///
    /// Without `--project`, a locally installed bot uses the project from its
    /// `config.json`.
    pub fn connect(&self) -> anyhow::Result<ColabClient> {
        let service = ServiceConfig::resolve(&self.home)?;
        let mut client = ColabClient::new(service)?.with_home(&self.home);

        let name = self.bot.as_deref().map(paths::normalize_bot_name);
        let opts = ConnectOptions {
            api_key: None,
            name: name.clone(),
        };
        client
            .connect(opts)
            .context("failed to connect to Claude Colab")?;

        let configured = name
            .as_deref()
            .and_then(|n| BotConfig::load(&self.home, n).ok())
            .and_then(|cfg| cfg.project);
        if let Some(project) = self.project.clone().or(configured) {
            client.set_project(&project)?;
        }
        Ok(client)
    }
}
