use crate::cmd::Remote;
use crate::output::print_json;
use anyhow::Context;
use colab_client::{ColabClient, HeartbeatOptions, HeartbeatResponse};
use colab_core::config::{BotConfig, BotSettingsConfig};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Floor for `heartbeat_interval`; smaller values would hammer the service.
const MIN_INTERVAL_SECS: u64 = 5;

pub fn run(remote: &Remote, once: bool, json: bool) -> anyhow::Result<()> {
    let name = remote.bot_name()?;
    let config = BotConfig::load(&remote.home, &name)
        .with_context(|| format!("bot {name} is not installed in {}", remote.home.display()))?;
    let client = remote.connect()?;
    let opts = heartbeat_options(&config.settings);

    if once {
        let resp = client.heartbeat(&opts)?;
        return print_response(&resp, json);
    }

    info!(bot = %name, project = client.project(), "starting heartbeat loop");
    if let Err(e) = client.chat(&format!("{name} is online and ready."), false) {
        warn!("could not announce startup: {e}");
    }

    let interval = Duration::from_secs(config.settings.heartbeat_interval.max(MIN_INTERVAL_SECS));
    let mut last_mention: Option<String> = None;
    loop {
        match client.heartbeat(&opts) {
            Ok(resp) if resp.has_work => {
                last_mention = handle_work(&client, &config.settings, last_mention);
            }
            Ok(resp) => debug!(ok = resp.ok, "no work"),
            Err(e) => warn!("heartbeat failed: {e:#}"),
        }
        std::thread::sleep(interval);
    }
}

fn heartbeat_options(settings: &BotSettingsConfig) -> HeartbeatOptions {
    HeartbeatOptions {
        check_mentions: settings.check_mentions,
        check_tasks: true,
        ..Default::default()
    }
}

/// Log new mentions and assigned tasks; returns the newest mention id seen.
fn handle_work(
    client: &ColabClient,
    settings: &BotSettingsConfig,
    last_mention: Option<String>,
) -> Option<String> {
    let mut newest = last_mention.clone();
    if settings.check_mentions {
        match client.new_mentions(last_mention.as_deref()) {
            Ok(mentions) => {
                for m in &mentions {
                    info!(
                        from = m.author.as_deref().unwrap_or("?"),
                        project = m.project_slug.as_deref().unwrap_or(client.project()),
                        "mention: {}",
                        m.message
                    );
                }
                if let Some(m) = mentions.last() {
                    newest = Some(m.id.clone());
                }
            }
            Err(e) => warn!("could not read mentions: {e}"),
        }
    }

    match client.my_pending_tasks() {
        Ok(tasks) => {
            for t in &tasks {
                info!(id = %t.id, priority = ?t.priority, "pending task: {}", t.task);
            }
            if settings.auto_claim_tasks {
                if let Some(first) = tasks.first() {
                    match client.claim_task(&first.id) {
                        Ok(()) => info!(id = %first.id, "claimed task"),
                        Err(e) => warn!(id = %first.id, "could not claim task: {e}"),
                    }
                }
            }
        }
        Err(e) => warn!("could not read tasks: {e}"),
    }
    newest
}

fn print_response(resp: &HeartbeatResponse, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(resp);
    }
    println!("ok:        {}", resp.ok);
    println!("has_work:  {}", resp.has_work);
    println!("mentions:  {}", resp.mentions);
    println!("tasks:     {}", resp.tasks);
    if !resp.mention_projects.is_empty() {
        println!("projects:  {}", resp.mention_projects.join(", "));
    }
    Ok(())
}
