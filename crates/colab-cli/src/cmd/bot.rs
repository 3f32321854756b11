use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use colab_core::bot::{self as bots, Role};
use colab_core::config::BotConfig;
use colab_core::paths;
use serde_json::{json, Map, Value};
use std::path::Path;

#[derive(Subcommand)]
pub enum BotSubcommand {
    /// List installed bots
    List,
    /// Show a bot's config and settings
    Show {
        #[arg(value_name = "BOT")]
        bot: String,
    },
    /// Print a bot's settings.json
    Settings {
        #[arg(value_name = "BOT")]
        bot: String,
    },
    /// Merge KEY=VALUE pairs into a bot's settings (values parse as JSON when they can)
    Set {
        #[arg(value_name = "BOT")]
        bot: String,
        #[arg(required = true, value_parser = parse_kv)]
        pairs: Vec<(String, String)>,
        /// Acting bot; must outrank the target
        #[arg(long)]
        manager: Option<String>,
    },
    /// Add a rule to a bot's settings
    Rule {
        #[arg(value_name = "BOT")]
        bot: String,
        #[arg(required = true)]
        rule: Vec<String>,
        #[arg(long)]
        manager: Option<String>,
    },
    /// Replace a bot's startup todo list
    Todo {
        #[arg(value_name = "BOT")]
        bot: String,
        /// One todo per argument
        #[arg(required = true)]
        items: Vec<String>,
        #[arg(long)]
        manager: Option<String>,
    },
    /// Set the project a bot joins on startup
    Project {
        #[arg(value_name = "BOT")]
        bot: String,
        slug: String,
    },
}

fn parse_kv(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((k, _)) if k.trim().is_empty() => Err(format!("key cannot be empty in: {s}")),
        Some((k, v)) => Ok((k.trim().to_string(), v.to_string())),
        None => Err(format!("expected KEY=VALUE, got: {s}")),
    }
}

/// `42`, `true`, `{"a":1}` become JSON values; anything else stays a string.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

pub fn run(home: &Path, subcmd: BotSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        BotSubcommand::List => list(home, json),
        BotSubcommand::Show { bot } => show(home, &bot, json),
        BotSubcommand::Settings { bot } => {
            let name = paths::bot_name(&bot)?;
            let settings = bots::get_bot_settings(home, &name).unwrap_or_default();
            print_json(&settings)
        }
        BotSubcommand::Set {
            bot,
            pairs,
            manager,
        } => {
            let patch: Map<String, Value> = pairs
                .into_iter()
                .map(|(k, v)| (k, parse_value(&v)))
                .collect();
            let name = paths::bot_name(&bot)?;
            let settings = bots::set_bot_settings(home, &name, &patch, manager.as_deref())?;
            report(&name, &settings, json)
        }
        BotSubcommand::Rule { bot, rule, manager } => {
            let name = paths::bot_name(&bot)?;
            let settings = bots::add_bot_rule(home, &name, &rule.join(" "), manager.as_deref())?;
            report(&name, &settings, json)
        }
        BotSubcommand::Todo {
            bot,
            items,
            manager,
        } => {
            let name = paths::bot_name(&bot)?;
            let todos = items
                .into_iter()
                .map(|content| json!({ "content": content, "status": "pending" }))
                .collect();
            let settings = bots::set_bot_todos(home, &name, todos, manager.as_deref())?;
            report(&name, &settings, json)
        }
        BotSubcommand::Project { bot, slug } => {
            let name = paths::bot_name(&bot)?;
            paths::validate_project_slug(&slug)?;
            let mut cfg = BotConfig::load(home, &name)?;
            cfg.project = Some(slug.clone());
            cfg.save(home)
                .with_context(|| format!("failed to save config for {name}"))?;
            if json {
                print_json(&json!({ "name": name, "project": slug }))
            } else {
                println!("{name} will join {slug}");
                Ok(())
            }
        }
    }
}

fn list(home: &Path, json: bool) -> anyhow::Result<()> {
    let names = bots::list_bots(home)?;
    let mut configs = Vec::with_capacity(names.len());
    for name in &names {
        configs.push(BotConfig::load(home, name)?);
    }

    if json {
        return print_json(&configs);
    }
    if configs.is_empty() {
        println!("no bots installed in {}", home.display());
        return Ok(());
    }
    let rows = configs
        .iter()
        .map(|c| {
            vec![
                c.name.clone(),
                c.role.to_string(),
                c.project_or_default().to_string(),
                format!("{}s", c.settings.heartbeat_interval),
            ]
        })
        .collect();
    print_table(&["BOT", "ROLE", "PROJECT", "HEARTBEAT"], rows);
    Ok(())
}

fn show(home: &Path, raw: &str, json: bool) -> anyhow::Result<()> {
    let name = paths::bot_name(raw)?;
    let cfg = BotConfig::load(home, &name)?;
    let settings = bots::get_bot_settings(home, &name).unwrap_or_default();

    if json {
        return print_json(&json!({ "config": cfg, "settings": settings }));
    }
    println!("Bot:       {}", cfg.name);
    println!("Role:      {}", cfg.role);
    println!("Project:   {}", cfg.project_or_default());
    println!("Key:       {}", cfg.api_key_ref);
    if let Some(created) = &cfg.created {
        println!("Created:   {created}");
    }
    println!(
        "Heartbeat: every {}s (mentions: {}, auto-claim: {})",
        cfg.settings.heartbeat_interval, cfg.settings.check_mentions, cfg.settings.auto_claim_tasks
    );
    let outranks: Vec<&str> = Role::all()
        .iter()
        .filter(|r| cfg.role.outranks(**r))
        .map(|r| r.as_str())
        .collect();
    if !outranks.is_empty() {
        println!("Manages:   {}", outranks.join(", "));
    }
    if !settings.is_empty() {
        println!();
        println!("{}", serde_json::to_string_pretty(&settings)?);
    }
    Ok(())
}

fn report(name: &str, settings: &Map<String, Value>, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(settings);
    }
    println!("Updated settings for {name}");
    Ok(())
}
