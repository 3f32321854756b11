use crate::cmd::Remote;
use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use colab_core::{keystore, paths};
use serde_json::json;

#[derive(Subcommand)]
pub enum KeysSubcommand {
    /// List bots with a stored key (keys are masked)
    List,
    /// Show the key stored for a bot
    Get {
        #[arg(value_name = "BOT")]
        bot: String,
        /// Print the full key instead of a masked one
        #[arg(long)]
        reveal: bool,
    },
    /// Store or replace a bot's key
    ///
    /// With --as, the key is stocked on behalf of a buddy: the helper's own key
    /// is validated against the service first.
    Set {
        #[arg(value_name = "BOT")]
        bot: String,
        key: String,
        /// Validate this bot's key remotely before stocking
        #[arg(long = "as", value_name = "HELPER")]
        helper: Option<String>,
    },
    /// Remove a bot's key
    Remove {
        #[arg(value_name = "BOT")]
        bot: String,
    },
}

pub fn run(remote: &Remote, subcmd: KeysSubcommand, json: bool) -> anyhow::Result<()> {
    let path = paths::keystore_path(&remote.home);
    match subcmd {
        KeysSubcommand::List => {
            let store = keystore::Keystore::load(&path)?;
            let entries: Vec<(String, String)> = store
                .entries()
                .map(|(name, key)| (name.to_string(), keystore::mask_key(key)))
                .collect();
            if json {
                let list: Vec<_> = entries
                    .iter()
                    .map(|(name, key)| json!({ "name": name, "key": key }))
                    .collect();
                return print_json(&list);
            }
            if entries.is_empty() {
                println!("no keys stored in {}", path.display());
                return Ok(());
            }
            let rows = entries.into_iter().map(|(n, k)| vec![n, k]).collect();
            print_table(&["BOT", "KEY"], rows);
        }

        KeysSubcommand::Get { bot, reveal } => {
            let name = paths::bot_name(&bot)?;
            let key = keystore::vend_key(&remote.home, &name)?
                .with_context(|| format!("no key stored for {name}"))?;
            let shown = if reveal { key } else { keystore::mask_key(&key) };
            if json {
                print_json(&json!({ "name": name, "key": shown }))?;
            } else {
                println!("{shown}");
            }
        }

        KeysSubcommand::Set { bot, key, helper } => {
            let name = paths::bot_name(&bot)?;
            let key = key.trim();
            if key.is_empty() {
                anyhow::bail!("key cannot be empty");
            }
            if !keystore::looks_valid(key) {
                eprintln!("warning: key does not start with '{}'", keystore::KEY_PREFIX);
            }
            match helper {
                Some(helper) => {
                    let as_helper = Remote {
                        home: remote.home.clone(),
                        bot: Some(helper),
                        project: remote.project.clone(),
                    };
                    as_helper.connect()?.help_buddy(&name, key)?;
                }
                None => keystore::stock_key(&remote.home, &name, key)?,
            }
            if json {
                print_json(&json!({ "name": name, "stored": true }))?;
            } else {
                println!("Stored key for {name}");
            }
        }

        KeysSubcommand::Remove { bot } => {
            let name = paths::bot_name(&bot)?;
            let mut store = keystore::Keystore::load(&path)?;
            if store.remove(&name).is_none() {
                anyhow::bail!("no key stored for {name}");
            }
            store.save(&path)?;
            if json {
                print_json(&json!({ "name": name, "removed": true }))?;
            } else {
                println!("Removed key for {name}");
            }
        }
    }
    Ok(())
}
