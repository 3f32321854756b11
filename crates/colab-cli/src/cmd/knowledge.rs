use crate::cmd::Remote;
use crate::output::{print_json, print_table, shorten};
use clap::Subcommand;
use colab_client::KnowledgeEntry;
use serde_json::json;

#[derive(Subcommand)]
pub enum KnowledgeSubcommand {
    /// Share a lesson with the team
    Share {
        #[arg(required = true)]
        content: Vec<String>,
        /// Tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Search shared knowledge
    Search {
        query: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Most recent entries
    Recent {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Replace an entry's content
    Update {
        id: String,
        #[arg(required = true)]
        content: Vec<String>,
        /// Replace tags too (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Delete an entry you shared
    Delete { id: String },
}

pub fn run(remote: &Remote, subcmd: KnowledgeSubcommand, json: bool) -> anyhow::Result<()> {
    let client = remote.connect()?;
    match subcmd {
        KnowledgeSubcommand::Share { content, tags } => {
            let tags: Vec<&str> = tags.iter().map(String::as_str).collect();
            client.share(&content.join(" "), &tags)?;
            if json {
                print_json(&json!({ "shared": true, "project": client.project() }))?;
            } else {
                println!("Shared with {}", client.project());
            }
        }
        KnowledgeSubcommand::Search { query, limit } => {
            show(&client.search(&query, limit)?, json)?;
        }
        KnowledgeSubcommand::Recent { limit } => show(&client.get_recent(limit)?, json)?,
        KnowledgeSubcommand::Update { id, content, tags } => {
            let tags: Vec<&str> = tags.iter().map(String::as_str).collect();
            let tags = (!tags.is_empty()).then_some(tags.as_slice());
            client.update_knowledge(&id, &content.join(" "), tags)?;
            if json {
                print_json(&json!({ "id": id, "updated": true }))?;
            } else {
                println!("Updated {id}");
            }
        }
        KnowledgeSubcommand::Delete { id } => {
            client.delete_knowledge(&id)?;
            if json {
                print_json(&json!({ "id": id, "deleted": true }))?;
            } else {
                println!("Deleted {id}");
            }
        }
    }
    Ok(())
}

fn show(entries: &[KnowledgeEntry], json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(&entries);
    }
    if entries.is_empty() {
        println!("nothing found");
        return Ok(());
    }
    let rows = entries
        .iter()
        .map(|k| {
            vec![
                k.id.clone(),
                k.author.clone().unwrap_or_default(),
                k.tags.join(","),
                shorten(&k.content, 60),
            ]
        })
        .collect();
    print_table(&["ID", "AUTHOR", "TAGS", "CONTENT"], rows);
    Ok(())
}
