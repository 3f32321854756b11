use crate::cmd::Remote;
use crate::output::{print_json, print_table};
use clap::Subcommand;
use colab_client::tasks::DEFAULT_PRIORITY;
use serde_json::json;

#[derive(Subcommand)]
pub enum TasksSubcommand {
    /// List team tasks
    List {
        /// Filter by status (pending, claimed, done)
        #[arg(long)]
        status: Option<String>,
        /// Only pending tasks assigned to this bot
        #[arg(long, conflicts_with = "status")]
        mine: bool,
    },
    /// Post a task to the active project
    Post {
        #[arg(required = true)]
        task: Vec<String>,
        /// Assign to a specific bot
        #[arg(long)]
        to: Option<String>,
        /// 1 (low) to 10 (urgent)
        #[arg(long, default_value_t = DEFAULT_PRIORITY)]
        priority: u8,
    },
    /// Claim a task
    Claim { id: String },
    /// Mark a task done
    Complete {
        id: String,
        #[arg(required = true)]
        result: Vec<String>,
    },
    /// Delete a task you posted
    Delete { id: String },
}

pub fn run(remote: &Remote, subcmd: TasksSubcommand, json: bool) -> anyhow::Result<()> {
    let client = remote.connect()?;
    match subcmd {
        TasksSubcommand::List { status, mine } => {
            let tasks = if mine {
                client.my_pending_tasks()?
            } else {
                client.get_tasks(status.as_deref())?
            };
            if json {
                return print_json(&tasks);
            }
            if tasks.is_empty() {
                println!("no tasks");
                return Ok(());
            }
            let rows = tasks
                .iter()
                .map(|t| {
                    vec![
                        t.id.clone(),
                        t.status.clone(),
                        t.priority.map(|p| p.to_string()).unwrap_or_default(),
                        t.assigned_to.clone().unwrap_or_else(|| "anyone".to_string()),
                        t.task.clone(),
                    ]
                })
                .collect();
            print_table(&["ID", "STATUS", "PRI", "FOR", "TASK"], rows);
        }
        TasksSubcommand::Post { task, to, priority } => {
            let task = task.join(" ");
            client.post_task(&task, to.as_deref(), priority)?;
            done(json, json!({ "posted": true, "to": to }), "Task posted")?;
        }
        TasksSubcommand::Claim { id } => {
            client.claim_task(&id)?;
            done(json, json!({ "id": id, "status": "claimed" }), &format!("Claimed task {id}"))?;
        }
        TasksSubcommand::Complete { id, result } => {
            client.complete_task(&id, &result.join(" "))?;
            done(json, json!({ "id": id, "status": "done" }), &format!("Completed task {id}"))?;
        }
        TasksSubcommand::Delete { id } => {
            client.delete_task(&id)?;
            done(json, json!({ "id": id, "deleted": true }), &format!("Deleted task {id}"))?;
        }
    }
    Ok(())
}

fn done(json: bool, value: serde_json::Value, text: &str) -> anyhow::Result<()> {
    if json {
        print_json(&value)
    } else {
        println!("{text}");
        Ok(())
    }
}
