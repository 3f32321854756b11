use crate::cmd::Remote;
use crate::output::print_json;

pub fn run(remote: &Remote, json: bool) -> anyhow::Result<()> {
    let client = remote.connect()?;
    let status = client.status()?;

    if json {
        return print_json(&status);
    }
    println!("Connected as: {}", status.claude_name.as_deref().unwrap_or("?"));
    println!("Team:         {}", status.team_id.as_deref().unwrap_or("-"));
    println!("Project:      {}", status.project);
    println!("Knowledge:    {}", status.knowledge_count);
    println!(
        "Tasks:        {} pending / {} total",
        status.pending_tasks, status.total_tasks
    );
    Ok(())
}
