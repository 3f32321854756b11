use crate::cmd::Remote;
use crate::output::{print_json, print_table};

pub fn run(remote: &Remote, summary: Option<&str>, json: bool) -> anyhow::Result<()> {
    let client = remote.connect()?;

    if let Some(slug) = summary {
        let s = client.project_summary(Some(slug))?;
        if json {
            return print_json(&s);
        }
        println!("{} ({})", s.what.name, s.what.slug);
        println!("  {}", s.what.description);
        println!("  messages: {}", s.what.message_count);
        println!();
        println!("Online ({}):", s.who.online_count);
        for c in &s.who.online_now {
            println!("  {} [{}]", c.claude_name, c.status.as_deref().unwrap_or("?"));
        }
        if !s.who.recent_contributors.is_empty() {
            println!("Recent contributors: {}", s.who.recent_contributors.join(", "));
        }
        println!();
        println!(
            "Tasks: {} pending, {} claimed, {} done ({} total)",
            s.progress.tasks_pending, s.progress.tasks_claimed, s.progress.tasks_done, s.progress.tasks_total
        );
        return Ok(());
    }

    let projects = client.get_projects()?;
    if json {
        return print_json(&projects);
    }
    if projects.is_empty() {
        println!("no projects for this team");
        return Ok(());
    }
    let rows = projects
        .iter()
        .map(|p| {
            let marker = if p.slug == client.project() { "*" } else { " " };
            vec![
                format!("{marker} {}", p.slug),
                p.name.clone().unwrap_or_default(),
                p.message_count.map(|n| n.to_string()).unwrap_or_default(),
                p.description.clone().unwrap_or_default(),
            ]
        })
        .collect();
    print_table(&["SLUG", "NAME", "MSGS", "DESCRIPTION"], rows);
    Ok(())
}
