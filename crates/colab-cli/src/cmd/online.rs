use crate::cmd::Remote;
use crate::output::{print_json, print_table};
use colab_client::PresenceStatus;

pub fn run(remote: &Remote, minutes: u32, json: bool) -> anyhow::Result<()> {
    let client = remote.connect()?;
    let online = client.who_online(minutes)?;

    if json {
        return print_json(&online);
    }
    if online.is_empty() {
        println!("nobody online in the last {minutes} min");
        return Ok(());
    }
    let rows = online
        .iter()
        .map(|c| {
            vec![
                format!("{} {}", PresenceStatus::icon(c.status.as_deref()), c.claude_name),
                c.current_project.clone().unwrap_or_default(),
                c.working_on.clone().unwrap_or_default(),
                c.minutes_ago
                    .map(|m| format!("{m:.0}m ago"))
                    .unwrap_or_default(),
            ]
        })
        .collect();
    print_table(&["BOT", "PROJECT", "WORKING ON", "SEEN"], rows);
    Ok(())
}
