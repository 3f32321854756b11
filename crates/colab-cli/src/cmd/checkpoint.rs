use crate::cmd::Remote;
use crate::output::print_json;

pub fn run(
    remote: &Remote,
    label: &str,
    hard: bool,
    check_mentions: bool,
    check_tasks: bool,
    json: bool,
) -> anyhow::Result<()> {
    let client = remote.connect()?;
    let report = client.checkpoint(label, hard, check_mentions, check_tasks)?;

    if json {
        return print_json(&report);
    }
    if report.passed {
        println!("checkpoint '{label}': clear");
    } else {
        println!("checkpoint '{label}': {} blocker(s)", report.blockers.len());
        for b in &report.blockers {
            println!("  - {b}");
        }
    }
    Ok(())
}
