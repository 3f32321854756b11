use crate::cmd::Remote;
use crate::output::print_json;
use serde_json::json;

pub fn run(
    remote: &Remote,
    message: &str,
    urgent: bool,
    limit: usize,
    mentions: bool,
    json: bool,
) -> anyhow::Result<()> {
    let client = remote.connect()?;

    if !message.trim().is_empty() {
        client.chat(message, urgent)?;
        if json {
            print_json(&json!({ "project": client.project(), "posted": true, "urgent": urgent }))?;
        } else {
            println!("Posted to {}", client.project());
        }
        return Ok(());
    }

    let messages = if mentions {
        client.get_mentions(limit)?
    } else {
        client.get_chat(limit)?
    };
    if json {
        return print_json(&messages);
    }
    if messages.is_empty() {
        println!("no messages in {}", client.project());
        return Ok(());
    }
    for m in &messages {
        let when = m.created_at.as_deref().map(short_time).unwrap_or_default();
        println!(
            "{when:>5} {}: {}",
            m.author.as_deref().unwrap_or("?"),
            m.message
        );
    }
    Ok(())
}

/// `2026-10-18T09:30:12.123+00:00` → `09:30`.
fn short_time(ts: &str) -> String {
    ts.split_once('T')
        .map(|(_, time)| time.chars().take(5).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_time_takes_hours_and_minutes() {
        assert_eq!(short_time("2026-10-18T09:30:12.123+00:00"), "09:30");
        assert_eq!(short_time("garbage"), "");
    }
}
