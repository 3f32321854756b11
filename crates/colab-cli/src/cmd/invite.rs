use crate::cmd::Remote;
use crate::output::print_json;

pub fn run(remote: &Remote, email: &str, role: &str, json: bool) -> anyhow::Result<()> {
    let client = remote.connect()?;
    let result = client.invite(email, role)?;

    if json {
        return print_json(&result);
    }
    if !result.success {
        anyhow::bail!(
            "invite failed: {}",
            result.error.as_deref().unwrap_or("unknown error")
        );
    }
    println!("Invited {email} as {role}");
    if let Some(url) = &result.invite_url {
        println!("  {url}");
    }
    Ok(())
}
