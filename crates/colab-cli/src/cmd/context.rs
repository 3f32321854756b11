use crate::cmd::Remote;
use anyhow::Context;
use colab_core::io;
use std::path::Path;

pub fn run(remote: &Remote, output: Option<&Path>) -> anyhow::Result<()> {
    let client = remote.connect()?;
    let doc = client.startup_context()?;
    match output {
        Some(path) => {
            io::atomic_write(path, doc.as_bytes())
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Context written to {}", path.display());
        }
        None => print!("{doc}"),
    }
    Ok(())
}
