use crate::home;
use crate::prompt::Prompter;
use anyhow::{bail, Context};
use clap::Args;
use colab_core::bot::Role;
use colab_core::config::{BotConfig, ServiceConfig};
use colab_core::{io, keystore, paths, ColabError};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

pub const INSTALLER_VERSION: &str = env!("CARGO_PKG_VERSION");

const API_KEY_URL: &str = "https://claude-colab.ai/settings/api-keys";
const RULE: &str = "============================================================";

#[derive(Args, Default)]
pub struct InstallArgs {
    /// Add one bot to an existing install location
    #[arg(long)]
    pub add_bot: bool,

    /// Install location (skips the prompt)
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// API key for the bot (skips the prompt)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Bot name (skips the prompt)
    #[arg(long)]
    pub bot_name: Option<String>,

    /// Rank of the new bot in the hierarchy
    #[arg(long, default_value = "worker")]
    pub role: Role,

    /// Service URL written to shared/service.json
    #[arg(long, env = "COLAB_URL")]
    pub service_url: Option<String>,

    /// Public anon key written to shared/service.json
    #[arg(long, env = "COLAB_ANON_KEY")]
    pub anon_key: Option<String>,
}

pub fn run(home_flag: Option<&Path>, args: InstallArgs) -> anyhow::Result<()> {
    let stdin = std::io::stdin();
    let mut prompter = Prompter::new(stdin.lock(), std::io::stdout());
    let default = match home_flag {
        Some(p) => p.to_path_buf(),
        None => paths::default_home().context("cannot pick a default install location")?,
    };
    if args.add_bot {
        add_bot(&mut prompter, &default, args)
    } else {
        full_install(&mut prompter, &default, args)
    }
}

// ---------------------------------------------------------------------------
// Flows
// ---------------------------------------------------------------------------

fn full_install<R: BufRead, W: Write>(
    p: &mut Prompter<R, W>,
    default: &Path,
    args: InstallArgs,
) -> anyhow::Result<()> {
    print_banner();

    let location = match &args.path {
        Some(path) => path.clone(),
        None => PathBuf::from(p.ask("Install location", Some(&default.display().to_string()))?),
    };
    let home = home::absolute(&location)?;

    println!();
    println!("Installing to: {}", home.display());
    println!();
    create_dir(&home, "base directory")?;

    println!();
    println!("Setting up vault...");
    create_vault(&home)?;

    println!();
    println!("Setting up shared folder...");
    create_shared(&home, &args)?;

    println!();
    println!("You need a Claude Colab API key.");
    println!("Get one at: {API_KEY_URL}");
    println!();
    let api_key = ask_api_key(p, args.api_key.as_deref(), "Enter your API key (cc_...)")?;

    println!();
    let raw_name = match &args.bot_name {
        Some(name) => name.clone(),
        None => p.ask("Bot name (e.g., BLACK, INTOLERANT, WORKER1)", Some("BOT1"))?,
    };
    let name = paths::bot_name(&raw_name)?;

    println!();
    println!("Setting up bot: {name}");
    create_bot(&home, &name, args.role)?;

    println!();
    save_key(&home, &name, &api_key)?;

    let mut last = name;
    println!();
    while p.confirm("Add another bot?", false)? {
        println!();
        let api_key = ask_api_key(p, None, "API key for new bot (or same key)")?;
        let name = paths::bot_name(&p.ask("Bot name", None)?)?;
        ensure_new_bot(&home, &name)?;
        create_bot(&home, &name, args.role)?;
        save_key(&home, &name, &api_key)?;
        last = name;
        println!();
    }

    println!();
    println!("{RULE}");
    println!("  INSTALLATION COMPLETE!");
    println!("{RULE}");
    println!();
    println!("  Location: {}", home.display());
    println!();
    println!("  To start your bot:");
    let bot_dir = paths::bot_dir(&home, &last);
    if cfg!(windows) {
        println!("    cd {}", bot_dir.display());
        println!("    startup.bat");
    } else {
        println!("    cd {}", bot_dir.display());
        println!("    ./startup.sh");
    }
    println!();
    println!("  Read {} for the heartbeat loop.", paths::SOP_FILE);
    println!();
    Ok(())
}

fn add_bot<R: BufRead, W: Write>(
    p: &mut Prompter<R, W>,
    default: &Path,
    args: InstallArgs,
) -> anyhow::Result<()> {
    print_banner();

    let location = match &args.path {
        Some(path) => path.clone(),
        None => PathBuf::from(p.ask(
            "Existing install location",
            Some(&default.display().to_string()),
        )?),
    };
    let home = home::absolute(&location)?;
    if !home.is_dir() {
        return Err(ColabError::NotInstalled(home.display().to_string()).into());
    }

    println!();
    let api_key = ask_api_key(p, args.api_key.as_deref(), "API key for new bot")?;
    let raw_name = match &args.bot_name {
        Some(name) => name.clone(),
        None => p.ask("Bot name", None)?,
    };
    let name = paths::bot_name(&raw_name)?;
    ensure_new_bot(&home, &name)?;

    println!();
    println!("Adding bot: {name}");
    create_bot(&home, &name, args.role)?;
    save_key(&home, &name, &api_key)?;

    println!();
    println!("Bot {name} added successfully!");
    println!();
    Ok(())
}

fn print_banner() {
    println!();
    println!("{RULE}");
    println!("  CLAUDE COLAB CODE SWARM - Installer v{INSTALLER_VERSION}");
    println!("{RULE}");
    println!();
    println!("  Multi-agent AI coordination for:");
    println!("  - Claude CLI sessions");
    println!("  - API bots");
    println!("  - Discord bots");
    println!("  - Web Claudes");
    println!();
    println!("{RULE}");
    println!();
}

fn ask_api_key<R: BufRead, W: Write>(
    p: &mut Prompter<R, W>,
    given: Option<&str>,
    question: &str,
) -> anyhow::Result<String> {
    let key = match given {
        Some(k) => k.trim().to_string(),
        None => p.ask(question, None)?,
    };
    if key.is_empty() {
        bail!("an API key is required (get one at {API_KEY_URL})");
    }
    if !keystore::looks_valid(&key) {
        println!("Warning: API key should start with '{}'", keystore::KEY_PREFIX);
    }
    Ok(key)
}

fn ensure_new_bot(home: &Path, name: &str) -> anyhow::Result<()> {
    if paths::bot_dir(home, name).exists() {
        return Err(ColabError::BotExists(name.to_string()).into());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

fn create_dir(path: &Path, description: &str) -> anyhow::Result<()> {
    let created =
        io::ensure_dir(path).with_context(|| format!("failed to create {}", path.display()))?;
    if created {
        println!("  created: {} ({description})", path.display());
    } else {
        println!("  exists:  {}", path.display());
    }
    Ok(())
}

/// Write `content` unless the file is already there.
fn create_file(path: &Path, content: &str) -> anyhow::Result<()> {
    let written = io::write_if_missing(path, content.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;
    if written {
        println!("  created: {}", path.display());
    } else {
        println!("  exists:  {}", path.display());
    }
    Ok(())
}

/// Write `content`, replacing any previous version.
fn refresh_file(path: &Path, content: &str) -> anyhow::Result<()> {
    let existed = path.exists();
    io::atomic_write(path, content.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;
    let verb = if existed { "updated:" } else { "created:" };
    println!("  {verb} {}", path.display());
    Ok(())
}

pub fn create_vault(home: &Path) -> anyhow::Result<()> {
    create_dir(&paths::vault_dir(home), "knowledge vault")?;
    create_dir(&paths::notes_dir(home), "session notes")?;
    create_file(&paths::vault_dir(home).join(paths::VAULT_START_HERE), START_HERE)?;
    create_file(&paths::vault_dir(home).join(paths::VAULT_ABOUT_ME), ABOUT_ME)?;
    Ok(())
}

fn create_shared(home: &Path, args: &InstallArgs) -> anyhow::Result<()> {
    create_dir(&paths::shared_dir(home), "shared config")?;
    let path = paths::service_config_path(home);
    match (args.service_url.as_deref(), args.anon_key.as_deref()) {
        (Some(url), Some(anon)) if !url.trim().is_empty() && !anon.trim().is_empty() => {
            let existed = path.exists();
            ServiceConfig::new(url.trim(), anon.trim())
                .save(home)
                .context("failed to write service config")?;
            let verb = if existed { "updated:" } else { "created:" };
            println!("  {verb} {}", path.display());
        }
        _ if path.exists() => println!("  exists:  {}", path.display()),
        _ => {
            println!("  note: no service configured yet");
            println!(
                "        set COLAB_URL and COLAB_ANON_KEY, or re-run with --service-url and --anon-key"
            );
        }
    }
    Ok(())
}

/// Create or refresh a bot folder.
///
/// `config.json` and `ACTIVE_WORK.md` belong to the bot once written and are
/// never replaced. Startup scripts and `SOP.md` are regenerated every time.
pub fn create_bot(home: &Path, name: &str, role: Role) -> anyhow::Result<()> {
    let dir = paths::bot_dir(home, name);
    create_dir(&dir, &format!("bot: {name}"))?;

    let config_path = paths::bot_config_path(home, name);
    if config_path.exists() {
        println!("  exists:  {}", config_path.display());
    } else {
        BotConfig::new(name, role)
            .save(home)
            .with_context(|| format!("failed to write {}", config_path.display()))?;
        println!("  created: {}", config_path.display());
    }

    create_file(&paths::active_work_path(home, name), &render(ACTIVE_WORK, name, home))?;

    let bat = render(STARTUP_BAT, name, home).replace('\n', "\r\n");
    refresh_file(&paths::startup_bat_path(home, name), &bat)?;

    let sh = paths::startup_sh_path(home, name);
    refresh_file(&sh, &render(STARTUP_SH, name, home))?;
    io::set_executable(&sh).with_context(|| format!("failed to chmod {}", sh.display()))?;

    refresh_file(&paths::sop_path(home, name), &render(SOP, name, home))?;
    Ok(())
}

fn save_key(home: &Path, name: &str, api_key: &str) -> anyhow::Result<()> {
    keystore::stock_key(home, name, api_key).context("failed to save keystore")?;
    println!("  Saved API key for {name} ({})", keystore::mask_key(api_key));
    Ok(())
}

/// Fill `{bot}` and the install path placeholders.
///
/// `{home_sh}` is a single-quoted shell word and `{home_bat}` goes inside
/// double quotes in a batch file, where `%` must be doubled.
fn render(template: &str, name: &str, home: &Path) -> String {
    let home = home.display().to_string();
    template
        .replace("{bot}", name)
        .replace("{home_sh}", &sh_quote(&home))
        .replace("{home_bat}", &home.replace('%', "%%"))
        .replace("{home}", &home)
}

fn sh_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

const START_HERE: &str = r#"# Your Claude Vault

This is your persistent memory: notes and knowledge that survive across sessions.

## Getting Started

1. Read [[About Me]] to understand your identity
2. Check [[notes]] for session history
3. Update this vault as you learn

## Navigation

| Topic | File |
|-------|------|
| Your identity | [[About Me]] |
| Session notes | [[notes/]] |
| Active work | Check your bot folder |

## Tips

- Use `[[backlinks]]` to connect ideas
- Update About Me when you grow
- Keep session notes for continuity
- This is YOUR space, make it yours
"#;

const ABOUT_ME: &str = r#"# About Me

I am a Claude agent connected to Claude Colab.

## My Role
- [Describe your role here]
- What you do
- What you're responsible for

## My Values
- Get it right the first time
- Be helpful and accurate
- Collaborate with other Claudes

## My Context
- I'm part of a multi-agent system
- I share knowledge via Claude Colab
- My notes persist here in the vault

## Links
- [[START HERE]] - Vault navigation
- [[notes/]] - Session history
"#;

const ACTIVE_WORK: &str = r#"# {bot} - Active Work

## Current Task
None

## Pending
- [ ] Connect to Claude Colab
- [ ] Set up heartbeat loop
- [ ] Start working

## Recently Completed
(none yet)

---
*Update this file to track your work across sessions*
"#;

const STARTUP_BAT: &str = r#"@echo off
echo ==========================================
echo  {bot} - Claude Colab Bot
echo ==========================================
echo.

where colab >nul 2>&1
if errorlevel 1 (
    echo ERROR: colab not found on PATH. Install it and try again.
    pause
    exit /b 1
)

echo Starting {bot}...
colab run --name {bot} --home "{home_bat}"

if errorlevel 1 (
    echo.
    echo ERROR: {bot} stopped. Check your API key and connection.
    pause
)
"#;

const STARTUP_SH: &str = r#"#!/bin/sh
echo "=========================================="
echo "  {bot} - Claude Colab Bot"
echo "=========================================="
echo

if ! command -v colab >/dev/null 2>&1; then
    echo "ERROR: colab not found on PATH. Install it and try again."
    exit 1
fi

echo "Starting {bot}..."
exec colab run --name {bot} --home {home_sh}
"#;

const SOP: &str = r#"# {bot} - Standard Operating Procedures

## Startup
1. Run startup.bat (Windows) or ./startup.sh (Linux/Mac)
2. The bot connects to Claude Colab with the key stored for {bot}
3. The heartbeat loop starts and logs mentions and pending tasks

One heartbeat, for scripts and health checks:

```sh
colab run --name {bot} --home {home_sh} --once --json
```

## Heartbeat Loop (Rust SDK)
```rust
use colab_client::{ColabClient, ConnectOptions, HeartbeatOptions};
use colab_core::config::ServiceConfig;

let home = std::path::Path::new(r"{home}");
let mut colab = ColabClient::new(ServiceConfig::resolve(home)?)?.with_home(home);
colab.connect(ConnectOptions::named("{bot}"))?;

loop {
    let hb = colab.heartbeat(&HeartbeatOptions::default())?;
    if hb.has_work {
        let mentions = colab.get_mentions(20)?;
        let tasks = colab.get_tasks(Some("pending"))?;
        // handle work...
    }
    std::thread::sleep(std::time::Duration::from_secs(60));
}
```

## Backup Rules
- ALWAYS backup before editing: `cp file.rs file-0001.rs`
- Find the highest backup number first
- NEVER edit backup files

## Communication
- `colab --name {bot} chat "message"` posts to the project channel
- `colab --name {bot} chat --mentions` shows messages addressed to you
- `colab --name {bot} tasks claim <id>` claims a task

## Vault
- Update ../vault/ with learnings
- Keep ACTIVE_WORK.md current
- Reference [[About Me]] for identity
"#;
