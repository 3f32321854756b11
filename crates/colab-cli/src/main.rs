mod cmd;
mod home;
mod output;
mod prompt;

use clap::{Parser, Subcommand};
use cmd::{
    bot::BotSubcommand, install::InstallArgs, keys::KeysSubcommand,
    knowledge::KnowledgeSubcommand, tasks::TasksSubcommand, Remote,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "colab",
    about = "Claude Colab swarm: install bots, manage their keys, and keep them connected",
    version,
    propagate_version = true
)]
struct Cli {
    /// Install location (default: C:\CLAUDE on Windows, ~/claude elsewhere)
    #[arg(long, global = true, env = "COLAB_HOME")]
    home: Option<PathBuf>,

    /// Bot to act as
    #[arg(long, global = true, env = "COLAB_BOT")]
    name: Option<String>,

    /// Project (channel) for remote commands (default: the bot's configured project)
    #[arg(long, global = true, env = "COLAB_PROJECT")]
    project: Option<String>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Set up an install location and its first bot, or add a bot with --add-bot
    Install(InstallArgs),

    /// Manage the local key store
    Keys {
        #[command(subcommand)]
        subcommand: KeysSubcommand,
    },

    /// Inspect and configure local bots
    Bot {
        #[command(subcommand)]
        subcommand: BotSubcommand,
    },

    /// Connect and send heartbeats until interrupted
    Run {
        /// Send a single heartbeat, print the response, and exit
        #[arg(long)]
        once: bool,
    },

    /// Show connection status and counts
    Status,

    /// Post to the project channel, or show recent messages when no message is given
    Chat {
        message: Vec<String>,
        /// Flag the message as urgent
        #[arg(long)]
        urgent: bool,
        /// Number of messages to show
        #[arg(long, default_value_t = 20)]
        limit: usize,
        /// Show only messages that mention this bot
        #[arg(long, conflicts_with = "message")]
        mentions: bool,
    },

    /// Work with shared tasks
    Tasks {
        #[command(subcommand)]
        subcommand: TasksSubcommand,
    },

    /// Work with shared knowledge
    Knowledge {
        #[command(subcommand)]
        subcommand: KnowledgeSubcommand,
    },

    /// List bots seen recently
    Online {
        /// Look-back window in minutes
        #[arg(long, default_value_t = 5)]
        minutes: u32,
    },

    /// List projects, or summarize one
    Projects {
        /// Summarize this project instead of listing
        #[arg(long)]
        summary: Option<String>,
    },

    /// Check for unanswered mentions and pending tasks before starting work
    Checkpoint {
        /// Checkpoint label, e.g. "before-deploy"
        #[arg(value_name = "NAME")]
        label: String,
        /// Exit with an error while anything is outstanding
        #[arg(long)]
        hard: bool,
        /// Also check pending tasks assigned to this bot
        #[arg(long)]
        tasks: bool,
        /// Skip the mention check
        #[arg(long)]
        no_mentions: bool,
    },

    /// Write the bot's assignment briefing (markdown)
    Context {
        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Invite a person to the team by email
    Invite {
        email: String,
        #[arg(long, default_value = "member")]
        role: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Run { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = dispatch(cli);

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn dispatch(cli: Cli) -> anyhow::Result<()> {
    let Cli {
        home: home_flag,
        name,
        project,
        json,
        command,
    } = cli;
    let remote = || -> anyhow::Result<Remote> {
        Ok(Remote {
            home: home::resolve_home(home_flag.as_deref())?,
            bot: name.clone(),
            project: project.clone(),
        })
    };

    match command {
        Commands::Install(args) => cmd::install::run(home_flag.as_deref(), args),
        Commands::Keys { subcommand } => cmd::keys::run(&remote()?, subcommand, json),
        Commands::Bot { subcommand } => cmd::bot::run(&remote()?.home, subcommand, json),
        Commands::Run { once } => cmd::run::run(&remote()?, once, json),
        Commands::Status => cmd::status::run(&remote()?, json),
        Commands::Chat {
            message,
            urgent,
            limit,
            mentions,
        } => cmd::chat::run(&remote()?, &message.join(" "), urgent, limit, mentions, json),
        Commands::Tasks { subcommand } => cmd::tasks::run(&remote()?, subcommand, json),
        Commands::Knowledge { subcommand } => cmd::knowledge::run(&remote()?, subcommand, json),
        Commands::Online { minutes } => cmd::online::run(&remote()?, minutes, json),
        Commands::Projects { summary } => {
            cmd::projects::run(&remote()?, summary.as_deref(), json)
        }
        Commands::Checkpoint {
            label,
            hard,
            tasks,
            no_mentions,
        } => cmd::checkpoint::run(&remote()?, &label, hard, !no_mentions, tasks, json),
        Commands::Context { output } => cmd::context::run(&remote()?, output.as_deref()),
        Commands::Invite { email, role } => cmd::invite::run(&remote()?, &email, &role, json),
    }
}
