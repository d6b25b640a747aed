use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "battle-web", version, about = "Agent battle web front-end")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the battle page.
    Serve(ServeOpts),
    /// Inspect settings and the resolved app config.
    Config(ConfigOpts),
    /// Run a scripted battle against an in-process agent.
    Rehearse(RehearseOpts),
    Version,
}

#[derive(clap::Args)]
pub struct ServeOpts {
    #[arg(short, long)]
    pub config: Option<String>,
    #[arg(short, long)]
    pub port: Option<u16>,
    #[arg(short, long)]
    pub bind: Option<String>,
}

#[derive(clap::Args)]
pub struct ConfigOpts {
    #[arg(short, long)]
    pub config: Option<String>,
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Resolve and print the app config.
    Show {
        /// Sandbox id, as if sent in the X-Sandbox-ID header.
        #[arg(long)]
        sandbox_id: Option<String>,
    },
    Validate,
}

#[derive(clap::Args)]
pub struct RehearseOpts {
    #[arg(short, long)]
    pub config: Option<String>,
    #[arg(short, long, default_value = "Celebrate my questionable dance moves")]
    pub instructions: String,
    /// Respond (protect) instead of complimenting first.
    #[arg(long)]
    pub protect: bool,
    /// Never report the agent as ready, to exercise the watchdog.
    #[arg(long)]
    pub agent_never_ready: bool,
}
