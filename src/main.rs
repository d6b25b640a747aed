use battle_web::app_config::ConfigResolver;
use battle_web::cli::{Cli, Commands, ConfigAction};
use battle_web::config::{
    validate_settings, validate_settings_object, LoggingSettings, Settings,
};
use battle_web::logging;
use battle_web::rehearse::{run_rehearsal, RehearsalMode};
use battle_web::web::WebServer;
use clap::Parser;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(opts) => {
            let settings = Settings::load(opts.config.as_deref())?;
            logging::init(&settings.logging);
            info!("Starting battle-web server");
            let server = WebServer::new(settings, &opts)?;
            server.run_until_shutdown().await?;
        }
        Commands::Config(opts) => match opts.action {
            ConfigAction::Show { sandbox_id } => {
                let settings = Settings::load(opts.config.as_deref())?;
                logging::init(&settings.logging);
                let resolver = ConfigResolver::new(&settings.app_config)?;
                let config = resolver.resolve(sandbox_id.as_deref()).await;
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
            ConfigAction::Validate => {
                logging::init(&LoggingSettings::default());
                let settings = Settings::load(opts.config.as_deref())?;
                let errors = validate_settings(&settings);
                if errors.is_empty() {
                    info!("Settings are valid");
                } else {
                    for e in &errors {
                        error!("{}", e);
                    }
                    anyhow::bail!("{} settings errors", errors.len());
                }
            }
        },
        Commands::Rehearse(opts) => {
            let settings = Settings::load(opts.config.as_deref())?;
            logging::init(&settings.logging);
            validate_settings_object(&settings)?;

            let mode = if opts.agent_never_ready {
                RehearsalMode::AgentNeverReady
            } else if opts.protect {
                RehearsalMode::Protect
            } else {
                RehearsalMode::Attack
            };

            let report = run_rehearsal(&settings.battle, &opts.instructions, mode).await?;
            for directive in &report.directives {
                println!("agent: {directive:?}");
            }
            if let Some(alert) = &report.alert {
                println!("{}: {} ({})", alert.title, alert.description(), alert.guide_url);
            }
            println!("microphone enabled: {}", report.microphone_enabled);
            println!("battle started: {}", report.battle_started);
            println!("final phase: {:?}", report.final_phase);
        }
        Commands::Version => {
            println!("battle-web {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
