mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use dockscale::docker::{wait_for_daemon, DaemonWait, DockerClient};
use dockscale::{Error as ScaleError, Parser as ConfigParser, Project, RuntimeError};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        if let Some(scale_error) = e.downcast_ref::<ScaleError>() {
            eprintln!("Error: {}", scale_error.with_suggestion());
        } else {
            eprintln!("Error: {:#}", e);
        }
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let parser = ConfigParser::new();
    let config_path = match cli.config.clone() {
        Some(path) => path,
        None => parser.find_config_file()?,
    };
    let config = parser.load_config(&config_path)?;
    tracing::debug!("Loaded {}", config_path.display());

    let client = match config.network.as_deref() {
        Some(network) => DockerClient::with_network(network),
        None => DockerClient::new(),
    };
    if !wait_for_daemon(&client, DaemonWait::default()).await {
        return Err(ScaleError::Runtime(RuntimeError::DaemonUnavailable).into());
    }
    client.ensure_network().await.map_err(ScaleError::from)?;

    let project = Project::from_config(&config, Arc::new(client))?;

    match cli.command {
        Commands::Up { services } => project.start(&services).await?,
        Commands::Stop { services } => project.stop(&services).await?,
        Commands::Scale { targets } => {
            // Check every name before touching any service.
            for (name, _) in &targets {
                project.service(name)?;
            }
            for (name, count) in targets {
                project.scale(&name, count).await?;
            }
        }
        Commands::Ps { services } => {
            for service in project.select(&services)? {
                for name in service.get_names().await? {
                    println!("{}", name);
                }
            }
        }
        Commands::Inspect { service } => {
            let records = project.service(&service)?.inspect().await?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
