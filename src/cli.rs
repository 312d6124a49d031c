use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dockscale")]
#[command(about = "Scale named groups of Docker containers")]
pub struct Cli {
    /// Config file path (defaults to dockscale.yaml, searched upward)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start one instance of each service that has none running
    Up {
        /// Services to start (defaults to all)
        services: Vec<String>,
    },
    /// Set the number of instances per service
    Scale {
        /// Targets in the form SERVICE=COUNT
        #[arg(required = true, value_parser = parse_scale_target)]
        targets: Vec<(String, usize)>,
    },
    /// Kill every instance of the given services
    Stop {
        /// Services to stop (defaults to all)
        services: Vec<String>,
    },
    /// List running instances
    Ps {
        /// Services to list (defaults to all)
        services: Vec<String>,
    },
    /// Print the runtime's detailed record for each instance
    Inspect {
        /// Service name
        service: String,
    },
}

fn parse_scale_target(s: &str) -> Result<(String, usize), String> {
    let (name, count) = s
        .split_once('=')
        .ok_or_else(|| format!("expected SERVICE=COUNT, got '{}'", s))?;
    let count = count
        .parse::<usize>()
        .map_err(|_| format!("'{}' is not a valid instance count", count))?;
    Ok((name.to_string(), count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn scale_targets_parse() {
        let cli = Cli::try_parse_from(["dockscale", "scale", "web=3", "db=0"]).unwrap();
        match cli.command {
            Commands::Scale { targets } => {
                assert_eq!(targets, vec![("web".to_string(), 3), ("db".to_string(), 0)]);
            }
            _ => panic!("expected scale"),
        }
    }

    #[test]
    fn bad_scale_target_is_rejected() {
        assert!(Cli::try_parse_from(["dockscale", "scale", "web"]).is_err());
        assert!(Cli::try_parse_from(["dockscale", "scale", "web=-1"]).is_err());
    }
}
