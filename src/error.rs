// Allow unused_assignments at module level because thiserror's generated code
// for struct variants triggers false positive warnings - the fields ARE used
// in the Display impl but rustc's lint pass doesn't see this.
#![allow(unused_assignments)]

use crate::runtime::RuntimeError;
use miette::Diagnostic;
use std::io;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    #[diagnostic(
        code(dockscale::config::validation),
        help("Check the service definition named above in dockscale.yaml, including its links")
    )]
    Validation(String),

    #[error("Invalid container name: {0}")]
    #[diagnostic(
        code(dockscale::naming::parse),
        help("Managed containers are named `<service>_<number>`; remove or rename containers that do not follow this pattern")
    )]
    Parse(String),

    #[error("Container runtime error: {0}")]
    #[diagnostic(
        code(dockscale::runtime::error),
        help("Check that Docker is running with `docker ps`")
    )]
    Runtime(#[from] RuntimeError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Service not found: {0}")]
    #[diagnostic(
        code(dockscale::service::not_found),
        help("Check the services declared in your dockscale.yaml")
    )]
    ServiceNotFound(String),

    #[error("Circular link detected: {}", .0.join(" -> "))]
    #[diagnostic(
        code(dockscale::link::circular),
        help("Services cannot link to each other in a cycle. Review the links fields")
    )]
    CircularLink(Vec<String>),

    #[error("Service '{service}' links to '{link}', which is no longer available")]
    LinkUnavailable { service: String, link: String },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns a helpful suggestion for resolving this error, if available.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Error::ServiceNotFound(name) => Some(format!(
                "Declare '{}' under `services:` in dockscale.yaml, or check the spelling.",
                name
            )),
            Error::CircularLink(path) => Some(format!(
                "Services cannot link to each other in a cycle. Review the links fields for: {}",
                path.join(", ")
            )),
            Error::Parse(name) => Some(format!(
                "Container '{}' does not end in `_<number>`. Rename or remove it, it blocks membership detection.",
                name
            )),
            Error::Config(msg) if msg.contains("Could not find") => None,
            Error::Config(_) | Error::Validation(_) => {
                Some("Check your dockscale.yaml against the documented keys".to_string())
            }
            Error::Runtime(RuntimeError::DaemonUnavailable) => {
                Some("Start the Docker daemon and retry".to_string())
            }
            Error::Runtime(RuntimeError::NameConflict { name }) => Some(format!(
                "A container named '{}' already exists. Remove it with `docker rm -f {}`",
                name, name
            )),
            Error::Runtime(_) => Some("Check that Docker is running: docker ps".to_string()),
            _ => None,
        }
    }

    /// Formats the error with its suggestion (if any) for user-friendly display.
    pub fn with_suggestion(&self) -> String {
        match self.suggestion() {
            Some(suggestion) => format!("{}\n\nHint: {}", self, suggestion),
            None => self.to_string(),
        }
    }
}
