//! # dockscale
//!
//! Scale named groups of containers on top of a container runtime.
//!
//! A *service* is a name plus a container configuration. Its instances are the
//! running containers named `<service>_<number>`; no registry is kept, so the
//! runtime's container list is the single source of truth.
//!
//! ## Features
//!
//! - **Scaling**: converge a service to a target instance count, one
//!   container at a time, re-reading the runtime's state before each step
//! - **Builds**: services may build their image from a context directory
//!   before each new instance
//! - **Links**: instances are started with name/alias entries for every
//!   running instance of the services they link to
//! - **Project files**: declare several services in `dockscale.yaml`
//!
//! ## Quick Start
//!
//! ```no_run
//! use dockscale::{DockerClient, Parser, Project};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), dockscale::Error> {
//! let config = Parser::new().load_config("dockscale.yaml")?;
//! let project = Project::from_config(&config, Arc::new(DockerClient::new()))?;
//!
//! project.start(&[]).await?;
//! project.scale("web", 3).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod docker;
pub mod error;
pub mod project;
pub mod runtime;
pub mod service;

// Re-export commonly used types
pub use config::{Config, ContainerOptions, Parser, ServiceConfig};
pub use docker::DockerClient;
pub use error::{Error, Result};
pub use project::Project;
pub use runtime::{ContainerRuntime, MemoryRuntime, RuntimeError};
pub use service::Service;
