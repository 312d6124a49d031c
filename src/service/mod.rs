//! Services: named groups of container instances.
//!
//! - [`naming`] encodes and decodes `<service>_<number>` container names
//! - `lifecycle` holds [`Service`] and the scale algorithm
//! - `options` merges config and overrides into creation requests
//! - `links` resolves linked peers to name/alias pairs
//!
//! # Example
//!
//! ```no_run
//! use dockscale::config::ServiceConfig;
//! use dockscale::docker::DockerClient;
//! use dockscale::service::Service;
//! use std::sync::Arc;
//!
//! # async fn example() -> dockscale::Result<()> {
//! let runtime = Arc::new(DockerClient::new());
//! let db = Arc::new(Service::new("db", runtime.clone(), &[], ServiceConfig::image("postgres:16"))?);
//! let web = Service::new("web", runtime, &[db.clone()], ServiceConfig::build("./web"))?;
//!
//! db.start().await?;
//! web.scale(3).await?;
//! # Ok(())
//! # }
//! ```

mod lifecycle;
mod links;
pub mod naming;
mod options;

pub use lifecycle::Service;
pub use naming::{container_name, parse_container_name, strip_name_prefix};
