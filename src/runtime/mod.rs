//! Container runtime boundary.
//!
//! [`ContainerRuntime`] is the contract every backend implements: list,
//! create, start, kill, build and inspect. Services never talk to Docker
//! directly; they hold an `Arc<dyn ContainerRuntime>` and issue one call at a
//! time through it.
//!
//! Two implementations ship with the crate:
//!
//! - [`DockerClient`](crate::docker::DockerClient) drives the `docker` CLI
//! - [`MemoryRuntime`] keeps containers in process, for tests and embedding

mod error;
pub mod memory;

pub use error::RuntimeError;
pub use memory::{MemoryContainer, MemoryRuntime, Operation};

use crate::config::ContainerOptions;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Mapping from a peer container name to the alias it is reachable under.
pub type LinkMap = BTreeMap<String, String>;

/// One entry of a container listing, as the engine reports it.
///
/// Names carry the engine's leading `/` (e.g. `"/web_1"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSummary {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Names", default)]
    pub names: Vec<String>,
}

/// Result of a successful create call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedContainer {
    #[serde(rename = "Id")]
    pub id: String,
}

/// Fully materialized creation request for a single container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateOptions {
    pub name: String,
    #[serde(flatten)]
    pub options: ContainerOptions,
}

/// Operations a container runtime must provide.
///
/// Every method is a single blocking round-trip from the caller's point of
/// view. Implementations must not retry on their own.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// List the running containers.
    async fn list_containers(&self) -> Result<Vec<ContainerSummary>, RuntimeError>;

    /// Create (but do not start) a container.
    ///
    /// Fails with [`RuntimeError::NameConflict`] when any existing container,
    /// running or not, already has the requested name.
    async fn create_container(
        &self,
        options: &CreateOptions,
    ) -> Result<CreatedContainer, RuntimeError>;

    /// Start a created container, making `links` resolvable from inside it.
    ///
    /// A container that fails to start is removed before the error returns.
    async fn start_container(&self, id: &str, links: &LinkMap) -> Result<(), RuntimeError>;

    /// Kill a container (SIGKILL, no grace period) and remove it.
    async fn kill_container(&self, id: &str) -> Result<(), RuntimeError>;

    /// Build an image from a context directory.
    ///
    /// The first element of the returned sequence is the image id.
    async fn build(&self, context: &Path) -> Result<Vec<String>, RuntimeError>;

    /// Return the runtime's detailed record for one container.
    async fn inspect_container(&self, id: &str) -> Result<serde_json::Value, RuntimeError>;
}
