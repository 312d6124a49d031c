use super::links::{resolve_links, Link};
use super::naming::{parse_container_name, strip_name_prefix};
use crate::config::{validate_service, ContainerOptions, ServiceConfig};
use crate::error::{Error, Result};
use crate::runtime::{ContainerRuntime, ContainerSummary};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A named group of container instances.
///
/// Membership is never stored. Every operation lists the runtime's containers
/// and keeps the ones whose name decodes to this service's name, so the view
/// is always the runtime's current state.
///
/// Nothing here serializes concurrent callers: two tasks scaling the same
/// service name at once will race.
pub struct Service {
    name: String,
    runtime: Arc<dyn ContainerRuntime>,
    links: Vec<Link>,
    config: ServiceConfig,
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("name", &self.name)
            .field("links", &self.links)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Service {
    /// Create a service after validating its name and config.
    ///
    /// `links` are held without ownership: the caller keeps the linked
    /// services alive for as long as this one starts containers.
    pub fn new(
        name: impl Into<String>,
        runtime: Arc<dyn ContainerRuntime>,
        links: &[Arc<Service>],
        config: ServiceConfig,
    ) -> Result<Self> {
        let name = name.into();
        validate_service(&name, &config)?;

        Ok(Self {
            name,
            runtime,
            links: links.iter().map(Link::to).collect(),
            config,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Names of the linked services, in declaration order.
    pub fn link_names(&self) -> Vec<&str> {
        self.links.iter().map(|l| l.name.as_str()).collect()
    }

    pub(crate) fn runtime(&self) -> &dyn ContainerRuntime {
        self.runtime.as_ref()
    }

    /// Running containers that belong to this service, in listing order.
    pub async fn containers(&self) -> Result<Vec<ContainerSummary>> {
        let listed = self.runtime.list_containers().await?;

        let mut matching = Vec::new();
        for container in listed {
            let (service_name, _) = parse_container_name(container_name(&container)?)?;
            if service_name == self.name {
                matching.push(container);
            }
        }
        Ok(matching)
    }

    /// Start a first instance if none is running.
    ///
    /// Returns the new container's id, or `None` when at least one instance
    /// was already running.
    pub async fn start(&self) -> Result<Option<String>> {
        if self.containers().await?.is_empty() {
            let id = self.start_container(ContainerOptions::default()).await?;
            return Ok(Some(id));
        }
        Ok(None)
    }

    /// Kill every instance.
    pub async fn stop(&self) -> Result<()> {
        self.scale(0).await
    }

    /// Create or kill instances, one at a time, until `target` are running.
    ///
    /// The count is listed afresh before every step. On error, instances
    /// created or killed so far stay that way; calling `scale` again
    /// continues from the observed state.
    pub async fn scale(&self, target: usize) -> Result<()> {
        loop {
            let running = self.containers().await?.len();
            if running >= target {
                break;
            }
            debug!("{}: {} of {} running, starting one", self.name, running, target);
            self.start_container(ContainerOptions::default()).await?;
        }

        loop {
            let running = self.containers().await?.len();
            if running <= target {
                break;
            }
            debug!("{}: {} of {} running, stopping one", self.name, running, target);
            self.stop_container().await?;
        }

        Ok(())
    }

    /// Number for the next instance: one past the highest running number.
    pub async fn next_container_number(&self) -> Result<u32> {
        let mut highest = None;
        for container in self.containers().await? {
            let (_, number) = parse_container_name(container_name(&container)?)?;
            highest = highest.max(Some(number));
        }

        match highest {
            None => Ok(1),
            Some(number) => number.checked_add(1).ok_or_else(|| {
                Error::Parse(format!("{}: instance number {} is at the limit", self.name, number))
            }),
        }
    }

    /// Create and start one instance, returning its container id.
    ///
    /// If the service builds its image, the build runs first, every time.
    pub async fn start_container(&self, overrides: ContainerOptions) -> Result<String> {
        let options = self.container_options(overrides).await?;
        let created = self.runtime.create_container(&options).await?;

        let links = resolve_links(&self.name, &self.links).await?;
        self.runtime.start_container(&created.id, &links).await?;

        debug!("{}: started {} ({})", self.name, options.name, created.id);
        Ok(created.id)
    }

    /// Kill one instance, returning its id, or `None` if none is running.
    ///
    /// The victim is whichever container the runtime lists first; no
    /// ordering by number or age is applied.
    pub async fn stop_container(&self) -> Result<Option<String>> {
        let Some(container) = self.containers().await?.into_iter().next() else {
            return Ok(None);
        };

        self.runtime.kill_container(&container.id).await?;
        debug!("{}: killed {}", self.name, container.id);
        Ok(Some(container.id))
    }

    /// Names of this service's running containers, prefix stripped.
    pub async fn get_names(&self) -> Result<Vec<String>> {
        self.containers()
            .await?
            .iter()
            .map(|c| container_name(c).map(str::to_string))
            .collect()
    }

    /// Detailed runtime record for each running container.
    pub async fn inspect(&self) -> Result<Vec<serde_json::Value>> {
        let mut records = Vec::new();
        for container in self.containers().await? {
            records.push(self.runtime.inspect_container(&container.id).await?);
        }
        Ok(records)
    }
}

/// First listed name of a container with the runtime prefix removed.
fn container_name(container: &ContainerSummary) -> Result<&str> {
    container
        .names
        .first()
        .map(|raw| strip_name_prefix(raw))
        .ok_or_else(|| Error::Parse(format!("container {} has no name", container.id)))
}
