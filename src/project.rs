//! A set of services loaded from one project file.
//!
//! The project owns its services; services only hold weak references to the
//! peers they link to, so services are created in link order (peers first)
//! and dropped together with the project.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::runtime::ContainerRuntime;
use crate::service::Service;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

#[derive(Debug)]
pub struct Project {
    /// Services in link order: every service follows the peers it links to.
    services: Vec<Arc<Service>>,
}

impl Project {
    /// Validate `config` and instantiate its services against `runtime`.
    pub fn from_config(config: &Config, runtime: Arc<dyn ContainerRuntime>) -> Result<Self> {
        config.validate()?;

        let mut by_name: HashMap<String, Arc<Service>> = HashMap::new();
        let mut services = Vec::with_capacity(config.services.len());

        for name in config.start_order()? {
            let definition = &config.services[&name];
            let links = definition
                .links
                .iter()
                .map(|link| {
                    by_name
                        .get(link)
                        .cloned()
                        .ok_or_else(|| Error::ServiceNotFound(link.clone()))
                })
                .collect::<Result<Vec<_>>>()?;

            let service = Arc::new(Service::new(
                name.clone(),
                runtime.clone(),
                &links,
                definition.config.clone(),
            )?);
            by_name.insert(name, service.clone());
            services.push(service);
        }

        Ok(Self { services })
    }

    /// All services, peers before the services that link to them.
    pub fn services(&self) -> &[Arc<Service>] {
        &self.services
    }

    pub fn service(&self, name: &str) -> Result<&Arc<Service>> {
        self.services
            .iter()
            .find(|s| s.name() == name)
            .ok_or_else(|| Error::ServiceNotFound(name.to_string()))
    }

    /// Select services by name, keeping link order. An empty selection
    /// means every service.
    pub fn select(&self, names: &[String]) -> Result<Vec<Arc<Service>>> {
        for name in names {
            self.service(name)?;
        }

        Ok(self
            .services
            .iter()
            .filter(|s| names.is_empty() || names.iter().any(|n| n == s.name()))
            .cloned()
            .collect())
    }

    /// Start one instance of each selected service that has none running.
    pub async fn start(&self, names: &[String]) -> Result<()> {
        for service in self.select(names)? {
            if let Some(id) = service.start().await? {
                info!("Started {} ({})", service.name(), id);
            }
        }
        Ok(())
    }

    /// Stop the selected services, dependents before their peers.
    pub async fn stop(&self, names: &[String]) -> Result<()> {
        for service in self.select(names)?.iter().rev() {
            info!("Stopping {}", service.name());
            service.stop().await?;
        }
        Ok(())
    }

    /// Scale one service to `target` instances.
    pub async fn scale(&self, name: &str, target: usize) -> Result<()> {
        let service = self.service(name)?;
        info!("Scaling {} to {}", name, target);
        service.scale(target).await
    }
}
