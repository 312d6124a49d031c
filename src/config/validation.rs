use super::{Config, ServiceConfig};
use crate::error::{Error, Result};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Service names are plain identifiers.
static SERVICE_NAME_REGEX: OnceLock<Regex> = OnceLock::new();

fn service_name_regex() -> &'static Regex {
    SERVICE_NAME_REGEX
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9_]+$").expect("static regex pattern is valid"))
}

/// Validate a single service's name and configuration.
pub fn validate_service(name: &str, config: &ServiceConfig) -> Result<()> {
    if !service_name_regex().is_match(name) {
        return Err(Error::Validation(format!("Invalid service name: {}", name)));
    }

    if config.container.image.is_some() && config.build.is_some() {
        return Err(Error::Validation(format!(
            "Service {} has both an image and build path specified. \
             A service can either be built to image or use an existing image, not both.",
            name
        )));
    }

    Ok(())
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        for name in self.service_names() {
            let definition = &self.services[&name];
            validate_service(&name, &definition.config)?;

            for link in &definition.links {
                if !self.services.contains_key(link) {
                    return Err(Error::Validation(format!(
                        "Service '{}' links to non-existent service '{}'",
                        name, link
                    )));
                }
            }
        }

        self.start_order()?;
        Ok(())
    }

    /// Service names ordered so that every service comes after the services
    /// it links to.
    ///
    /// Ties are broken alphabetically. A link cycle is reported with the
    /// path that closes it.
    pub fn start_order(&self) -> Result<Vec<String>> {
        let mut order = Vec::with_capacity(self.services.len());
        let mut done = HashSet::new();

        for name in self.service_names() {
            let mut path = Vec::new();
            self.visit(&name, &mut path, &mut done, &mut order)?;
        }

        Ok(order)
    }

    fn visit(
        &self,
        name: &str,
        path: &mut Vec<String>,
        done: &mut HashSet<String>,
        order: &mut Vec<String>,
    ) -> Result<()> {
        if done.contains(name) {
            return Ok(());
        }
        if let Some(pos) = path.iter().position(|p| p == name) {
            let mut cycle = path[pos..].to_vec();
            cycle.push(name.to_string());
            return Err(Error::CircularLink(cycle));
        }

        let definition = self
            .services
            .get(name)
            .ok_or_else(|| Error::ServiceNotFound(name.to_string()))?;

        path.push(name.to_string());
        for link in &definition.links {
            self.visit(link, path, done, order)?;
        }
        path.pop();

        done.insert(name.to_string());
        order.push(name.to_string());
        Ok(())
    }
}
