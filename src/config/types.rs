//! Root configuration structure for the project file.

use super::ServiceDefinition;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Root configuration structure for dockscale.yaml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// User-defined network containers join when they are linked to peers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,

    #[serde(default)]
    pub services: HashMap<String, ServiceDefinition>,
}

impl Config {
    /// Service names in a stable (sorted) order.
    pub fn service_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.services.keys().cloned().collect();
        names.sort();
        names
    }
}
