//! Service configuration types.
//!
//! [`ContainerOptions`] holds the keys that are passed through to container
//! creation. [`ServiceConfig`] adds the image source (`build`), and
//! [`ServiceDefinition`] adds project-level wiring (`links`).

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Container command, written either as one line or as an argument list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandSpec {
    Line(String),
    Args(Vec<String>),
}

impl CommandSpec {
    /// Arguments as passed to the runtime. A line is split on whitespace.
    pub fn args(&self) -> Vec<String> {
        match self {
            CommandSpec::Line(line) => line.split_whitespace().map(str::to_string).collect(),
            CommandSpec::Args(args) => args.clone(),
        }
    }
}

/// Options recognized for container creation.
///
/// Every field is optional so that "not set" is distinguishable from an empty
/// value when per-call overrides are layered on top of a service's config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<CommandSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detach: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdin_open: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tty: Option<bool>,

    /// Memory limit in the runtime's notation, e.g. `"512m"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mem_limit: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ports: Option<Vec<String>>,

    /// Written as a map or as a list of `KEY=value` entries. Map values may be
    /// any scalar and are passed on as their string form.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_environment"
    )]
    pub environment: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volumes: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volumes_from: Option<Vec<String>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EnvValue {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Text(String),
}

impl From<EnvValue> for String {
    fn from(value: EnvValue) -> Self {
        match value {
            EnvValue::Bool(b) => b.to_string(),
            EnvValue::Int(n) => n.to_string(),
            EnvValue::Uint(n) => n.to_string(),
            EnvValue::Float(x) => x.to_string(),
            EnvValue::Text(s) => s,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Environment {
    Map(BTreeMap<String, Option<EnvValue>>),
    List(Vec<String>),
}

fn deserialize_environment<'de, D>(
    deserializer: D,
) -> Result<Option<BTreeMap<String, String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let env = match Option::<Environment>::deserialize(deserializer)? {
        None => return Ok(None),
        // A key with no value is set to the empty string.
        Some(Environment::Map(map)) => map
            .into_iter()
            .map(|(key, value)| (key, value.map(String::from).unwrap_or_default()))
            .collect(),
        Some(Environment::List(entries)) => entries
            .into_iter()
            .map(|entry| match entry.split_once('=') {
                Some((key, value)) => (key.to_string(), value.to_string()),
                None => (entry, String::new()),
            })
            .collect(),
    };
    Ok(Some(env))
}

impl ContainerOptions {
    /// Layer `overrides` on top of `self`. A key set in `overrides` always
    /// wins, including when `self` already sets it.
    pub fn overlay(self, overrides: ContainerOptions) -> ContainerOptions {
        ContainerOptions {
            image: overrides.image.or(self.image),
            command: overrides.command.or(self.command),
            hostname: overrides.hostname.or(self.hostname),
            user: overrides.user.or(self.user),
            detach: overrides.detach.or(self.detach),
            stdin_open: overrides.stdin_open.or(self.stdin_open),
            tty: overrides.tty.or(self.tty),
            mem_limit: overrides.mem_limit.or(self.mem_limit),
            ports: overrides.ports.or(self.ports),
            environment: overrides.environment.or(self.environment),
            dns: overrides.dns.or(self.dns),
            volumes: overrides.volumes.or(self.volumes),
            volumes_from: overrides.volumes_from.or(self.volumes_from),
        }
    }
}

/// Static configuration of one service.
///
/// A service either runs an existing `image` (inside `container`) or
/// builds one from the `build` context. Setting both is rejected by
/// [`validate_service`](super::validate_service).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Build context directory for the service's image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<PathBuf>,

    #[serde(flatten)]
    pub container: ContainerOptions,
}

impl ServiceConfig {
    /// Config for a service that runs an existing image.
    pub fn image(image: impl Into<String>) -> Self {
        Self {
            container: ContainerOptions {
                image: Some(image.into()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Config for a service whose image is built from `context`.
    pub fn build(context: impl Into<PathBuf>) -> Self {
        Self {
            build: Some(context.into()),
            ..Default::default()
        }
    }
}

/// A service as declared in the project file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceDefinition {
    /// Names of services whose instances this service can reach.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<String>,

    #[serde(flatten)]
    pub config: ServiceConfig,
}
