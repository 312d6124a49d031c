//! In-process container runtime.
//!
//! `MemoryRuntime` behaves like a tiny engine: created containers get
//! sequential ids, names are stored with the engine's leading `/` and stay
//! taken until the container is killed. Individual operations can be told to
//! fail after a number of successful calls, which is how partial-failure
//! behaviour is exercised.

use super::{
    ContainerRuntime, ContainerSummary, CreateOptions, CreatedContainer, LinkMap, RuntimeError,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Runtime operations, used to target failure injection and call counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Create,
    Start,
    Kill,
    Build,
    Inspect,
}

impl Operation {
    fn command(self) -> &'static str {
        match self {
            Operation::List => "list",
            Operation::Create => "create",
            Operation::Start => "start",
            Operation::Kill => "kill",
            Operation::Build => "build",
            Operation::Inspect => "inspect",
        }
    }
}

/// A container as recorded by [`MemoryRuntime`].
#[derive(Debug, Clone)]
pub struct MemoryContainer {
    pub id: String,
    /// Engine-style name, including the leading `/`.
    pub name: String,
    pub options: Option<CreateOptions>,
    pub running: bool,
    /// Links passed on the most recent start.
    pub links: LinkMap,
}

#[derive(Debug, Default)]
struct State {
    containers: Vec<MemoryContainer>,
    next_id: u64,
    builds: Vec<PathBuf>,
    calls: HashMap<Operation, usize>,
    /// Operation -> number of calls allowed to succeed before failing.
    fail_after: HashMap<Operation, usize>,
}

impl State {
    fn record(&mut self, op: Operation) -> Result<(), RuntimeError> {
        let count = self.calls.entry(op).or_insert(0);
        *count += 1;
        match self.fail_after.get(&op) {
            Some(&allowed) if *count > allowed => Err(RuntimeError::CommandFailed {
                command: op.command().to_string(),
                stderr: "injected failure".to_string(),
                exit_code: Some(1),
            }),
            _ => Ok(()),
        }
    }

    fn allocate_id(&mut self) -> String {
        self.next_id += 1;
        format!("{:012x}", self.next_id)
    }

    /// Drop a container entirely, freeing its name.
    fn remove(&mut self, id: &str) -> Result<MemoryContainer, RuntimeError> {
        let index = self
            .containers
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| RuntimeError::ContainerNotFound {
                container: id.to_string(),
            })?;
        Ok(self.containers.remove(index))
    }

    fn find_mut(&mut self, id: &str) -> Result<&mut MemoryContainer, RuntimeError> {
        self.containers
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| RuntimeError::ContainerNotFound {
                container: id.to_string(),
            })
    }
}

/// Container runtime that keeps all state in memory.
#[derive(Debug, Default)]
pub struct MemoryRuntime {
    state: Mutex<State>,
}

impl MemoryRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an already running container created outside any service.
    ///
    /// `name` is given without the leading `/`. Returns the new id.
    pub fn add_running(&self, name: &str) -> String {
        let mut state = self.state.lock();
        let id = state.allocate_id();
        state.containers.push(MemoryContainer {
            id: id.clone(),
            name: format!("/{}", name),
            options: None,
            running: true,
            links: LinkMap::new(),
        });
        id
    }

    /// Make `op` fail once it has succeeded `successes` more times.
    pub fn fail_after(&self, op: Operation, successes: usize) {
        let mut state = self.state.lock();
        let already = state.calls.get(&op).copied().unwrap_or(0);
        state.fail_after.insert(op, already + successes);
    }

    /// Snapshot of every container that still exists, running or only created.
    pub fn containers(&self) -> Vec<MemoryContainer> {
        self.state.lock().containers.clone()
    }

    /// Names (without `/`) of running containers, in listing order.
    pub fn running_names(&self) -> Vec<String> {
        self.state
            .lock()
            .containers
            .iter()
            .filter(|c| c.running)
            .map(|c| c.name.trim_start_matches('/').to_string())
            .collect()
    }

    /// Build contexts passed to [`ContainerRuntime::build`], in call order.
    pub fn builds(&self) -> Vec<PathBuf> {
        self.state.lock().builds.clone()
    }

    /// Number of times `op` has been invoked, failed calls included.
    pub fn calls(&self, op: Operation) -> usize {
        self.state.lock().calls.get(&op).copied().unwrap_or(0)
    }
}

#[async_trait]
impl ContainerRuntime for MemoryRuntime {
    async fn list_containers(&self) -> Result<Vec<ContainerSummary>, RuntimeError> {
        let mut state = self.state.lock();
        state.record(Operation::List)?;
        Ok(state
            .containers
            .iter()
            .filter(|c| c.running)
            .map(|c| ContainerSummary {
                id: c.id.clone(),
                names: vec![c.name.clone()],
            })
            .collect())
    }

    async fn create_container(
        &self,
        options: &CreateOptions,
    ) -> Result<CreatedContainer, RuntimeError> {
        let mut state = self.state.lock();
        state.record(Operation::Create)?;
        if options.options.image.is_none() {
            return Err(RuntimeError::MissingImage {
                container: options.name.clone(),
            });
        }
        let name = format!("/{}", options.name);
        if state.containers.iter().any(|c| c.name == name) {
            return Err(RuntimeError::NameConflict {
                name: options.name.clone(),
            });
        }
        let id = state.allocate_id();
        state.containers.push(MemoryContainer {
            id: id.clone(),
            name,
            options: Some(options.clone()),
            running: false,
            links: LinkMap::new(),
        });
        Ok(CreatedContainer { id })
    }

    async fn start_container(&self, id: &str, links: &LinkMap) -> Result<(), RuntimeError> {
        let mut state = self.state.lock();
        if let Err(err) = state.record(Operation::Start) {
            // A container that never started does not keep its name.
            let _ = state.remove(id);
            return Err(err);
        }
        let container = state.find_mut(id)?;
        container.running = true;
        container.links = links.clone();
        Ok(())
    }

    async fn kill_container(&self, id: &str) -> Result<(), RuntimeError> {
        let mut state = self.state.lock();
        state.record(Operation::Kill)?;
        state.remove(id)?;
        Ok(())
    }

    async fn build(&self, context: &Path) -> Result<Vec<String>, RuntimeError> {
        let mut state = self.state.lock();
        state.record(Operation::Build)?;
        state.builds.push(context.to_path_buf());
        Ok(vec![format!("sha256:{:064x}", state.builds.len())])
    }

    async fn inspect_container(&self, id: &str) -> Result<serde_json::Value, RuntimeError> {
        let mut state = self.state.lock();
        state.record(Operation::Inspect)?;
        let container = state.find_mut(id)?;
        let image = container
            .options
            .as_ref()
            .and_then(|o| o.options.image.clone());
        Ok(serde_json::json!({
            "Id": container.id,
            "Name": container.name,
            "State": { "Running": container.running },
            "Config": { "Image": image },
        }))
    }
}
