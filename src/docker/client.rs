//! Centralized Docker CLI client.
//!
//! All Docker CLI interactions go through `DockerClient`, which provides
//! consistent timeout handling, error mapping to [`RuntimeError`], and a single
//! point where `Command::new("docker")` is constructed.

use crate::runtime::{
    ContainerRuntime, ContainerSummary, CreateOptions, CreatedContainer, LinkMap, RuntimeError,
};
use async_trait::async_trait;
use std::path::Path;
use std::process::Output;
use std::time::Duration;

// Docker operation timeouts
const DOCKER_QUERY_TIMEOUT: Duration = Duration::from_secs(10); // ps / inspect
const DOCKER_CREATE_TIMEOUT: Duration = Duration::from_secs(60); // Create container
const DOCKER_START_TIMEOUT: Duration = Duration::from_secs(30); // Start container
const DOCKER_KILL_TIMEOUT: Duration = Duration::from_secs(10); // Kill / remove container
const DOCKER_BUILD_TIMEOUT: Duration = Duration::from_secs(1800); // Build image (30 minutes)

/// Container runtime backed by the `docker` CLI.
///
/// Links need a user-defined network: when one is configured, started
/// containers are connected to it with `--link` entries for every peer.
#[derive(Debug, Clone, Default)]
pub struct DockerClient {
    network: Option<String>,
}

impl DockerClient {
    pub fn new() -> Self {
        DockerClient { network: None }
    }

    /// Client that connects started containers to `network`.
    pub fn with_network(network: impl Into<String>) -> Self {
        DockerClient {
            network: Some(network.into()),
        }
    }

    pub fn network(&self) -> Option<&str> {
        self.network.as_deref()
    }

    // ========================================================================
    // Internal helpers
    // ========================================================================

    /// Run a docker command with a timeout, returning raw Output.
    async fn run(&self, args: &[&str], timeout: Duration) -> Result<Output, RuntimeError> {
        let result = tokio::time::timeout(
            timeout,
            tokio::process::Command::new("docker").args(args).output(),
        )
        .await;

        let cmd_str = format!("docker {}", args.join(" "));

        match result {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(source)) => Err(RuntimeError::ExecFailed {
                command: cmd_str,
                source,
            }),
            Err(_) => Err(RuntimeError::Timeout {
                command: cmd_str,
                timeout,
            }),
        }
    }

    /// Run a docker command with a timeout, returning Output only if exit 0.
    async fn run_success(&self, args: &[&str], timeout: Duration) -> Result<Output, RuntimeError> {
        let output = self.run(args, timeout).await?;
        if output.status.success() {
            Ok(output)
        } else {
            let cmd_str = format!("docker {}", args.join(" "));
            Err(RuntimeError::from_output(cmd_str, &output))
        }
    }

    /// Force-remove a container, treating an already-gone container as done.
    async fn remove_container(&self, id: &str) -> Result<(), RuntimeError> {
        let output = self.run(&["rm", "-f", id], DOCKER_KILL_TIMEOUT).await?;
        if output.status.success() || stderr_of(&output).contains("No such container") {
            return Ok(());
        }
        Err(RuntimeError::from_output("docker rm -f", &output))
    }

    async fn connect_and_start(&self, id: &str, links: &LinkMap) -> Result<(), RuntimeError> {
        // Every container joins the network, linked or not, so that later
        // containers can link to it.
        match self.network.as_deref() {
            Some(network) => {
                let args = connect_args(network, id, links);
                let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
                self.run_success(&arg_refs, DOCKER_START_TIMEOUT).await?;
            }
            None if !links.is_empty() => tracing::warn!(
                "Container {} has {} link(s) but no network is configured; links skipped",
                id,
                links.len()
            ),
            None => {}
        }

        let output = self.run(&["start", id], DOCKER_START_TIMEOUT).await?;
        if output.status.success() {
            return Ok(());
        }
        Err(classify_failure(
            "docker start",
            id,
            &stderr_of(&output),
            output.status.code(),
        ))
    }

    // ========================================================================
    // Daemon and network
    // ========================================================================

    /// Check if the Docker daemon is healthy.
    pub async fn daemon_healthy(&self, timeout: Duration) -> bool {
        match self
            .run(&["info", "--format", "{{.ServerVersion}}"], timeout)
            .await
        {
            Ok(o) => o.status.success(),
            Err(_) => false,
        }
    }

    /// Create the configured network unless it already exists.
    pub async fn ensure_network(&self) -> Result<(), RuntimeError> {
        let Some(network) = self.network.as_deref() else {
            return Ok(());
        };

        let exists = self
            .run(&["network", "inspect", network], DOCKER_QUERY_TIMEOUT)
            .await?;
        if exists.status.success() {
            return Ok(());
        }

        tracing::info!("Creating network {}", network);
        self.run_success(&["network", "create", network], DOCKER_QUERY_TIMEOUT)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ContainerRuntime for DockerClient {
    async fn list_containers(&self) -> Result<Vec<ContainerSummary>, RuntimeError> {
        let output = self
            .run_success(&["ps", "-q", "--no-trunc"], DOCKER_QUERY_TIMEOUT)
            .await?;
        let ids: Vec<String> = stdout_lines(&output);
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        // `docker inspect` reports names the way the engine API does, with
        // the leading `/`.
        let mut args = vec!["inspect", "--format", "{{.Id}}\t{{.Name}}"];
        args.extend(ids.iter().map(String::as_str));
        let output = self.run(&args, DOCKER_QUERY_TIMEOUT).await?;
        // A container can exit between `ps` and `inspect`; inspect still
        // prints the others but exits non-zero.
        if !output.status.success() && output.stdout.is_empty() {
            return Err(RuntimeError::from_output("docker inspect", &output));
        }

        parse_inspect_lines(&stdout_lines(&output))
    }

    async fn create_container(
        &self,
        options: &CreateOptions,
    ) -> Result<CreatedContainer, RuntimeError> {
        let args = create_args(options)?;
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = self.run(&arg_refs, DOCKER_CREATE_TIMEOUT).await?;
        if !output.status.success() {
            return Err(classify_failure(
                "docker create",
                &options.name,
                &stderr_of(&output),
                output.status.code(),
            ));
        }

        let id = stdout_lines(&output)
            .pop()
            .ok_or_else(|| RuntimeError::invalid_response("docker create", "no container id"))?;
        Ok(CreatedContainer { id })
    }

    async fn start_container(&self, id: &str, links: &LinkMap) -> Result<(), RuntimeError> {
        let result = self.connect_and_start(id, links).await;
        if let Err(err) = &result {
            // A created-but-never-started container would hold its name and
            // block the next instance with the same number.
            tracing::warn!("Start of {} failed ({}); removing it", id, err);
            if let Err(cleanup) = self.remove_container(id).await {
                tracing::warn!("Could not remove {}: {}", id, cleanup);
            }
        }
        result
    }

    /// Kill a container (SIGKILL) and remove it, releasing its name.
    async fn kill_container(&self, id: &str) -> Result<(), RuntimeError> {
        let output = self.run(&["kill", id], DOCKER_KILL_TIMEOUT).await?;
        if !output.status.success() {
            let stderr = stderr_of(&output);
            // Container exited on its own in the meantime, not an error
            if !stderr.contains("is not running") {
                return Err(classify_failure("docker kill", id, &stderr, output.status.code()));
            }
        }
        self.remove_container(id).await
    }

    async fn build(&self, context: &Path) -> Result<Vec<String>, RuntimeError> {
        let context = context.to_string_lossy().into_owned();
        let output = self
            .run_success(&["build", "-q", context.as_str()], DOCKER_BUILD_TIMEOUT)
            .await?;
        let lines = stdout_lines(&output);
        if lines.is_empty() {
            return Err(RuntimeError::invalid_response(
                format!("docker build -q {}", context),
                "no image id printed",
            ));
        }
        Ok(lines)
    }

    async fn inspect_container(&self, id: &str) -> Result<serde_json::Value, RuntimeError> {
        let output = self.run(&["inspect", id], DOCKER_QUERY_TIMEOUT).await?;
        if !output.status.success() {
            return Err(classify_failure(
                "docker inspect",
                id,
                &stderr_of(&output),
                output.status.code(),
            ));
        }

        let json_str = String::from_utf8_lossy(&output.stdout);
        let records: Vec<serde_json::Value> = serde_json::from_str(&json_str)
            .map_err(|e| RuntimeError::invalid_response("docker inspect", e.to_string()))?;
        records
            .into_iter()
            .next()
            .ok_or_else(|| RuntimeError::invalid_response("docker inspect", "empty result"))
    }
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

/// Map a failed command's stderr onto the error the engine meant.
/// `target` is the container id or name the command acted on.
fn classify_failure(
    command: &str,
    target: &str,
    stderr: &str,
    exit_code: Option<i32>,
) -> RuntimeError {
    if stderr.contains("No such container") || stderr.contains("No such object") {
        RuntimeError::ContainerNotFound {
            container: target.to_string(),
        }
    } else if stderr.contains("is already in use") {
        RuntimeError::NameConflict {
            name: target.to_string(),
        }
    } else {
        RuntimeError::CommandFailed {
            command: command.to_string(),
            stderr: stderr.to_string(),
            exit_code,
        }
    }
}

fn stdout_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parse `{{.Id}}\t{{.Name}}` lines into container summaries.
fn parse_inspect_lines(lines: &[String]) -> Result<Vec<ContainerSummary>, RuntimeError> {
    lines
        .iter()
        .map(|line| {
            let (id, name) = line.split_once('\t').ok_or_else(|| {
                RuntimeError::invalid_response("docker inspect", format!("malformed line '{}'", line))
            })?;
            Ok(ContainerSummary {
                id: id.to_string(),
                names: vec![name.to_string()],
            })
        })
        .collect()
}

/// Translate a creation request into `docker create` arguments.
fn create_args(options: &CreateOptions) -> Result<Vec<String>, RuntimeError> {
    let opts = &options.options;
    let image = opts.image.as_ref().ok_or_else(|| RuntimeError::MissingImage {
        container: options.name.clone(),
    })?;

    let mut args = vec![
        "create".to_string(),
        "--name".to_string(),
        options.name.clone(),
    ];

    if let Some(hostname) = &opts.hostname {
        args.extend(["--hostname".to_string(), hostname.clone()]);
    }
    if let Some(user) = &opts.user {
        args.extend(["--user".to_string(), user.clone()]);
    }
    // `docker create` always detaches; `detach` has no CLI counterpart.
    if opts.stdin_open == Some(true) {
        args.push("--interactive".to_string());
    }
    if opts.tty == Some(true) {
        args.push("--tty".to_string());
    }
    if let Some(mem_limit) = &opts.mem_limit {
        args.extend(["--memory".to_string(), mem_limit.clone()]);
    }
    for port in opts.ports.iter().flatten() {
        args.extend(["--publish".to_string(), port.clone()]);
    }
    for (key, value) in opts.environment.iter().flatten() {
        args.extend(["--env".to_string(), format!("{}={}", key, value)]);
    }
    for dns in opts.dns.iter().flatten() {
        args.extend(["--dns".to_string(), dns.clone()]);
    }
    for volume in opts.volumes.iter().flatten() {
        args.extend(["--volume".to_string(), volume.clone()]);
    }
    for from in opts.volumes_from.iter().flatten() {
        args.extend(["--volumes-from".to_string(), from.clone()]);
    }

    args.push(image.clone());
    if let Some(command) = &opts.command {
        args.extend(command.args());
    }

    Ok(args)
}

/// `docker network connect` arguments linking `id` to every peer.
fn connect_args(network: &str, id: &str, links: &LinkMap) -> Vec<String> {
    let mut args = vec!["network".to_string(), "connect".to_string()];
    for (name, alias) in links {
        args.extend(["--link".to_string(), format!("{}:{}", name, alias)]);
    }
    args.push(network.to_string());
    args.push(id.to_string());
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CommandSpec, ContainerOptions};
    use std::collections::BTreeMap;

    #[test]
    fn create_args_cover_recognized_options() {
        let options = CreateOptions {
            name: "web_2".to_string(),
            options: ContainerOptions {
                image: Some("nginx:alpine".to_string()),
                command: Some(CommandSpec::Line("nginx -g daemon".to_string())),
                hostname: Some("web".to_string()),
                user: Some("www".to_string()),
                detach: Some(true),
                stdin_open: Some(true),
                tty: Some(false),
                mem_limit: Some("256m".to_string()),
                ports: Some(vec!["8080:80".to_string()]),
                environment: Some(BTreeMap::from([
                    ("B".to_string(), "2".to_string()),
                    ("A".to_string(), "1".to_string()),
                ])),
                dns: Some(vec!["8.8.8.8".to_string()]),
                volumes: Some(vec!["data:/data".to_string()]),
                volumes_from: Some(vec!["db_1".to_string()]),
            },
        };

        let args = create_args(&options).unwrap();
        assert_eq!(
            args,
            vec![
                "create", "--name", "web_2", "--hostname", "web", "--user", "www",
                "--interactive", "--memory", "256m", "--publish", "8080:80", "--env", "A=1",
                "--env", "B=2", "--dns", "8.8.8.8", "--volume", "data:/data", "--volumes-from",
                "db_1", "nginx:alpine", "nginx", "-g", "daemon",
            ]
        );
    }

    #[test]
    fn create_args_require_image() {
        let options = CreateOptions {
            name: "web_1".to_string(),
            options: ContainerOptions::default(),
        };
        assert!(matches!(
            create_args(&options),
            Err(RuntimeError::MissingImage { container }) if container == "web_1"
        ));
    }

    #[test]
    fn inspect_lines_keep_engine_prefix() {
        let lines = vec!["abc123\t/web_1".to_string(), "def456\t/db_1".to_string()];
        let containers = parse_inspect_lines(&lines).unwrap();
        assert_eq!(containers[0].id, "abc123");
        assert_eq!(containers[0].names, vec!["/web_1"]);
        assert_eq!(containers[1].names, vec!["/db_1"]);
    }

    #[test]
    fn malformed_inspect_line_is_invalid_response() {
        let lines = vec!["abc123".to_string()];
        assert!(matches!(
            parse_inspect_lines(&lines),
            Err(RuntimeError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn name_in_use_on_create_is_a_name_conflict() {
        let stderr = "Error response from daemon: Conflict. The container name \"/web_1\" \
                      is already in use by container \"3f2a\". You have to remove (or rename) \
                      that container to be able to reuse that name.";
        assert!(matches!(
            classify_failure("docker create", "web_1", stderr, Some(125)),
            RuntimeError::NameConflict { name } if name == "web_1"
        ));
    }

    #[test]
    fn missing_container_is_not_found() {
        let err = classify_failure(
            "docker kill",
            "abc",
            "Error response from daemon: No such container: abc",
            Some(1),
        );
        assert!(matches!(err, RuntimeError::ContainerNotFound { container } if container == "abc"));

        let err = classify_failure("docker start", "abc", "permission denied", Some(1));
        assert!(matches!(err, RuntimeError::CommandFailed { exit_code: Some(1), .. }));
    }

    #[test]
    fn connect_args_list_every_link() {
        let links = LinkMap::from([
            ("db_1".to_string(), "db_1".to_string()),
            ("db_2".to_string(), "db_2".to_string()),
        ]);
        assert_eq!(
            connect_args("shop", "abc", &links),
            vec![
                "network", "connect", "--link", "db_1:db_1", "--link", "db_2:db_2", "shop",
                "abc"
            ]
        );
    }
}
