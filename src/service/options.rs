use super::naming::container_name;
use super::Service;
use crate::config::ContainerOptions;
use crate::error::Result;
use crate::runtime::{CreateOptions, RuntimeError};
use tracing::info;

impl Service {
    /// Materialize the creation request for the next instance.
    ///
    /// The service's recognized options are copied and `overrides` applied on
    /// top. The container name is always derived from the next instance
    /// number. When the service builds its image, the build runs now and its
    /// image id replaces any `image` value.
    pub async fn container_options(&self, overrides: ContainerOptions) -> Result<CreateOptions> {
        let mut options = self.config().container.clone().overlay(overrides);

        let number = self.next_container_number().await?;
        let name = container_name(self.name(), number);

        if let Some(context) = &self.config().build {
            info!("Building {} from {}...", self.name(), context.display());
            let built = self.runtime().build(context).await?;
            let image = built.into_iter().next().ok_or_else(|| {
                RuntimeError::invalid_response(
                    format!("build {}", context.display()),
                    "no image id returned",
                )
            })?;
            options.image = Some(image);
        }

        Ok(CreateOptions { name, options })
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{CommandSpec, ContainerOptions, ServiceConfig};
    use crate::runtime::{MemoryRuntime, Operation};
    use crate::service::Service;
    use std::collections::BTreeMap;
    use std::path::PathBuf;
    use std::sync::Arc;

    #[tokio::test]
    async fn copies_config_and_names_next_instance() {
        let runtime = Arc::new(MemoryRuntime::new());
        runtime.add_running("web_2");

        let mut config = ServiceConfig::image("nginx");
        config.container.command = Some(CommandSpec::Line("nginx -g daemon".into()));
        config.container.environment = Some(BTreeMap::from([("A".into(), "1".into())]));
        let service = Service::new("web", runtime, &[], config).unwrap();

        let options = service
            .container_options(ContainerOptions::default())
            .await
            .unwrap();
        assert_eq!(options.name, "web_3");
        assert_eq!(options.options.image.as_deref(), Some("nginx"));
        assert_eq!(
            options.options.command,
            Some(CommandSpec::Line("nginx -g daemon".into()))
        );
        assert_eq!(options.options.environment.unwrap()["A"], "1");
    }

    #[tokio::test]
    async fn overrides_win_over_config() {
        let runtime = Arc::new(MemoryRuntime::new());
        let mut config = ServiceConfig::image("nginx");
        config.container.hostname = Some("from-config".into());
        config.container.user = Some("www".into());
        let service = Service::new("web", runtime, &[], config).unwrap();

        let options = service
            .container_options(ContainerOptions {
                hostname: Some("from-override".into()),
                image: Some("nginx:alpine".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(options.options.hostname.as_deref(), Some("from-override"));
        assert_eq!(options.options.image.as_deref(), Some("nginx:alpine"));
        assert_eq!(options.options.user.as_deref(), Some("www"));
        assert_eq!(options.name, "web_1");
    }

    #[tokio::test]
    async fn build_replaces_image_on_every_call() {
        let runtime = Arc::new(MemoryRuntime::new());
        let service =
            Service::new("web", runtime.clone(), &[], ServiceConfig::build("/src/web")).unwrap();

        let first = service
            .container_options(ContainerOptions {
                image: Some("ignored".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        let second = service
            .container_options(ContainerOptions::default())
            .await
            .unwrap();

        assert_eq!(runtime.calls(Operation::Build), 2);
        assert_eq!(runtime.builds(), vec![PathBuf::from("/src/web"); 2]);
        assert!(first.options.image.unwrap().starts_with("sha256:"));
        assert_ne!(second.options.image, Some("ignored".into()));
    }

    #[tokio::test]
    async fn build_failure_propagates() {
        let runtime = Arc::new(MemoryRuntime::new());
        runtime.fail_after(Operation::Build, 0);
        let service = Service::new("web", runtime, &[], ServiceConfig::build(".")).unwrap();

        let err = service
            .container_options(ContainerOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, crate::Error::Runtime(_)));
    }
}
