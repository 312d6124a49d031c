// Scaling behaviour against the in-memory runtime.

use dockscale::config::{ContainerOptions, ServiceConfig};
use dockscale::runtime::{MemoryRuntime, Operation};
use dockscale::{Error, Service};
use std::sync::Arc;

fn create_test_service(runtime: &Arc<MemoryRuntime>, name: &str) -> Service {
    Service::new(name, runtime.clone(), &[], ServiceConfig::image("busybox"))
        .expect("valid service")
}

#[test]
fn test_invalid_name_is_rejected() {
    let runtime = Arc::new(MemoryRuntime::new());
    let err = Service::new("my-service!", runtime, &[], ServiceConfig::image("busybox"))
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[test]
fn test_image_and_build_are_exclusive() {
    let runtime = Arc::new(MemoryRuntime::new());
    let mut config = ServiceConfig::build("./web");
    config.container.image = Some("nginx".to_string());

    let err = Service::new("web", runtime, &[], config).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn test_scale_up_then_down() {
    let runtime = Arc::new(MemoryRuntime::new());
    let web = create_test_service(&runtime, "web");

    web.scale(2).await.unwrap();
    let mut names = web.get_names().await.unwrap();
    names.sort();
    assert_eq!(names, vec!["web_1", "web_2"]);

    web.scale(1).await.unwrap();
    assert_eq!(web.containers().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_scale_to_current_count_does_nothing() {
    let runtime = Arc::new(MemoryRuntime::new());
    let web = create_test_service(&runtime, "web");
    web.scale(2).await.unwrap();

    let creates = runtime.calls(Operation::Create);
    web.scale(2).await.unwrap();
    assert_eq!(runtime.calls(Operation::Create), creates);
    assert_eq!(runtime.calls(Operation::Kill), 0);
}

#[tokio::test]
async fn test_start_is_noop_when_any_instance_runs() {
    let runtime = Arc::new(MemoryRuntime::new());
    let web = create_test_service(&runtime, "web");

    let first = web.start().await.unwrap();
    assert!(first.is_some());
    assert_eq!(web.start().await.unwrap(), None);

    web.scale(3).await.unwrap();
    assert_eq!(web.start().await.unwrap(), None);
    assert_eq!(web.containers().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_stop_kills_everything() {
    let runtime = Arc::new(MemoryRuntime::new());
    let web = create_test_service(&runtime, "web");
    web.scale(3).await.unwrap();

    web.stop().await.unwrap();
    assert!(web.containers().await.unwrap().is_empty());
    assert_eq!(runtime.calls(Operation::Kill), 3);
}

#[tokio::test]
async fn test_scale_after_stop_reuses_numbers() {
    let runtime = Arc::new(MemoryRuntime::new());
    let web = create_test_service(&runtime, "web");

    web.scale(1).await.unwrap();
    web.stop().await.unwrap();
    web.scale(1).await.unwrap();

    assert_eq!(web.get_names().await.unwrap(), vec!["web_1"]);
    assert_eq!(runtime.containers().len(), 1);
}

#[tokio::test]
async fn test_failed_start_does_not_block_the_name() {
    let runtime = Arc::new(MemoryRuntime::new());
    let web = create_test_service(&runtime, "web");
    runtime.fail_after(Operation::Start, 0);

    let err = web.start_container(ContainerOptions::default()).await.unwrap_err();
    assert!(matches!(err, Error::Runtime(_)));
    assert!(runtime.containers().is_empty());

    runtime.fail_after(Operation::Start, usize::MAX / 2);
    web.scale(1).await.unwrap();
    assert_eq!(web.get_names().await.unwrap(), vec!["web_1"]);
}

#[tokio::test]
async fn test_scale_only_touches_own_containers() {
    let runtime = Arc::new(MemoryRuntime::new());
    let web = create_test_service(&runtime, "web");
    let db = create_test_service(&runtime, "db");
    db.scale(2).await.unwrap();

    web.scale(1).await.unwrap();
    web.stop().await.unwrap();

    assert_eq!(db.containers().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_numbering_continues_after_external_containers() {
    let runtime = Arc::new(MemoryRuntime::new());
    runtime.add_running("web_1");
    runtime.add_running("web_3");
    let web = create_test_service(&runtime, "web");

    assert_eq!(web.next_container_number().await.unwrap(), 4);
    web.scale(3).await.unwrap();

    let mut names = web.get_names().await.unwrap();
    names.sort();
    assert_eq!(names, vec!["web_1", "web_3", "web_4"]);
}

#[tokio::test]
async fn test_gaps_are_not_reused() {
    let runtime = Arc::new(MemoryRuntime::new());
    let web = create_test_service(&runtime, "web");
    web.scale(2).await.unwrap();

    // The first listed container is killed, leaving web_2.
    web.stop_container().await.unwrap();
    web.scale(2).await.unwrap();

    let mut names = web.get_names().await.unwrap();
    names.sort();
    assert_eq!(names, vec!["web_2", "web_3"]);
}

#[tokio::test]
async fn test_partial_failure_leaves_created_instances() {
    let runtime = Arc::new(MemoryRuntime::new());
    let web = create_test_service(&runtime, "web");
    runtime.fail_after(Operation::Create, 2);

    let err = web.scale(4).await.unwrap_err();
    assert!(matches!(err, Error::Runtime(_)));
    assert_eq!(web.containers().await.unwrap().len(), 2);

    // Once the runtime recovers, scaling again continues from what is there.
    runtime.fail_after(Operation::Create, usize::MAX / 2);
    web.scale(4).await.unwrap();
    assert_eq!(web.containers().await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_list_failure_propagates() {
    let runtime = Arc::new(MemoryRuntime::new());
    let web = create_test_service(&runtime, "web");
    runtime.fail_after(Operation::List, 0);

    assert!(matches!(web.scale(1).await, Err(Error::Runtime(_))));
    assert_eq!(runtime.calls(Operation::Create), 0);
}

#[tokio::test]
async fn test_built_service_builds_before_each_instance() {
    let runtime = Arc::new(MemoryRuntime::new());
    let web = Service::new("web", runtime.clone(), &[], ServiceConfig::build("/src/web")).unwrap();

    web.scale(3).await.unwrap();

    assert_eq!(runtime.calls(Operation::Build), 3);
    for container in runtime.containers() {
        let options = container.options.expect("created by the service");
        assert!(options.options.image.unwrap().starts_with("sha256:"));
    }
}

#[tokio::test]
async fn test_start_container_applies_overrides() {
    let runtime = Arc::new(MemoryRuntime::new());
    let mut config = ServiceConfig::image("busybox");
    config.container.user = Some("nobody".to_string());
    config.container.tty = Some(false);
    let web = Service::new("web", runtime.clone(), &[], config).unwrap();

    let id = web
        .start_container(ContainerOptions {
            tty: Some(true),
            ..Default::default()
        })
        .await
        .unwrap();

    let container = runtime
        .containers()
        .into_iter()
        .find(|c| c.id == id)
        .unwrap();
    let options = container.options.unwrap();
    assert_eq!(options.name, "web_1");
    assert_eq!(options.options.tty, Some(true));
    assert_eq!(options.options.user.as_deref(), Some("nobody"));
}

#[tokio::test]
async fn test_links_resolve_current_peer_instances() {
    let runtime = Arc::new(MemoryRuntime::new());
    let db = Arc::new(create_test_service(&runtime, "db"));
    let web = Service::new("web", runtime.clone(), &[db.clone()], ServiceConfig::image("nginx"))
        .unwrap();

    db.start().await.unwrap();
    let first = web.start_container(ContainerOptions::default()).await.unwrap();

    db.scale(2).await.unwrap();
    let second = web.start_container(ContainerOptions::default()).await.unwrap();

    let links_of = |id: &str| {
        runtime
            .containers()
            .into_iter()
            .find(|c| c.id == id)
            .unwrap()
            .links
    };

    let first_links = links_of(&first);
    assert_eq!(first_links.len(), 1);
    assert_eq!(first_links["db_1"], "db_1");

    let second_links = links_of(&second);
    assert_eq!(
        second_links.keys().cloned().collect::<Vec<_>>(),
        vec!["db_1", "db_2"]
    );
}

#[tokio::test]
async fn test_inspect_queries_each_instance() {
    let runtime = Arc::new(MemoryRuntime::new());
    let web = create_test_service(&runtime, "web");
    web.scale(2).await.unwrap();

    let records = web.inspect().await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(runtime.calls(Operation::Inspect), 2);
    for record in records {
        assert_eq!(record["Config"]["Image"], "busybox");
        assert_eq!(record["State"]["Running"], true);
    }
}
