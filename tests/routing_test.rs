mod common;

use dynamic_datasource::{
    ContextHolder, DataSourceRegistry, DatabaseKey, Interceptors, Operation, RoutedComponent,
    RoutingDataSource, MASTER, SLAVE1,
};

#[test]
fn no_selector_routes_to_default() {
    let router = common::label_router();
    assert_eq!(*router.resolve(), "master-pool");
    assert_eq!(router.resolve_key(), &MASTER);
    assert_eq!(router.determine_current_lookup_key(), None);
}

#[tokio::test]
async fn registered_key_routes_to_its_handle() {
    let router = common::label_router();
    let seen = ContextHolder::scope(SLAVE1, async { *router.resolve() }).await;
    assert_eq!(seen, "slave1-pool");
    assert_eq!(*router.resolve(), "master-pool");
}

#[tokio::test]
async fn unregistered_key_falls_back_to_default() {
    let router = common::label_router();
    let (handle, key) = ContextHolder::scope(DatabaseKey::new("slave9"), async {
        (*router.resolve(), router.resolve_key().clone())
    })
    .await;
    assert_eq!(handle, "master-pool");
    assert_eq!(key, MASTER);
}

#[test]
fn unset_context_uses_the_designated_default_even_when_master_is_registered() {
    let primary = DatabaseKey::new("primary");
    let router = RoutingDataSource::new(
        DataSourceRegistry::new(primary.clone(), "primary-pool").with(MASTER, "master-pool"),
    );
    std::thread::spawn(move || {
        assert_eq!(*router.resolve(), "primary-pool");
        assert_eq!(router.resolve_key(), &primary);
        ContextHolder::set(MASTER);
        assert_eq!(*router.resolve(), "master-pool");
        ContextHolder::clear();
    })
    .join()
    .unwrap();
}

#[tokio::test]
async fn every_access_is_resolved_fresh() {
    struct Reports;
    impl RoutedComponent for Reports {}
    const SUMMARY: Operation = Operation::declared("summary", SLAVE1);
    const AUDIT: Operation = Operation::declared_default("audit");

    let router = common::label_router();
    let interceptors = Interceptors::default();
    let accesses = interceptors
        .invoke(&Reports, &SUMMARY, async {
            let mut seen = vec![*router.resolve()];
            seen.push(
                interceptors
                    .invoke(&Reports, &AUDIT, async { *router.resolve() })
                    .await,
            );
            seen.push(*router.resolve());
            seen
        })
        .await;
    assert_eq!(accesses, vec!["slave1-pool", "master-pool", "slave1-pool"]);
    assert_eq!(*router.resolve(), "master-pool");
}

#[test]
fn registry_keeps_default_and_replaces_entries() {
    assert_eq!(DataSourceRegistry::new(MASTER, 0).len(), 1);

    let mut registry = DataSourceRegistry::new(MASTER, 1).with(SLAVE1, 2);
    assert_eq!(registry.len(), 2);
    assert!(registry.contains("slave1"));
    assert_eq!(registry.register(SLAVE1, 3), Some(2));
    assert_eq!(registry.get("slave1"), Some(&3));
    assert_eq!(registry.default_key(), &MASTER);
    assert_eq!(*registry.default_handle(), 1);
    assert_eq!(registry.get("slave2"), None);
}

#[tokio::test]
async fn unscoped_set_in_one_task_does_not_route_another() {
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let (set_tx, set_rx) = tokio::sync::oneshot::channel::<()>();
    let writer = tokio::spawn(async move {
        ContextHolder::set(SLAVE1);
        set_tx.send(()).unwrap();
        rx.await.unwrap();
        let seen = *common::label_router().resolve();
        ContextHolder::clear();
        seen
    });

    set_rx.await.unwrap();
    let other = tokio::spawn(async { *common::label_router().resolve() })
        .await
        .unwrap();
    assert_eq!(other, "master-pool");

    tx.send(()).unwrap();
    assert_eq!(writer.await.unwrap(), "slave1-pool");
}
