use dynamic_datasource::{
    ClearPolicy, ComponentInterceptor, ContextHolder, DatabaseKey, Interceptors, Operation,
    OperationInterceptor, RoutedComponent, SelectorDeclaration, MASTER, SLAVE1,
};
use std::panic::AssertUnwindSafe;

struct Plain;
impl RoutedComponent for Plain {}

struct OnReplica;
impl RoutedComponent for OnReplica {
    fn component_selector(&self) -> Option<SelectorDeclaration> {
        Some(SelectorDeclaration::component(SLAVE1))
    }
}

/// Declared only on the contract it is reached through.
struct ContractOnly;
impl RoutedComponent for ContractOnly {
    fn contract_selector(&self) -> Option<SelectorDeclaration> {
        Some(SelectorDeclaration::component(SLAVE1))
    }
}

const READ_SLAVE: Operation = Operation::declared("read_slave", SLAVE1);
const READ_DEFAULT: Operation = Operation::declared_default("read_default");
const UNDECLARED: Operation = Operation::undeclared("undeclared");

async fn nested_access() -> DatabaseKey {
    tokio::task::yield_now().await;
    ContextHolder::get()
}

#[tokio::test]
async fn declared_key_reaches_nested_calls_and_is_cleared() {
    let seen = Interceptors::default()
        .invoke(&Plain, &READ_SLAVE, async {
            let first = nested_access().await;
            let second = nested_access().await;
            (first, second)
        })
        .await;
    assert_eq!(seen, (SLAVE1, SLAVE1));
    assert_eq!(ContextHolder::current(), None);
}

#[tokio::test]
async fn errors_propagate_unchanged_and_context_is_cleared() {
    let result: Result<(), String> = Interceptors::default()
        .invoke(&Plain, &READ_SLAVE, async {
            assert_eq!(ContextHolder::get(), SLAVE1);
            Err("insert failed".to_string())
        })
        .await;
    assert_eq!(result, Err("insert failed".to_string()));
    assert_eq!(ContextHolder::current(), None);
}

#[tokio::test]
async fn panicking_operation_still_clears() {
    let joined = tokio::spawn(async {
        let operation = READ_SLAVE;
        Interceptors::default()
            .invoke(&Plain, &operation, async {
                panic!("operation failed");
            })
            .await
    })
    .await;
    assert!(joined.unwrap_err().is_panic());
    assert_eq!(ContextHolder::current(), None);

    let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
        Interceptors::default().invoke_sync(&Plain, &READ_SLAVE, || panic!("operation failed"))
    }));
    assert!(result.is_err());
    assert_eq!(ContextHolder::current(), None);
}

#[tokio::test]
async fn component_declaration_wins_over_operation_declaration() {
    assert_eq!(OperationInterceptor::resolve(&OnReplica, &READ_DEFAULT), Some(SLAVE1));
    let seen = Interceptors::default()
        .invoke(&OnReplica, &READ_DEFAULT, nested_access())
        .await;
    assert_eq!(seen, SLAVE1);
}

#[tokio::test]
async fn undeclared_calls_are_not_intercepted() {
    let outer = DatabaseKey::new("outer");
    let seen = ContextHolder::scope(
        outer.clone(),
        Interceptors::default().invoke(&Plain, &UNDECLARED, nested_access()),
    )
    .await;
    assert_eq!(seen, outer);
    assert!(!OperationInterceptor::applies_to(&UNDECLARED));
    assert!(!ComponentInterceptor::applies_to(&Plain));
}

#[tokio::test]
async fn nested_declared_operation_restores_the_outer_key() {
    let interceptors = Interceptors::default();
    let (inner, after) = interceptors
        .invoke(&Plain, &READ_SLAVE, async {
            let inner = interceptors
                .invoke(&Plain, &READ_DEFAULT, nested_access())
                .await;
            (inner, ContextHolder::get())
        })
        .await;
    assert_eq!(inner, MASTER);
    assert_eq!(after, SLAVE1);
}

#[tokio::test]
async fn component_interceptor_routes_every_operation_of_a_declared_component() {
    let seen = Interceptors::default()
        .invoke(&OnReplica, &UNDECLARED, nested_access())
        .await;
    assert_eq!(seen, SLAVE1);
    assert_eq!(ContextHolder::current(), None);
}

#[tokio::test]
async fn contract_only_declaration_fires_but_sets_nothing() {
    assert!(ComponentInterceptor::applies_to(&ContractOnly));
    let seen = Interceptors::default()
        .invoke(&ContractOnly, &UNDECLARED, async { ContextHolder::current() })
        .await;
    assert_eq!(seen, None);
}

#[tokio::test]
async fn leave_set_policy_leaks_into_the_enclosing_scope() {
    let after = ContextHolder::scope(MASTER, async {
        Interceptors::new(ClearPolicy::LeaveSet)
            .invoke(&OnReplica, &UNDECLARED, async {})
            .await;
        ContextHolder::get()
    })
    .await;
    assert_eq!(after, SLAVE1);

    let after = ContextHolder::scope(MASTER, async {
        Interceptors::new(ClearPolicy::Scoped)
            .invoke(&OnReplica, &UNDECLARED, async {})
            .await;
        ContextHolder::get()
    })
    .await;
    assert_eq!(after, MASTER);
}

#[tokio::test]
async fn leave_set_policy_never_leaks_into_other_tasks() {
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let (set_tx, set_rx) = tokio::sync::oneshot::channel::<()>();
    let writer = tokio::spawn(async move {
        Interceptors::new(ClearPolicy::LeaveSet)
            .invoke(&OnReplica, &UNDECLARED, async move {
                set_tx.send(()).unwrap();
                rx.await.unwrap();
            })
            .await;
        let after = ContextHolder::get();
        ContextHolder::clear();
        after
    });

    set_rx.await.unwrap();
    let other = tokio::spawn(async { ContextHolder::get() }).await.unwrap();
    assert_eq!(other, MASTER);

    tx.send(()).unwrap();
    // The leak stays within the task that ran the operation.
    assert_eq!(writer.await.unwrap(), SLAVE1);
}

#[test]
fn leave_set_policy_leaks_into_the_next_call_on_the_same_thread() {
    std::thread::spawn(|| {
        let interceptors = Interceptors::new(ClearPolicy::LeaveSet);
        interceptors.invoke_sync(&OnReplica, &UNDECLARED, || ());
        let next = interceptors.invoke_sync(&Plain, &UNDECLARED, ContextHolder::get);
        assert_eq!(next, SLAVE1);
        ContextHolder::clear();
    })
    .join()
    .unwrap();
}

#[test]
fn clear_policy_parses() {
    assert_eq!("scoped".parse::<ClearPolicy>().unwrap(), ClearPolicy::Scoped);
    assert_eq!(" Leave_Set ".parse::<ClearPolicy>().unwrap(), ClearPolicy::LeaveSet);
    assert!("sometimes".parse::<ClearPolicy>().is_err());
    assert_eq!(ClearPolicy::default(), ClearPolicy::Scoped);
}
