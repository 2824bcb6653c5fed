//! Interceptors that install the declared database key around an operation.
//!
//! [`OperationInterceptor`] fires for operations that carry their own declaration and always
//! pairs set with clear. [`ComponentInterceptor`] fires for every operation of a declared
//! component; whether it clears afterwards is governed by [`ClearPolicy`]. [`Interceptors`]
//! picks at most one of the two per invocation.

use crate::context::ContextHolder;
use crate::declaration::{Declarations, Operation, SelectorDeclaration};
use crate::error::ConfigError;
use crate::key::DatabaseKey;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// A component whose operations can be routed.
pub trait RoutedComponent {
    /// Declaration on the concrete component type.
    fn component_selector(&self) -> Option<SelectorDeclaration> {
        None
    }

    /// Declaration on an abstract contract the component is reached through. It makes the
    /// component interceptor fire, but the key is only ever read from
    /// [`RoutedComponent::component_selector`].
    fn contract_selector(&self) -> Option<SelectorDeclaration> {
        None
    }
}

impl<T: RoutedComponent + ?Sized> RoutedComponent for &T {
    fn component_selector(&self) -> Option<SelectorDeclaration> {
        (**self).component_selector()
    }

    fn contract_selector(&self) -> Option<SelectorDeclaration> {
        (**self).contract_selector()
    }
}

impl<T: RoutedComponent + ?Sized> RoutedComponent for std::sync::Arc<T> {
    fn component_selector(&self) -> Option<SelectorDeclaration> {
        (**self).component_selector()
    }

    fn contract_selector(&self) -> Option<SelectorDeclaration> {
        (**self).contract_selector()
    }
}

pub struct OperationInterceptor;

impl OperationInterceptor {
    /// Only operations with their own declaration are intercepted.
    pub fn applies_to(operation: &Operation) -> bool {
        operation.declaration().is_some()
    }

    pub fn resolve<C>(target: &C, operation: &Operation) -> Option<DatabaseKey>
    where
        C: RoutedComponent + ?Sized,
    {
        Declarations::new(target.component_selector(), operation.declaration().cloned())
            .resolve()
            .map(|d| d.key().clone())
    }

    /// Run `fut` with the resolved key installed. The key is removed when `fut` finishes,
    /// fails, panics or is dropped; its output is returned unchanged.
    pub async fn around<C, F>(target: &C, operation: &Operation, fut: F) -> F::Output
    where
        C: RoutedComponent + ?Sized,
        F: Future,
    {
        if !Self::applies_to(operation) {
            return fut.await;
        }
        match Self::resolve(target, operation) {
            Some(key) => {
                tracing::info!(datasource = %key, operation = operation.name(), "current data source");
                ContextHolder::scope(key, fut).await
            }
            None => fut.await,
        }
    }

    pub fn around_sync<C, F, R>(target: &C, operation: &Operation, f: F) -> R
    where
        C: RoutedComponent + ?Sized,
        F: FnOnce() -> R,
    {
        if !Self::applies_to(operation) {
            return f();
        }
        match Self::resolve(target, operation) {
            Some(key) => {
                tracing::info!(datasource = %key, operation = operation.name(), "current data source");
                ContextHolder::sync_scope(key, f)
            }
            None => f(),
        }
    }
}

/// What the component interceptor does with the key once the operation returns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearPolicy {
    /// Set and clear are paired, exactly like the operation interceptor.
    #[default]
    Scoped,
    /// Set before the operation and never clear. The key stays visible to whatever runs next
    /// in the same call scope, or in the same task when no scope is active. Other tasks never
    /// see it.
    LeaveSet,
}

impl std::str::FromStr for ClearPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "scoped" => Ok(ClearPolicy::Scoped),
            "leave_set" | "leave-set" => Ok(ClearPolicy::LeaveSet),
            _ => Err(ConfigError::Invalid {
                name: "component clear policy".into(),
                message: format!("{} (expected scoped or leave_set)", s),
            }),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ComponentInterceptor {
    policy: ClearPolicy,
}

impl ComponentInterceptor {
    pub fn new(policy: ClearPolicy) -> Self {
        ComponentInterceptor { policy }
    }

    pub fn policy(&self) -> ClearPolicy {
        self.policy
    }

    /// Fires for components declared either concretely or through a contract.
    pub fn applies_to<C>(target: &C) -> bool
    where
        C: RoutedComponent + ?Sized,
    {
        target.component_selector().is_some() || target.contract_selector().is_some()
    }

    /// Resolve the concrete component declaration. A declaration that is only visible on a
    /// contract cannot be resolved: logged, nothing is set.
    pub fn before<C>(&self, target: &C, operation: &Operation) -> Option<DatabaseKey>
    where
        C: RoutedComponent + ?Sized,
    {
        match target.component_selector() {
            Some(decl) => {
                tracing::info!(datasource = %decl.key(), operation = operation.name(), "current data source");
                Some(decl.key().clone())
            }
            None => {
                tracing::info!(
                    operation = operation.name(),
                    "data source selector is not declared on the concrete component; using default"
                );
                None
            }
        }
    }

    pub fn after_returning(&self, operation: &Operation) {
        tracing::trace!(operation = operation.name(), "component operation returned");
    }

    pub async fn around<C, F>(&self, target: &C, operation: &Operation, fut: F) -> F::Output
    where
        C: RoutedComponent + ?Sized,
        F: Future,
    {
        let out = match (self.before(target, operation), self.policy) {
            (None, _) => fut.await,
            (Some(key), ClearPolicy::Scoped) => ContextHolder::scope(key, fut).await,
            (Some(key), ClearPolicy::LeaveSet) => {
                ContextHolder::set(key);
                fut.await
            }
        };
        self.after_returning(operation);
        out
    }

    pub fn around_sync<C, F, R>(&self, target: &C, operation: &Operation, f: F) -> R
    where
        C: RoutedComponent + ?Sized,
        F: FnOnce() -> R,
    {
        let out = match (self.before(target, operation), self.policy) {
            (None, _) => f(),
            (Some(key), ClearPolicy::Scoped) => ContextHolder::sync_scope(key, f),
            (Some(key), ClearPolicy::LeaveSet) => {
                ContextHolder::set(key);
                f()
            }
        };
        self.after_returning(operation);
        out
    }
}

/// Entry point for routed calls: chooses the operation interceptor when the operation is
/// declared, otherwise the component interceptor when the component is declared, otherwise
/// runs the call untouched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Interceptors {
    component: ComponentInterceptor,
}

impl Interceptors {
    pub fn new(policy: ClearPolicy) -> Self {
        Interceptors {
            component: ComponentInterceptor::new(policy),
        }
    }

    pub fn component(&self) -> &ComponentInterceptor {
        &self.component
    }

    pub async fn invoke<C, F>(&self, target: &C, operation: &Operation, fut: F) -> F::Output
    where
        C: RoutedComponent + ?Sized,
        F: Future,
    {
        if OperationInterceptor::applies_to(operation) {
            OperationInterceptor::around(target, operation, fut).await
        } else if ComponentInterceptor::applies_to(target) {
            self.component.around(target, operation, fut).await
        } else {
            fut.await
        }
    }

    pub fn invoke_sync<C, F, R>(&self, target: &C, operation: &Operation, f: F) -> R
    where
        C: RoutedComponent + ?Sized,
        F: FnOnce() -> R,
    {
        if OperationInterceptor::applies_to(operation) {
            OperationInterceptor::around_sync(target, operation, f)
        } else if ComponentInterceptor::applies_to(target) {
            self.component.around_sync(target, operation, f)
        } else {
            f()
        }
    }
}
