//! Ambient, call-scope-local storage of the current database key.
//!
//! A call scope is the innermost [`ContextHolder::scope`] (async) or
//! [`ContextHolder::sync_scope`] (sync) region on the current task. Each scope owns its own
//! cell: concurrent tasks never see each other's key, and leaving a scope (normally, by panic,
//! or by dropping the future) makes the enclosing cell visible again.
//!
//! Outside any scope the key lives in a fallback cell owned by the running tokio task, keyed
//! by its task id, so it follows the task across worker threads and stays invisible to other
//! tasks sharing the thread. Code that is not running in a task (plain threads, `block_on`)
//! uses a per-thread cell instead. Neither fallback is dropped automatically: a bare
//! [`ContextHolder::set`] there must be paired with [`ContextHolder::clear`].

use crate::key::{DatabaseKey, MASTER};
use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};
use tokio::task;

tokio::task_local! {
    static SCOPED_KEY: RefCell<Option<DatabaseKey>>;
}

thread_local! {
    static THREAD_KEY: RefCell<Option<DatabaseKey>> = const { RefCell::new(None) };
}

static TASK_KEYS: OnceLock<Mutex<HashMap<task::Id, DatabaseKey>>> = OnceLock::new();

fn task_keys() -> MutexGuard<'static, HashMap<task::Id, DatabaseKey>> {
    TASK_KEYS
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Unscoped storage: the running task's entry, or the thread cell outside of tasks.
fn write_fallback(key: Option<DatabaseKey>) {
    match (task::try_id(), key) {
        (Some(id), Some(key)) => {
            task_keys().insert(id, key);
        }
        (Some(id), None) => {
            task_keys().remove(&id);
        }
        (None, key) => {
            THREAD_KEY.with(|cell| cell.replace(key));
        }
    }
}

fn read_fallback() -> Option<DatabaseKey> {
    match task::try_id() {
        Some(id) => task_keys().get(&id).cloned(),
        None => THREAD_KEY.with(|cell| cell.borrow().clone()),
    }
}

pub struct ContextHolder;

impl ContextHolder {
    /// Store `key` as current for the active call scope. Unregistered keys are accepted here
    /// and fall back to the default data source at resolution time.
    pub fn set(key: impl Into<DatabaseKey>) {
        let key = key.into();
        if SCOPED_KEY
            .try_with(|cell| cell.replace(Some(key.clone())))
            .is_err()
        {
            write_fallback(Some(key));
        }
    }

    /// Current key, or [`MASTER`] when none is stored.
    pub fn get() -> DatabaseKey {
        Self::current().unwrap_or(MASTER)
    }

    /// Current key without the default substitution.
    pub fn current() -> Option<DatabaseKey> {
        SCOPED_KEY
            .try_with(|cell| cell.borrow().clone())
            .unwrap_or_else(|_| read_fallback())
    }

    pub fn clear() {
        if SCOPED_KEY.try_with(|cell| cell.replace(None)).is_err() {
            write_fallback(None);
        }
    }

    /// Run `fut` with `key` installed in a fresh cell. The cell is discarded when the future
    /// completes or is dropped.
    pub fn scope<F>(key: DatabaseKey, fut: F) -> impl Future<Output = F::Output>
    where
        F: Future,
    {
        SCOPED_KEY.scope(RefCell::new(Some(key)), fut)
    }

    /// Synchronous counterpart of [`ContextHolder::scope`]; the previous cell is restored even
    /// if `f` panics.
    pub fn sync_scope<F, R>(key: DatabaseKey, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        SCOPED_KEY.sync_scope(RefCell::new(Some(key)), f)
    }
}
