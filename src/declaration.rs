//! Selector declarations: which database an operation or a whole component uses.

use crate::key::{DatabaseKey, MASTER};
use serde::{Deserialize, Serialize};

/// Element a declaration is attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationScope {
    Operation,
    Component,
}

/// Immutable `(scope, key)` pair. Keys default to [`MASTER`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorDeclaration {
    scope: DeclarationScope,
    key: DatabaseKey,
}

impl SelectorDeclaration {
    pub const fn operation(key: DatabaseKey) -> Self {
        SelectorDeclaration {
            scope: DeclarationScope::Operation,
            key,
        }
    }

    pub const fn operation_default() -> Self {
        Self::operation(MASTER)
    }

    pub const fn component(key: DatabaseKey) -> Self {
        SelectorDeclaration {
            scope: DeclarationScope::Component,
            key,
        }
    }

    pub const fn component_default() -> Self {
        Self::component(MASTER)
    }

    pub fn scope(&self) -> DeclarationScope {
        self.scope
    }

    pub fn key(&self) -> &DatabaseKey {
        &self.key
    }
}

/// A named operation of a component together with its own declaration, if any.
///
/// Meant to be declared once as an associated `const` next to the method it describes:
///
/// ```
/// use dynamic_datasource::{Operation, SLAVE1};
///
/// const LIST_BY_SLAVE: Operation = Operation::declared("get_list_by_slave", SLAVE1);
/// assert_eq!(LIST_BY_SLAVE.declaration().unwrap().key(), &SLAVE1);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Operation {
    name: &'static str,
    declaration: Option<SelectorDeclaration>,
}

impl Operation {
    pub const fn declared(name: &'static str, key: DatabaseKey) -> Self {
        Operation {
            name,
            declaration: Some(SelectorDeclaration::operation(key)),
        }
    }

    /// Declared without an explicit key, i.e. on [`MASTER`].
    pub const fn declared_default(name: &'static str) -> Self {
        Operation {
            name,
            declaration: Some(SelectorDeclaration::operation_default()),
        }
    }

    pub const fn undeclared(name: &'static str) -> Self {
        Operation {
            name,
            declaration: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn declaration(&self) -> Option<&SelectorDeclaration> {
        self.declaration.as_ref()
    }
}

/// Declarations visible at one call site, resolved with a fixed precedence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Declarations {
    pub component: Option<SelectorDeclaration>,
    pub operation: Option<SelectorDeclaration>,
}

impl Declarations {
    pub fn new(
        component: Option<SelectorDeclaration>,
        operation: Option<SelectorDeclaration>,
    ) -> Self {
        Declarations {
            component,
            operation,
        }
    }

    /// Component declaration first, operation declaration second. An operation can only pick
    /// its own database when the surrounding component declares none.
    pub fn resolve(&self) -> Option<&SelectorDeclaration> {
        self.component.as_ref().or(self.operation.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.component.is_none() && self.operation.is_none()
    }
}
