//! User reads and writes routed between master and replica.

use crate::declaration::{Operation, SelectorDeclaration};
use crate::error::AppError;
use crate::interceptor::{ClearPolicy, Interceptors, RoutedComponent};
use crate::key::{DatabaseKey, SLAVE1};
use crate::routing::RoutingDataSource;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserDto {
    #[serde(default)]
    pub id: i32,
    pub name: String,
    pub age: Option<i32>,
}

impl UserDto {
    pub fn new(name: impl Into<String>, age: i32) -> Self {
        UserDto {
            id: 0,
            name: name.into(),
            age: Some(age),
        }
    }
}

/// Persistence for users. Implementations must pick their connection source on every call,
/// so that the ambient routing key of the caller applies.
#[async_trait]
pub trait UserDao: Send + Sync {
    /// Insert one user; returns affected rows.
    async fn insert_user(&self, user: &UserDto) -> Result<u64, AppError>;

    async fn find_list(&self) -> Result<Vec<UserDto>, AppError>;
}

pub struct PgUserDao {
    datasource: RoutingDataSource<PgPool>,
}

impl PgUserDao {
    pub fn new(datasource: RoutingDataSource<PgPool>) -> Self {
        PgUserDao { datasource }
    }
}

#[async_trait]
impl UserDao for PgUserDao {
    async fn insert_user(&self, user: &UserDto) -> Result<u64, AppError> {
        let done = sqlx::query("INSERT INTO users (name, age) VALUES ($1, $2)")
            .bind(&user.name)
            .bind(user.age)
            .execute(self.datasource.pool())
            .await?;
        Ok(done.rows_affected())
    }

    async fn find_list(&self) -> Result<Vec<UserDto>, AppError> {
        let rows = sqlx::query_as::<_, UserDto>("SELECT id, name, age FROM users ORDER BY id")
            .fetch_all(self.datasource.pool())
            .await?;
        Ok(rows)
    }
}

/// User operations. A service pinned to a database ([`UserService::pinned_to`]) routes every
/// undeclared operation there, subject to its [`ClearPolicy`].
pub struct UserService<D> {
    dao: D,
    interceptors: Interceptors,
    pinned: Option<SelectorDeclaration>,
}

impl<D> RoutedComponent for UserService<D> {
    fn component_selector(&self) -> Option<SelectorDeclaration> {
        self.pinned.clone()
    }
}

impl<D: UserDao> UserService<D> {
    pub const LIST_BY_MASTER: Operation = Operation::declared_default("get_list_by_master");
    pub const LIST_BY_SLAVE: Operation = Operation::declared("get_list_by_slave", SLAVE1);
    pub const LIST_USERS: Operation = Operation::undeclared("list_users");
    pub const CREATE_USER: Operation = Operation::undeclared("create_user");
    pub const CREATE_ON_SLAVE: Operation = Operation::declared("create_user_on_slave", SLAVE1);

    pub fn new(dao: D) -> Self {
        Self::with_policy(dao, ClearPolicy::default())
    }

    pub fn with_policy(dao: D, policy: ClearPolicy) -> Self {
        UserService {
            dao,
            interceptors: Interceptors::new(policy),
            pinned: None,
        }
    }

    /// Declare the whole service as running against `key`.
    pub fn pinned_to(mut self, key: DatabaseKey) -> Self {
        self.pinned = Some(SelectorDeclaration::component(key));
        self
    }

    pub fn dao(&self) -> &D {
        &self.dao
    }

    pub async fn get_list_by_master(&self) -> Result<Vec<UserDto>, AppError> {
        self.interceptors
            .invoke(self, &Self::LIST_BY_MASTER, self.dao.find_list())
            .await
    }

    pub async fn get_list_by_slave(&self) -> Result<Vec<UserDto>, AppError> {
        self.interceptors
            .invoke(self, &Self::LIST_BY_SLAVE, self.dao.find_list())
            .await
    }

    /// Follows whatever database the caller selected.
    pub async fn list_users(&self) -> Result<Vec<UserDto>, AppError> {
        self.interceptors
            .invoke(self, &Self::LIST_USERS, self.dao.find_list())
            .await
    }

    pub async fn create_user(&self, user: &UserDto) -> Result<u64, AppError> {
        check_name(user)?;
        self.interceptors
            .invoke(self, &Self::CREATE_USER, self.dao.insert_user(user))
            .await
    }

    pub async fn create_user_on_slave(&self, user: &UserDto) -> Result<u64, AppError> {
        check_name(user)?;
        self.interceptors
            .invoke(self, &Self::CREATE_ON_SLAVE, self.dao.insert_user(user))
            .await
    }
}

fn check_name(user: &UserDto) -> Result<(), AppError> {
    if user.name.trim().is_empty() {
        return Err(AppError::BadRequest("name must not be empty".into()));
    }
    Ok(())
}
