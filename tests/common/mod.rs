#![allow(dead_code)]

use async_trait::async_trait;
use dynamic_datasource::{
    AppError, DataSourceRegistry, RoutingDataSource, UserDao, UserDto, MASTER, SLAVE1,
};
use std::sync::{Arc, Mutex};

/// Router over plain labels: master (default) and slave1.
pub fn label_router() -> RoutingDataSource<&'static str> {
    RoutingDataSource::new(
        DataSourceRegistry::new(MASTER, "master-pool").with(SLAVE1, "slave1-pool"),
    )
}

/// In-memory stand-in for one physical database.
#[derive(Clone, Debug, Default)]
pub struct FakeDb {
    rows: Arc<Mutex<Vec<UserDto>>>,
}

impl FakeDb {
    pub fn with_rows(rows: Vec<UserDto>) -> Self {
        FakeDb {
            rows: Arc::new(Mutex::new(rows)),
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.rows.lock().unwrap().iter().map(|u| u.name.clone()).collect()
    }
}

/// DAO that resolves its database on every call, like `PgUserDao`.
pub struct FakeUserDao {
    datasource: RoutingDataSource<FakeDb>,
}

impl FakeUserDao {
    pub fn new(datasource: RoutingDataSource<FakeDb>) -> Self {
        FakeUserDao { datasource }
    }
}

#[async_trait]
impl UserDao for FakeUserDao {
    async fn insert_user(&self, user: &UserDto) -> Result<u64, AppError> {
        let db = self.datasource.resolve();
        let mut rows = db.rows.lock().unwrap();
        let mut user = user.clone();
        user.id = rows.len() as i32 + 1;
        rows.push(user);
        Ok(1)
    }

    async fn find_list(&self) -> Result<Vec<UserDto>, AppError> {
        Ok(self.datasource.resolve().rows.lock().unwrap().clone())
    }
}

pub struct Cluster {
    pub datasource: RoutingDataSource<FakeDb>,
    pub master: FakeDb,
    pub slave1: FakeDb,
}

/// master holds alice, slave1 holds bob.
pub fn fake_cluster() -> Cluster {
    let master = FakeDb::with_rows(vec![UserDto {
        id: 1,
        name: "alice".into(),
        age: Some(30),
    }]);
    let slave1 = FakeDb::with_rows(vec![UserDto {
        id: 1,
        name: "bob".into(),
        age: Some(41),
    }]);
    let datasource = RoutingDataSource::new(
        DataSourceRegistry::new(MASTER, master.clone()).with(SLAVE1, slave1.clone()),
    );
    Cluster {
        datasource,
        master,
        slave1,
    }
}
