pub mod datasource;

pub use datasource::DataSourceKey;
