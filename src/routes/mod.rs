pub mod common;
pub mod user;

pub use common::common_routes;
pub use user::{replica_routes, user_routes};
