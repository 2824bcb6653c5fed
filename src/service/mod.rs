//! Reference persistence consumer: users read from and written to routed pools.

mod user;
pub use user::{PgUserDao, UserDao, UserDto, UserService};
