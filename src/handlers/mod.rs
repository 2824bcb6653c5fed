//! HTTP handlers over the routed user service.

pub mod user;
