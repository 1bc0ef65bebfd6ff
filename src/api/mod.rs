//! Backend resource wrappers used by the console core.

pub mod auth;
pub mod logs;
mod types;

pub use types::*;
