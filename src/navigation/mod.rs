//! Navigation layer for WAF Console.
//!
//! - Location: path plus query of a view
//! - Routes: the console's route table and per-route metadata
//! - Guard: decides whether a target may mount
//! - Navigator: applies guard decisions and tracks the mounted view

mod guard;
mod location;
mod navigator;
mod routes;

pub use guard::*;
pub use location::*;
pub use navigator::*;
pub use routes::*;
