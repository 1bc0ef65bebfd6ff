//! Session storage for WAF Console.
//!
//! Holds the bearer credential and cached profile, and the redirect
//! state the gateway and navigation guard coordinate through.

mod redirect;
mod store;

pub use redirect::*;
pub use store::*;
