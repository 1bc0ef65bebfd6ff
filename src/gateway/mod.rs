//! Request gateway for WAF Console.
//!
//! Every backend call passes through here:
//! - Transport: the wire seam (reqwest in production)
//! - Envelope: pure classification of replies into outcomes
//! - Notice: user-facing messages for failed calls
//! - Recovery: the session-loss procedure
//! - Dispatch: credential attachment and the dispatch loop itself

mod dispatch;
mod envelope;
mod notice;
mod recovery;
mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use dispatch::*;
pub use envelope::*;
pub use notice::*;
pub use recovery::*;
pub use transport::*;

/// Envelope code of a successful call.
pub const SUCCESS_CODE: i64 = 200;
/// Envelope code meaning the credential is missing or no longer accepted.
pub const UNAUTHENTICATED_CODE: i64 = 401;
