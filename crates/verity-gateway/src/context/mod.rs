//! Request context shared across handlers.
//!
//! Mutations are attributed to a caller identity carried in a request
//! header; queries are anonymous.

pub mod caller;

pub use caller::{resolve_caller, CALLER_HEADER};
