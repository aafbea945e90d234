//! Dispatcher module exports.
//!
//! Re-exports the module host seam and the dispatcher so downstream
//! consumers (and module authors writing in-process modules) can depend on
//! this module directly.

pub mod dispatcher;
pub mod host;

pub use dispatcher::{Dispatcher, ModuleInvocationFailure, ModuleVerdict, Outcome, QueryReport};
pub use host::{in_static_call, CallFailure, ComplianceModule, InProcessHost, ModuleHost};
