//! Top-level facade crate for Verity.
//!
//! Re-exports the core types (addresses, selectors, ABI codec, events) and
//! the gateway library (registry, dispatcher, router) under one dependency.

pub mod core {
    pub use verity_core::*;
}

pub mod gateway {
    pub use verity_gateway::*;
}
