//! verity core: identity primitives, the ABI predicate codec, registry
//! events and the error surface shared by the router gateway and module
//! authors.
//!
//! No runtime or transport dependencies: a compliance module can depend on
//! this crate to decode calldata and encode its answer without pulling in
//! the gateway.
//!
//! Malformed calldata and return payloads surface as `VerityError`; the
//! clippy lints below keep `unwrap`, `expect` and `panic!` out of the crate.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod event;
pub mod primitives;
pub mod protocol;

/// Shared result type.
pub use error::{Result, VerityError};
pub use primitives::{Address, Category, Jurisdiction, ModuleEntry, Selector};
