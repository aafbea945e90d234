//! Verity gateway library entry.
//!
//! Wires the module registry, the predicate dispatcher, in-process
//! reference modules and the HTTP surface into one service. Consumed by
//! the binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod engine;
pub mod modules;
pub mod obs;
pub mod ops;
pub mod registry;
pub mod router;
pub mod transport;
