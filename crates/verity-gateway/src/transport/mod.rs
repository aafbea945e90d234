//! HTTP transport.
//!
//! JSON handlers over the shared router plus the error-to-response mapping
//! every handler returns through.

pub mod error;
pub mod http;

pub use error::ApiError;
