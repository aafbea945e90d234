//! Module registry: two independent module sets and the authority guard.

pub mod compliance_registry;
pub mod module_set;

pub use compliance_registry::ComplianceRegistry;
pub use module_set::ModuleSet;
