//! Reference compliance modules hosted in-process by the gateway.
//!
//! These are ordinary `ComplianceModule` implementations: they decode the
//! ABI calldata themselves and answer with a boolean word, exactly as an
//! externally deployed module would. The router treats them no differently.

pub mod allowlist;
pub mod constant;

use std::sync::Arc;

use verity_core::error::Result;

use crate::config::{DeploymentConfig, ModuleKind};
use crate::dispatch::ComplianceModule;

pub use allowlist::{JurisdictionAllowlist, UserAllowlist};
pub use constant::ConstantModule;

/// Build the module code described by one `deployments` entry.
pub fn build(d: &DeploymentConfig) -> Result<Arc<dyn ComplianceModule>> {
    d.validate()?;
    let module: Arc<dyn ComplianceModule> = match d.kind {
        ModuleKind::Allowlist => Arc::new(UserAllowlist::new(d.users.iter().copied())),
        ModuleKind::JurisdictionAllowlist => Arc::new(JurisdictionAllowlist::new(
            d.jurisdictions.iter().copied(),
            d.users.iter().copied(),
        )),
        ModuleKind::Constant => Arc::new(ConstantModule::new(d.value.unwrap_or(false))),
    };
    Ok(module)
}
