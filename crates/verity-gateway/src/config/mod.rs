//! `verity.yaml` loading: strict YAML decode, then semantic validation.

pub mod schema;

use std::fs;

use verity_core::error::{Result, VerityError};

pub use schema::{
    DeploymentConfig, GatewaySection, ModuleKind, RegistrationConfig, RegistrationsConfig,
    RouterSection, VerityConfig,
};

pub fn load_from_file(path: &str) -> Result<VerityConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| VerityError::Internal(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<VerityConfig> {
    let cfg: VerityConfig = serde_yaml::from_str(s)
        .map_err(|e| VerityError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
