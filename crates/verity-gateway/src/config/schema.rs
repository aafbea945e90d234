use std::collections::HashSet;
use std::net::SocketAddr;
use std::time::Duration;

use serde::Deserialize;
use verity_core::error::{Result, VerityError};
use verity_core::{Address, Category, Jurisdiction, Selector};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerityConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    pub router: RouterSection,

    #[serde(default)]
    pub deployments: Vec<DeploymentConfig>,

    #[serde(default)]
    pub registrations: RegistrationsConfig,
}

impl VerityConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(VerityError::UnsupportedVersion);
        }

        self.gateway.validate()?;

        if self.router.authority.is_zero() {
            return Err(VerityError::BadRequest(
                "router.authority must not be the null address".into(),
            ));
        }

        if self.router.write_timeout_ms == 0 {
            return Err(VerityError::BadRequest(
                "router.write_timeout_ms must be > 0".into(),
            ));
        }

        let mut seen = HashSet::new();
        for d in &self.deployments {
            if !seen.insert(d.address) {
                return Err(VerityError::BadRequest(format!(
                    "deployments: duplicate address {}",
                    d.address
                )));
            }
            d.validate()?;
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        self.listen.parse::<SocketAddr>().map_err(|_| {
            VerityError::BadRequest(format!(
                "gateway.listen must be a valid socket address: {}",
                self.listen
            ))
        })?;
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouterSection {
    /// The only caller allowed to mutate the registry.
    pub authority: Address,

    /// Fail boot when a seeded registration names an address with no
    /// deployment. Off: log a warning and register it anyway.
    #[serde(default)]
    pub strict_deployments: bool,

    /// How long a registration or removal waits for the registry lock.
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,
}

impl RouterSection {
    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}

fn default_write_timeout_ms() -> u64 {
    2_000
}

/// Built-in module implementations the gateway can host in-process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleKind {
    Allowlist,
    JurisdictionAllowlist,
    Constant,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeploymentConfig {
    pub address: Address,
    pub kind: ModuleKind,
    #[serde(default)]
    pub users: Vec<Address>,
    #[serde(default)]
    pub jurisdictions: Vec<Jurisdiction>,
    #[serde(default)]
    pub value: Option<bool>,
}

impl DeploymentConfig {
    pub fn validate(&self) -> Result<()> {
        let bad = |msg: &str| -> Result<()> {
            Err(VerityError::BadRequest(format!(
                "deployment {}: {msg}",
                self.address
            )))
        };
        if self.address.is_zero() {
            return bad("address must not be the null address");
        }
        match self.kind {
            ModuleKind::Allowlist => {
                if !self.jurisdictions.is_empty() {
                    return bad("jurisdictions is only valid for jurisdiction_allowlist");
                }
                if self.value.is_some() {
                    return bad("value is only valid for constant");
                }
            }
            ModuleKind::JurisdictionAllowlist => {
                if self.jurisdictions.is_empty() {
                    return bad("jurisdiction_allowlist requires jurisdictions");
                }
                if self.value.is_some() {
                    return bad("value is only valid for constant");
                }
            }
            ModuleKind::Constant => {
                if self.value.is_none() {
                    return bad("constant requires value");
                }
                if !self.users.is_empty() || !self.jurisdictions.is_empty() {
                    return bad("constant takes no users or jurisdictions");
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RegistrationsConfig {
    #[serde(default)]
    pub general: Vec<RegistrationConfig>,
    #[serde(default)]
    pub jurisdiction: Vec<RegistrationConfig>,
}

impl RegistrationsConfig {
    /// All seed registrations in file order, general first.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &RegistrationConfig)> {
        self.general
            .iter()
            .map(|r| (Category::General, r))
            .chain(self.jurisdiction.iter().map(|r| (Category::JurisdictionAware, r)))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistrationConfig {
    pub address: Address,
    /// Defaults to the category's well-known `isCompliant` selector.
    #[serde(default)]
    pub selector: Option<Selector>,
}

impl RegistrationConfig {
    pub fn selector_for(&self, category: Category) -> Selector {
        self.selector.unwrap_or(category.default_selector())
    }
}
