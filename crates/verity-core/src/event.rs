//! Registry audit events.
//!
//! One event is recorded per successful state-changing mutation. Events are
//! serialized with an explicit `event` tag so the journal can be shipped as
//! JSON without losing which mutation produced each record.

use serde::Serialize;

use crate::primitives::{Address, Category, Selector};

/// A registry mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event")]
pub enum RouterEvent {
    GeneralComplianceContractRegistered {
        identity: Address,
        selector: Selector,
    },
    JurisdictionAwareComplianceContractRegistered {
        identity: Address,
        selector: Selector,
    },
    /// Fired once per removal call, even when the identity was cleared
    /// from both categories.
    ComplianceContractRemoved { identity: Address },
}

impl RouterEvent {
    /// Registration event for the given category.
    pub fn registered(category: Category, identity: Address, selector: Selector) -> Self {
        match category {
            Category::General => RouterEvent::GeneralComplianceContractRegistered {
                identity,
                selector,
            },
            Category::JurisdictionAware => {
                RouterEvent::JurisdictionAwareComplianceContractRegistered { identity, selector }
            }
        }
    }

    pub fn identity(&self) -> &Address {
        match self {
            RouterEvent::GeneralComplianceContractRegistered { identity, .. }
            | RouterEvent::JurisdictionAwareComplianceContractRegistered { identity, .. }
            | RouterEvent::ComplianceContractRemoved { identity } => identity,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RouterEvent::GeneralComplianceContractRegistered { .. } => {
                "GeneralComplianceContractRegistered"
            }
            RouterEvent::JurisdictionAwareComplianceContractRegistered { .. } => {
                "JurisdictionAwareComplianceContractRegistered"
            }
            RouterEvent::ComplianceContractRemoved { .. } => "ComplianceContractRemoved",
        }
    }
}

/// A journaled event with its position in the mutation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventRecord {
    /// 1-based, strictly increasing.
    pub seq: u64,
    #[serde(flatten)]
    pub event: RouterEvent,
}
