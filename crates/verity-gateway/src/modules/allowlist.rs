//! Allowlist modules: membership checks over configured users and
//! jurisdictions.

use std::collections::HashSet;

use bytes::Bytes;

use verity_core::protocol::abi::{decode_predicate_call, encode_bool, PredicateCall};
use verity_core::{Address, Jurisdiction, Selector};

use crate::dispatch::ComplianceModule;

/// Decode calldata and check the selector/argument shape agree.
pub(crate) fn decode_checked(calldata: Bytes) -> Result<PredicateCall, String> {
    let call = decode_predicate_call(calldata).map_err(|e| e.to_string())?;
    match (call.selector, call.jurisdiction.is_some()) {
        (Selector::IS_COMPLIANT, false) | (Selector::IS_COMPLIANT_IN_JURISDICTION, true) => {
            Ok(call)
        }
        (sel, _) if sel == Selector::IS_COMPLIANT || sel == Selector::IS_COMPLIANT_IN_JURISDICTION => {
            Err(format!("argument count does not match selector {sel}"))
        }
        (sel, _) => Err(format!("unknown selector {sel}")),
    }
}

/// `isCompliant(address)` (and the jurisdiction variant): true iff the user
/// is listed. The jurisdiction, when present, is ignored.
#[derive(Debug, Default)]
pub struct UserAllowlist {
    users: HashSet<Address>,
}

impl UserAllowlist {
    pub fn new(users: impl IntoIterator<Item = Address>) -> Self {
        Self {
            users: users.into_iter().collect(),
        }
    }

    pub fn is_allowed(&self, user: &Address) -> bool {
        self.users.contains(user)
    }
}

impl ComplianceModule for UserAllowlist {
    fn call(&self, calldata: Bytes) -> Result<Bytes, String> {
        let call = decode_checked(calldata)?;
        Ok(encode_bool(self.is_allowed(&call.user)))
    }
}

/// `isCompliant(address,bytes32)`: true iff the jurisdiction is listed and,
/// when a user list is configured, the user is on it.
#[derive(Debug, Default)]
pub struct JurisdictionAllowlist {
    jurisdictions: HashSet<Jurisdiction>,
    users: HashSet<Address>, // empty => any user
}

impl JurisdictionAllowlist {
    pub fn new(
        jurisdictions: impl IntoIterator<Item = Jurisdiction>,
        users: impl IntoIterator<Item = Address>,
    ) -> Self {
        Self {
            jurisdictions: jurisdictions.into_iter().collect(),
            users: users.into_iter().collect(),
        }
    }

    pub fn is_allowed(&self, user: &Address, jurisdiction: &Jurisdiction) -> bool {
        if !self.jurisdictions.contains(jurisdiction) {
            return false;
        }
        self.users.is_empty() || self.users.contains(user)
    }
}

impl ComplianceModule for JurisdictionAllowlist {
    fn call(&self, calldata: Bytes) -> Result<Bytes, String> {
        let call = decode_checked(calldata)?;
        let Some(jurisdiction) = call.jurisdiction else {
            return Err("jurisdiction allowlist only answers isCompliant(address,bytes32)".into());
        };
        Ok(encode_bool(self.is_allowed(&call.user, &jurisdiction)))
    }
}
