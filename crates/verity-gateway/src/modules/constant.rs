use bytes::Bytes;

use verity_core::protocol::abi::encode_bool;

use super::allowlist::decode_checked;
use crate::dispatch::ComplianceModule;

/// Answers every well-formed predicate call with a fixed value.
#[derive(Debug, Clone, Copy)]
pub struct ConstantModule {
    value: bool,
}

impl ConstantModule {
    pub fn new(value: bool) -> Self {
        Self { value }
    }
}

impl ComplianceModule for ConstantModule {
    fn call(&self, calldata: Bytes) -> Result<Bytes, String> {
        decode_checked(calldata)?;
        Ok(encode_bool(self.value))
    }
}
