use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;

use verity_core::protocol::abi::{self, WORD_LEN};
use verity_core::{Address, Jurisdiction, Selector};

use super::host::{CallFailure, ModuleHost};
use crate::registry::ModuleSet;

/// A module answer that could not count as affirmative for a reason other
/// than a clean `false`. Always absorbed by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModuleInvocationFailure {
    #[error("call reverted: {0}")]
    Reverted(String),
    #[error("call trapped: {0}")]
    Trapped(String),
    #[error("return payload is {len} bytes, expected 32")]
    MalformedReturn { len: usize },
    #[error("return word is not a boolean")]
    NonBooleanWord,
}

impl From<CallFailure> for ModuleInvocationFailure {
    fn from(f: CallFailure) -> Self {
        match f {
            CallFailure::Reverted(r) => ModuleInvocationFailure::Reverted(r),
            CallFailure::Trapped(r) => ModuleInvocationFailure::Trapped(r),
        }
    }
}

/// Normalized result of one module invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Affirmative,
    Negative,
    Failed(ModuleInvocationFailure),
}

impl Outcome {
    pub fn is_affirmative(&self) -> bool {
        matches!(self, Outcome::Affirmative)
    }

    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Affirmative => "affirmative",
            Outcome::Negative => "negative",
            Outcome::Failed(ModuleInvocationFailure::Reverted(_)) => "reverted",
            Outcome::Failed(ModuleInvocationFailure::Trapped(_)) => "trapped",
            Outcome::Failed(ModuleInvocationFailure::MalformedReturn { .. }) => "malformed",
            Outcome::Failed(ModuleInvocationFailure::NonBooleanWord) => "non_boolean",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleVerdict {
    pub identity: Address,
    pub outcome: Outcome,
}

/// What an aggregated query saw, in invocation order.
#[derive(Debug, Clone, Default)]
pub struct QueryReport {
    pub compliant: bool,
    /// Only modules actually invoked appear here; the walk stops at the
    /// first affirmative answer.
    pub verdicts: Vec<ModuleVerdict>,
}

impl QueryReport {
    pub fn affirmed_by(&self) -> Option<Address> {
        self.verdicts
            .iter()
            .find(|v| v.outcome.is_affirmative())
            .map(|v| v.identity)
    }
}

/// Invokes registered module predicates and OR-combines their answers.
#[derive(Clone)]
pub struct Dispatcher {
    host: Arc<dyn ModuleHost>,
}

impl Dispatcher {
    pub fn new(host: Arc<dyn ModuleHost>) -> Self {
        Self { host }
    }

    pub fn host(&self) -> &Arc<dyn ModuleHost> {
        &self.host
    }

    /// Invoke one predicate and normalize whatever comes back.
    pub fn invoke(&self, target: &Address, calldata: Bytes) -> Outcome {
        let ret = match self.host.static_call(target, calldata) {
            Ok(ret) => ret,
            Err(f) => return Outcome::Failed(f.into()),
        };
        if ret.len() != WORD_LEN {
            return Outcome::Failed(ModuleInvocationFailure::MalformedReturn { len: ret.len() });
        }
        match abi::decode_bool(ret) {
            Ok(true) => Outcome::Affirmative,
            Ok(false) => Outcome::Negative,
            Err(_) => Outcome::Failed(ModuleInvocationFailure::NonBooleanWord),
        }
    }

    /// `isCompliant(user)` over the general set.
    pub fn check_general(&self, modules: &ModuleSet, user: &Address) -> QueryReport {
        self.walk(modules, |selector| abi::encode_general_call(selector, user))
    }

    /// `isCompliant(user, jurisdiction)` over the jurisdiction-aware set.
    pub fn check_jurisdiction(
        &self,
        modules: &ModuleSet,
        user: &Address,
        jurisdiction: &Jurisdiction,
    ) -> QueryReport {
        self.walk(modules, |selector| {
            abi::encode_jurisdiction_call(selector, user, jurisdiction)
        })
    }

    fn walk<F>(&self, modules: &ModuleSet, encode: F) -> QueryReport
    where
        F: Fn(Selector) -> Bytes,
    {
        let mut report = QueryReport::default();
        for entry in modules.iter() {
            let outcome = self.invoke(&entry.identity, encode(entry.selector));
            if let Outcome::Failed(ref failure) = outcome {
                tracing::debug!(module = %entry.identity, selector = %entry.selector, %failure, "module invocation failed");
            }
            let affirmative = outcome.is_affirmative();
            report.verdicts.push(ModuleVerdict {
                identity: entry.identity,
                outcome,
            });
            if affirmative {
                report.compliant = true;
                break;
            }
        }
        report
    }
}
