use std::any::Any;
use std::cell::Cell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use bytes::Bytes;
use dashmap::DashMap;
use thiserror::Error;

use verity_core::Address;

/// Why a module call did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallFailure {
    /// The module rejected the call.
    #[error("reverted: {0}")]
    Reverted(String),
    /// The module panicked mid-call.
    #[error("trapped: {0}")]
    Trapped(String),
}

/// Code deployed behind a module identity.
///
/// Modules only ever see `&self` and the raw calldata. The host hands them
/// no router handle; one a module captured itself is refused for mutation
/// on the calling thread (see [`StaticCallGuard`]) and, on other threads,
/// for as long as the router has module calls in flight and the write
/// lock stays out of reach.
pub trait ComplianceModule: Send + Sync {
    /// Handle one read-only call. `Err` reverts the call with a reason.
    fn call(&self, calldata: Bytes) -> Result<Bytes, String>;
}

/// Execution environment that resolves identities to module code.
pub trait ModuleHost: Send + Sync {
    /// Perform a side-effect-free call into `target`.
    ///
    /// A target with no deployed code completes with an empty payload.
    fn static_call(&self, target: &Address, calldata: Bytes) -> Result<Bytes, CallFailure>;
}

thread_local! {
    static STATIC_DEPTH: Cell<u32> = const { Cell::new(0) };
}

/// Marks the current thread as inside a static call until dropped.
///
/// Per-thread only: router mutations check [`in_static_call`] and refuse
/// to run while any guard is alive on the calling thread. Work a module
/// hands to another thread is caught by the router's bounded write lock
/// instead.
pub struct StaticCallGuard {
    _private: (),
}

impl StaticCallGuard {
    pub fn enter() -> Self {
        STATIC_DEPTH.with(|d| d.set(d.get().saturating_add(1)));
        Self { _private: () }
    }
}

impl Drop for StaticCallGuard {
    fn drop(&mut self) {
        STATIC_DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}

/// Whether the current thread is executing inside a module static call.
pub fn in_static_call() -> bool {
    STATIC_DEPTH.with(|d| d.get() > 0)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "module panicked".to_string()
    }
}

/// Module host for modules linked into the gateway process.
#[derive(Default)]
pub struct InProcessHost {
    modules: DashMap<Address, Arc<dyn ComplianceModule>>,
}

impl InProcessHost {
    pub fn new() -> Self {
        Self {
            modules: DashMap::new(),
        }
    }

    /// Deploy (or replace) the code behind `address`.
    pub fn deploy(&self, address: Address, module: Arc<dyn ComplianceModule>) {
        self.modules.insert(address, module);
    }

    pub fn undeploy(&self, address: &Address) -> bool {
        self.modules.remove(address).is_some()
    }

    pub fn is_deployed(&self, address: &Address) -> bool {
        self.modules.contains_key(address)
    }

    pub fn deployed(&self) -> Vec<Address> {
        self.modules.iter().map(|e| *e.key()).collect()
    }
}

impl ModuleHost for InProcessHost {
    fn static_call(&self, target: &Address, calldata: Bytes) -> Result<Bytes, CallFailure> {
        // clone out so no shard lock is held across the call
        let Some(module) = self.modules.get(target).map(|e| Arc::clone(e.value())) else {
            return Ok(Bytes::new());
        };

        let _guard = StaticCallGuard::enter();
        match catch_unwind(AssertUnwindSafe(|| module.call(calldata))) {
            Ok(Ok(ret)) => Ok(ret),
            Ok(Err(reason)) => Err(CallFailure::Reverted(reason)),
            Err(payload) => Err(CallFailure::Trapped(panic_message(payload.as_ref()))),
        }
    }
}
