//! Shared compliance router: registry + dispatcher behind one lock.
//!
//! Every public operation is one atomic unit relative to the registry:
//! mutations hold the write lock for their whole duration, queries hold a
//! read lock for the whole module walk, so a query never observes a torn
//! registry and queries run in parallel with each other.
//!
//! Queries take the read lock recursively so a module that calls back
//! into a query cannot deadlock behind a queued writer. The price is that
//! a queued writer does not hold back new queries: under unbroken query
//! load a registration or removal can wait until its lock timeout and be
//! refused.
//!
//! Mutations are refused with `StaticCallViolation` in two cases:
//! - on a thread that is itself inside a module call;
//! - when the write lock cannot be taken within the write timeout while
//!   module calls are in flight on this router. This is what a module
//!   hits when it hands a mutation to another thread and waits for it.
//!
//! A thread a module spawns and leaves running is an ordinary caller once
//! the query returns; modules are trusted in-process code and the
//! authority check is the only gate left at that point.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use verity_core::error::{Result, VerityError};
use verity_core::event::EventRecord;
use verity_core::{Address, Category, Jurisdiction, ModuleEntry, Selector};

use crate::dispatch::{in_static_call, Dispatcher, ModuleHost, QueryReport};
use crate::registry::ComplianceRegistry;

/// How long a mutation waits for the write lock by default.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(2);

/// Largest page `events_page` hands out.
pub const MAX_EVENT_PAGE: usize = 1_000;

pub struct ComplianceRouter {
    registry: RwLock<ComplianceRegistry>,
    dispatcher: Dispatcher,
    /// Module walks currently running against this router.
    in_flight: AtomicUsize,
    write_timeout: Duration,
}

/// Counts one module walk for as long as it lives.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ComplianceRouter {
    pub fn new(authority: Address, host: Arc<dyn ModuleHost>) -> Self {
        Self {
            registry: RwLock::new(ComplianceRegistry::new(authority)),
            dispatcher: Dispatcher::new(host),
            in_flight: AtomicUsize::new(0),
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }

    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Module walks currently running against this router.
    pub fn in_flight_queries(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    fn read(&self) -> RwLockReadGuard<'_, ComplianceRegistry> {
        self.registry.read_recursive()
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, ComplianceRegistry>> {
        if in_static_call() {
            return Err(VerityError::StaticCallViolation);
        }
        if let Some(guard) = self.registry.try_write_for(self.write_timeout) {
            return Ok(guard);
        }
        if self.in_flight_queries() > 0 {
            tracing::warn!(timeout = ?self.write_timeout, "mutation blocked behind in-flight module calls");
            return Err(VerityError::StaticCallViolation);
        }
        Err(VerityError::Internal("registry write lock timed out".into()))
    }

    pub fn authority(&self) -> Address {
        self.read().authority()
    }

    pub fn register(
        &self,
        category: Category,
        caller: &Address,
        identity: Address,
        selector: Selector,
    ) -> Result<()> {
        let res = self
            .write()
            .and_then(|mut reg| reg.register(category, caller, identity, selector));
        if let Err(e) = &res {
            tracing::warn!(%category, %caller, module = %identity, %selector, error = %e, "registration rejected");
        }
        res
    }

    /// `registerGeneralComplianceContract`
    pub fn register_general(
        &self,
        caller: &Address,
        identity: Address,
        selector: Selector,
    ) -> Result<()> {
        self.register(Category::General, caller, identity, selector)
    }

    /// `registerJurisdictionComplianceContract`
    pub fn register_jurisdiction(
        &self,
        caller: &Address,
        identity: Address,
        selector: Selector,
    ) -> Result<()> {
        self.register(Category::JurisdictionAware, caller, identity, selector)
    }

    /// `removeComplianceContract`
    pub fn remove(&self, caller: &Address, identity: &Address) -> Result<Vec<Category>> {
        let res = self.write().and_then(|mut reg| reg.remove(caller, identity));
        if let Err(e) = &res {
            tracing::warn!(%caller, module = %identity, error = %e, "removal rejected");
        }
        res
    }

    pub fn count(&self, category: Category) -> usize {
        self.read().count(category)
    }

    /// `getGeneralComplianceContractCount()`
    pub fn general_count(&self) -> usize {
        self.read().general_count()
    }

    /// `getJurisdictionAwareContractCount()`
    pub fn jurisdiction_count(&self) -> usize {
        self.read().jurisdiction_count()
    }

    /// Registered entries of one category in current storage order.
    pub fn modules(&self, category: Category) -> Vec<ModuleEntry> {
        self.read().modules(category).entries().to_vec()
    }

    fn journal_after(&self, after: u64, limit: usize) -> Vec<EventRecord> {
        let reg = self.read();
        let events = reg.events();
        // seq is 1-based and dense, so `after` is also the start index
        let start = usize::try_from(after).unwrap_or(usize::MAX).min(events.len());
        events[start..].iter().take(limit).cloned().collect()
    }

    /// Every journal record with `seq > after`.
    pub fn events_since(&self, after: u64) -> Vec<EventRecord> {
        self.journal_after(after, usize::MAX)
    }

    /// At most `limit` journal records with `seq > after`, oldest first.
    /// `limit` is clamped to `1..=MAX_EVENT_PAGE`.
    pub fn events_page(&self, after: u64, limit: usize) -> Vec<EventRecord> {
        self.journal_after(after, limit.clamp(1, MAX_EVENT_PAGE))
    }

    pub fn events(&self) -> Vec<EventRecord> {
        self.events_since(0)
    }

    /// `isCompliant(user)` with the per-module trace.
    pub fn check_general(&self, user: &Address) -> QueryReport {
        let reg = self.read();
        let _walk = InFlight::enter(&self.in_flight);
        self.dispatcher
            .check_general(reg.modules(Category::General), user)
    }

    /// `isCompliant(user, jurisdiction)` with the per-module trace.
    pub fn check_jurisdiction(&self, user: &Address, jurisdiction: &Jurisdiction) -> QueryReport {
        let reg = self.read();
        let _walk = InFlight::enter(&self.in_flight);
        self.dispatcher
            .check_jurisdiction(reg.modules(Category::JurisdictionAware), user, jurisdiction)
    }

    /// `isCompliant(user)`
    pub fn is_compliant(&self, user: &Address) -> bool {
        self.check_general(user).compliant
    }

    /// `isCompliant(user, jurisdiction)`
    pub fn is_compliant_in(&self, user: &Address, jurisdiction: &Jurisdiction) -> bool {
        self.check_jurisdiction(user, jurisdiction).compliant
    }
}
