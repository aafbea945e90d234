//! Shared application state for the Verity gateway.
//!
//! Boot order: deploy in-process reference modules, create the router with
//! the configured authority, then seed registrations as that authority.

use std::sync::Arc;
use std::time::Instant;

use verity_core::error::{Result, VerityError};
use verity_core::{Address, Category, Jurisdiction, Selector};

use crate::config::VerityConfig;
use crate::dispatch::{InProcessHost, QueryReport};
use crate::engine::ComplianceRouter;
use crate::modules;
use crate::obs::RouterMetrics;

#[derive(Clone)]
pub struct AppState {
    cfg: Arc<VerityConfig>,
    host: Arc<InProcessHost>,
    router: Arc<ComplianceRouter>,
    metrics: Arc<RouterMetrics>,
}

impl AppState {
    /// Build application state. Errors are returned, never panicked.
    pub fn new(cfg: VerityConfig) -> Result<Self> {
        // 1) Deploy reference modules
        let host = Arc::new(InProcessHost::new());
        for d in &cfg.deployments {
            let module = modules::build(d)?;
            host.deploy(d.address, module);
            tracing::debug!(address = %d.address, kind = ?d.kind, "module deployed");
        }

        // 2) Router
        let authority = cfg.router.authority;
        let router = Arc::new(
            ComplianceRouter::new(authority, host.clone())
                .with_write_timeout(cfg.router.write_timeout()),
        );

        // 3) Seed registrations
        for (category, reg) in cfg.registrations.iter() {
            if !host.is_deployed(&reg.address) {
                if cfg.router.strict_deployments {
                    return Err(VerityError::BadRequest(format!(
                        "registration {} has no deployment (router.strict_deployments)",
                        reg.address
                    )));
                }
                tracing::warn!(%category, address = %reg.address, "registration refers to an address with no deployment");
            }
            router
                .register(category, &authority, reg.address, reg.selector_for(category))
                .map_err(|e| {
                    VerityError::BadRequest(format!(
                        "seed registration failed ({category} {}): {e}",
                        reg.address
                    ))
                })?;
        }

        let state = Self {
            cfg: Arc::new(cfg),
            host,
            router,
            metrics: Arc::new(RouterMetrics::default()),
        };
        state.refresh_gauges();
        Ok(state)
    }

    pub fn cfg(&self) -> &VerityConfig {
        &self.cfg
    }

    pub fn host(&self) -> Arc<InProcessHost> {
        Arc::clone(&self.host)
    }

    pub fn router(&self) -> Arc<ComplianceRouter> {
        Arc::clone(&self.router)
    }

    pub fn metrics(&self) -> &RouterMetrics {
        &self.metrics
    }

    pub fn set_draining(&self) {
        self.metrics.set_draining();
    }

    pub fn is_draining(&self) -> bool {
        self.metrics.is_draining()
    }

    /// Sync the registered-module gauges with the registry.
    pub fn refresh_gauges(&self) {
        for category in Category::ALL {
            let n = i64::try_from(self.router.count(category)).unwrap_or(i64::MAX);
            self.metrics
                .registered_modules
                .set(&[("category", category.as_str())], n);
        }
    }

    pub fn check_general(&self, user: &Address) -> QueryReport {
        let started = Instant::now();
        let report = self.router.check_general(user);
        self.record_query(Category::General, &report, started);
        report
    }

    pub fn check_jurisdiction(&self, user: &Address, jurisdiction: &Jurisdiction) -> QueryReport {
        let started = Instant::now();
        let report = self.router.check_jurisdiction(user, jurisdiction);
        self.record_query(Category::JurisdictionAware, &report, started);
        report
    }

    fn record_query(&self, category: Category, report: &QueryReport, started: Instant) {
        let c = category.as_str();
        let result = if report.compliant {
            "compliant"
        } else {
            "not_compliant"
        };
        self.metrics.queries.inc(&[("category", c), ("result", result)]);
        for v in &report.verdicts {
            self.metrics
                .module_outcomes
                .inc(&[("category", c), ("outcome", v.outcome.label())]);
        }
        self.metrics
            .query_duration
            .observe(&[("category", c)], started.elapsed());
    }

    pub fn register(
        &self,
        category: Category,
        caller: &Address,
        identity: Address,
        selector: Selector,
    ) -> Result<()> {
        let op = match category {
            Category::General => "register_general",
            Category::JurisdictionAware => "register_jurisdiction",
        };
        let res = self.router.register(category, caller, identity, selector);
        self.record_mutation(op, &res);
        res
    }

    pub fn remove(&self, caller: &Address, identity: &Address) -> Result<Vec<Category>> {
        let res = self.router.remove(caller, identity);
        self.record_mutation("remove", &res);
        res
    }

    fn record_mutation<T>(&self, op: &str, res: &Result<T>) {
        let result = match res {
            Ok(_) => "ok",
            Err(e) => e.client_code().as_str(),
        };
        self.metrics.mutations.inc(&[("op", op), ("result", result)]);
        if res.is_ok() {
            self.refresh_gauges();
        }
    }
}
