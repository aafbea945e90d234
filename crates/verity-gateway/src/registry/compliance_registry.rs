use verity_core::error::{Result, VerityError};
use verity_core::event::{EventRecord, RouterEvent};
use verity_core::{Address, Category, ModuleEntry, Selector};

use super::module_set::ModuleSet;

/// Module bookkeeping for both categories plus the mutation journal.
///
/// Every mutating call is checked against the authority fixed at
/// construction and is all-or-nothing: a rejected call leaves the sets and
/// the journal untouched.
#[derive(Debug)]
pub struct ComplianceRegistry {
    authority: Address,
    general: ModuleSet,
    jurisdiction: ModuleSet,
    journal: Vec<EventRecord>,
}

impl ComplianceRegistry {
    pub fn new(authority: Address) -> Self {
        Self {
            authority,
            general: ModuleSet::new(),
            jurisdiction: ModuleSet::new(),
            journal: Vec::new(),
        }
    }

    pub fn authority(&self) -> Address {
        self.authority
    }

    pub fn modules(&self, category: Category) -> &ModuleSet {
        match category {
            Category::General => &self.general,
            Category::JurisdictionAware => &self.jurisdiction,
        }
    }

    fn modules_mut(&mut self, category: Category) -> &mut ModuleSet {
        match category {
            Category::General => &mut self.general,
            Category::JurisdictionAware => &mut self.jurisdiction,
        }
    }

    pub fn count(&self, category: Category) -> usize {
        self.modules(category).len()
    }

    /// `getGeneralComplianceContractCount()`
    pub fn general_count(&self) -> usize {
        self.general.len()
    }

    /// `getJurisdictionAwareContractCount()`
    pub fn jurisdiction_count(&self) -> usize {
        self.jurisdiction.len()
    }

    pub fn events(&self) -> &[EventRecord] {
        &self.journal
    }

    fn authorize(&self, caller: &Address) -> Result<()> {
        if *caller != self.authority {
            return Err(VerityError::Unauthorized(caller.to_string()));
        }
        Ok(())
    }

    fn emit(&mut self, event: RouterEvent) {
        let seq = self.journal.len() as u64 + 1;
        tracing::info!(seq, event = event.name(), identity = %event.identity(), "registry event");
        self.journal.push(EventRecord { seq, event });
    }

    /// Register `identity` at `selector` in `category`.
    pub fn register(
        &mut self,
        category: Category,
        caller: &Address,
        identity: Address,
        selector: Selector,
    ) -> Result<()> {
        self.authorize(caller)?;
        if identity.is_zero() {
            return Err(VerityError::InvalidIdentity);
        }
        if selector.is_zero() {
            return Err(VerityError::InvalidSelector);
        }
        if !self.modules_mut(category).insert(ModuleEntry { identity, selector }) {
            return Err(VerityError::AlreadyRegistered(identity.to_string()));
        }
        self.emit(RouterEvent::registered(category, identity, selector));
        Ok(())
    }

    /// `registerGeneralComplianceContract(identity, selector)`
    pub fn register_general(
        &mut self,
        caller: &Address,
        identity: Address,
        selector: Selector,
    ) -> Result<()> {
        self.register(Category::General, caller, identity, selector)
    }

    /// `registerJurisdictionComplianceContract(identity, selector)`
    pub fn register_jurisdiction(
        &mut self,
        caller: &Address,
        identity: Address,
        selector: Selector,
    ) -> Result<()> {
        self.register(Category::JurisdictionAware, caller, identity, selector)
    }

    /// `removeComplianceContract(identity)`: clear `identity` from every
    /// category holding it.
    ///
    /// Emits a single `ComplianceContractRemoved` even when both categories
    /// were cleared. Removing an identity present in neither category is
    /// rejected with `NotRegistered`.
    ///
    /// Returns the categories that were cleared.
    pub fn remove(&mut self, caller: &Address, identity: &Address) -> Result<Vec<Category>> {
        self.authorize(caller)?;

        let mut cleared = Vec::with_capacity(2);
        for category in Category::ALL {
            if self.modules_mut(category).remove(identity).is_some() {
                cleared.push(category);
            }
        }
        if cleared.is_empty() {
            return Err(VerityError::NotRegistered(identity.to_string()));
        }

        self.emit(RouterEvent::ComplianceContractRemoved {
            identity: *identity,
        });
        Ok(cleared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AUTHORITY: Address = Address::from_low_u8(0xA0);
    const MALLORY: Address = Address::from_low_u8(0xEE);

    fn module(n: u8) -> Address {
        Address::from_low_u8(n)
    }

    #[test]
    fn register_increments_count_and_journals() {
        let mut reg = ComplianceRegistry::new(AUTHORITY);
        reg.register_general(&AUTHORITY, module(1), Selector::IS_COMPLIANT)
            .expect("register");
        assert_eq!(reg.general_count(), 1);
        assert_eq!(reg.jurisdiction_count(), 0);
        assert_eq!(
            reg.events()[0].event,
            RouterEvent::GeneralComplianceContractRegistered {
                identity: module(1),
                selector: Selector::IS_COMPLIANT,
            }
        );
        assert_eq!(reg.events()[0].seq, 1);
    }

    #[test]
    fn duplicate_in_same_category_is_rejected() {
        let mut reg = ComplianceRegistry::new(AUTHORITY);
        reg.register_general(&AUTHORITY, module(1), Selector::IS_COMPLIANT)
            .expect("register");
        let err = reg
            .register_general(&AUTHORITY, module(1), Selector::new([9, 9, 9, 9]))
            .expect_err("duplicate");
        assert_eq!(err.client_code().as_str(), "ALREADY_REGISTERED");
        assert_eq!(reg.general_count(), 1);
        assert_eq!(reg.events().len(), 1);
        assert_eq!(
            reg.modules(Category::General).selector_of(&module(1)),
            Some(Selector::IS_COMPLIANT)
        );
    }

    #[test]
    fn categories_are_independent() {
        let mut reg = ComplianceRegistry::new(AUTHORITY);
        reg.register_general(&AUTHORITY, module(1), Selector::IS_COMPLIANT)
            .expect("general");
        reg.register_jurisdiction(&AUTHORITY, module(1), Selector::IS_COMPLIANT_IN_JURISDICTION)
            .expect("jurisdiction");
        assert_eq!(reg.general_count(), 1);
        assert_eq!(reg.jurisdiction_count(), 1);
    }

    #[test]
    fn null_identity_and_zero_selector_are_rejected() {
        let mut reg = ComplianceRegistry::new(AUTHORITY);
        let err = reg
            .register_general(&AUTHORITY, Address::ZERO, Selector::IS_COMPLIANT)
            .expect_err("null identity");
        assert_eq!(err.client_code().as_str(), "INVALID_IDENTITY");

        let err = reg
            .register_jurisdiction(&AUTHORITY, module(1), Selector::ZERO)
            .expect_err("zero selector");
        assert_eq!(err.client_code().as_str(), "INVALID_SELECTOR");
        assert!(reg.events().is_empty());
    }

    #[test]
    fn non_authority_cannot_mutate() {
        let mut reg = ComplianceRegistry::new(AUTHORITY);
        let err = reg
            .register_general(&MALLORY, module(1), Selector::IS_COMPLIANT)
            .expect_err("unauthorized");
        assert_eq!(err.client_code().as_str(), "UNAUTHORIZED");

        reg.register_general(&AUTHORITY, module(1), Selector::IS_COMPLIANT)
            .expect("register");
        let err = reg.remove(&MALLORY, &module(1)).expect_err("unauthorized");
        assert_eq!(err.client_code().as_str(), "UNAUTHORIZED");
        assert_eq!(reg.general_count(), 1);
        assert_eq!(reg.events().len(), 1);
    }

    #[test]
    fn unauthorized_wins_over_validation() {
        let mut reg = ComplianceRegistry::new(AUTHORITY);
        let err = reg
            .register_general(&MALLORY, Address::ZERO, Selector::ZERO)
            .expect_err("unauthorized");
        assert_eq!(err.client_code().as_str(), "UNAUTHORIZED");
    }

    #[test]
    fn remove_from_both_categories_emits_once() {
        let mut reg = ComplianceRegistry::new(AUTHORITY);
        reg.register_general(&AUTHORITY, module(1), Selector::IS_COMPLIANT)
            .expect("general");
        reg.register_jurisdiction(&AUTHORITY, module(1), Selector::IS_COMPLIANT_IN_JURISDICTION)
            .expect("jurisdiction");

        let cleared = reg.remove(&AUTHORITY, &module(1)).expect("remove");
        assert_eq!(cleared, vec![Category::General, Category::JurisdictionAware]);
        assert_eq!(reg.general_count(), 0);
        assert_eq!(reg.jurisdiction_count(), 0);

        let removals = reg
            .events()
            .iter()
            .filter(|r| matches!(r.event, RouterEvent::ComplianceContractRemoved { .. }))
            .count();
        assert_eq!(removals, 1);
        assert_eq!(reg.events().last().map(|r| r.seq), Some(3));
    }

    #[test]
    fn remove_absent_identity_is_rejected() {
        let mut reg = ComplianceRegistry::new(AUTHORITY);
        reg.register_general(&AUTHORITY, module(1), Selector::IS_COMPLIANT)
            .expect("register");
        let err = reg.remove(&AUTHORITY, &module(2)).expect_err("absent");
        assert_eq!(err.client_code().as_str(), "NOT_REGISTERED");
        assert_eq!(reg.general_count(), 1);
        assert_eq!(reg.events().len(), 1);
    }

    #[test]
    fn re_register_after_remove() {
        let mut reg = ComplianceRegistry::new(AUTHORITY);
        reg.register_general(&AUTHORITY, module(1), Selector::IS_COMPLIANT)
            .expect("register");
        reg.remove(&AUTHORITY, &module(1)).expect("remove");
        reg.register_general(&AUTHORITY, module(1), Selector::new([1, 1, 1, 1]))
            .expect("re-register");
        assert_eq!(
            reg.modules(Category::General).selector_of(&module(1)),
            Some(Selector::new([1, 1, 1, 1]))
        );
    }
}
