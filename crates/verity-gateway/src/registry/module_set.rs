use std::collections::HashMap;

use verity_core::{Address, ModuleEntry, Selector};

/// One category's modules: dense entry array + identity -> slot index.
///
/// Removal swaps the victim with the last slot and truncates, so iteration
/// order is insertion order only until the first removal. Callers must not
/// rely on a stable order across removals.
#[derive(Debug, Default, Clone)]
pub struct ModuleSet {
    entries: Vec<ModuleEntry>,
    index: HashMap<Address, usize>,
}

impl ModuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, identity: &Address) -> bool {
        self.index.contains_key(identity)
    }

    /// Selector registered for `identity`, if any.
    pub fn selector_of(&self, identity: &Address) -> Option<Selector> {
        self.index
            .get(identity)
            .and_then(|&i| self.entries.get(i))
            .map(|e| e.selector)
    }

    /// Entries in current storage order.
    pub fn entries(&self) -> &[ModuleEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModuleEntry> {
        self.entries.iter()
    }

    /// Append an entry. Returns `false` (and changes nothing) if the
    /// identity is already present.
    pub fn insert(&mut self, entry: ModuleEntry) -> bool {
        if self.index.contains_key(&entry.identity) {
            return false;
        }
        self.index.insert(entry.identity, self.entries.len());
        self.entries.push(entry);
        true
    }

    /// Swap-remove `identity`. Returns the removed entry if it was present.
    pub fn remove(&mut self, identity: &Address) -> Option<ModuleEntry> {
        let slot = self.index.remove(identity)?;
        let removed = self.entries.swap_remove(slot);
        // the former last entry now lives in `slot`
        if let Some(moved) = self.entries.get(slot) {
            self.index.insert(moved.identity, slot);
        }
        Some(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(n: u8) -> ModuleEntry {
        ModuleEntry {
            identity: Address::from_low_u8(n),
            selector: Selector::IS_COMPLIANT,
        }
    }

    fn identities(set: &ModuleSet) -> Vec<u8> {
        set.iter().map(|e| e.identity.as_bytes()[19]).collect()
    }

    #[test]
    fn insert_is_set_unique() {
        let mut set = ModuleSet::new();
        assert!(set.insert(entry(1)));
        assert!(!set.insert(ModuleEntry {
            identity: Address::from_low_u8(1),
            selector: Selector::new([1, 2, 3, 4]),
        }));
        assert_eq!(set.len(), 1);
        assert_eq!(set.selector_of(&Address::from_low_u8(1)), Some(Selector::IS_COMPLIANT));
    }

    #[test]
    fn remove_swaps_last_into_hole() {
        let mut set = ModuleSet::new();
        for n in 1..=4 {
            set.insert(entry(n));
        }
        let removed = set.remove(&Address::from_low_u8(2)).expect("present");
        assert_eq!(removed.identity, Address::from_low_u8(2));
        assert_eq!(identities(&set), vec![1, 4, 3]);

        // moved entry is still addressable through the index
        assert!(set.remove(&Address::from_low_u8(4)).is_some());
        assert_eq!(identities(&set), vec![1, 3]);
        assert!(!set.contains(&Address::from_low_u8(4)));
    }

    #[test]
    fn remove_last_and_only() {
        let mut set = ModuleSet::new();
        set.insert(entry(1));
        set.insert(entry(2));
        assert!(set.remove(&Address::from_low_u8(2)).is_some());
        assert_eq!(identities(&set), vec![1]);
        assert!(set.remove(&Address::from_low_u8(1)).is_some());
        assert!(set.is_empty());
        assert!(set.remove(&Address::from_low_u8(1)).is_none());
    }

    #[test]
    fn index_stays_consistent_under_churn() {
        let mut set = ModuleSet::new();
        for n in 1..=20 {
            set.insert(entry(n));
        }
        for n in (1..=20).step_by(3) {
            assert!(set.remove(&Address::from_low_u8(n)).is_some());
        }
        for (slot, e) in set.entries().iter().enumerate() {
            assert_eq!(set.index.get(&e.identity), Some(&slot));
        }
        assert_eq!(set.index.len(), set.len());
    }
}
