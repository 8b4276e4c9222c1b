//! In-memory `NumberStore`, used by the test suite and embeddable for dry runs.

use super::NumberStore;
use crate::core::error::{AppError, Result};
use crate::core::models::{PhoneRecord, Reachability, RejectedRecord};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashSet};

/// BTreeMaps keep key order deterministic, mirroring the natural read order the
/// probe phase relies on.
#[derive(Default)]
pub struct MemoryStore {
    valid: RwLock<BTreeMap<String, PhoneRecord>>,
    invalid: RwLock<BTreeMap<String, RejectedRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NumberStore for MemoryStore {
    fn ensure_indexes(&self) -> Result<()> {
        Ok(())
    }

    fn valid_keys(&self) -> Result<HashSet<String>> {
        Ok(self.valid.read().keys().cloned().collect())
    }

    fn invalid_keys(&self) -> Result<HashSet<String>> {
        Ok(self.invalid.read().keys().cloned().collect())
    }

    fn insert_valid(&self, records: &[PhoneRecord]) -> Result<usize> {
        let mut valid = self.valid.write();
        let mut inserted = 0;
        for record in records {
            if !valid.contains_key(&record.phone_number) {
                valid.insert(record.phone_number.clone(), record.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    fn insert_invalid(&self, records: &[RejectedRecord]) -> Result<usize> {
        let mut invalid = self.invalid.write();
        let mut inserted = 0;
        for record in records {
            if !invalid.contains_key(&record.phone_number) {
                invalid.insert(record.phone_number.clone(), record.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    fn count_valid(&self) -> Result<u64> {
        Ok(self.valid.read().len() as u64)
    }

    fn count_invalid(&self) -> Result<u64> {
        Ok(self.invalid.read().len() as u64)
    }

    fn valid_by_reachability(&self, reachability: Reachability) -> Result<Vec<PhoneRecord>> {
        Ok(self
            .valid
            .read()
            .values()
            .filter(|r| r.reachability == reachability)
            .cloned()
            .collect())
    }

    fn set_reachability(&self, phone_number: &str, reachability: Reachability) -> Result<()> {
        let mut valid = self.valid.write();
        match valid.get_mut(phone_number) {
            Some(record) => {
                record.reachability = reachability;
                Ok(())
            }
            None => Err(AppError::Persistence(format!(
                "No valid record for key {}",
                phone_number
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_skips_duplicates() {
        let store = MemoryStore::new();
        let record = PhoneRecord::new("33612345678", "France");
        assert_eq!(store.insert_valid(&[record.clone()]).unwrap(), 1);
        assert_eq!(store.insert_valid(&[record]).unwrap(), 0);
        assert_eq!(store.count_valid().unwrap(), 1);
    }

    #[test]
    fn test_reachability_update_and_selection() {
        let store = MemoryStore::new();
        store
            .insert_valid(&[
                PhoneRecord::new("33611111111", "France"),
                PhoneRecord::new("33622222222", "France"),
            ])
            .unwrap();

        store
            .set_reachability("33611111111", Reachability::Reachable)
            .unwrap();

        let unknown = store
            .valid_by_reachability(Reachability::Unknown)
            .unwrap();
        assert_eq!(unknown.len(), 1);
        assert_eq!(unknown[0].phone_number, "33622222222");

        assert!(store
            .set_reachability("unknown-key", Reachability::Reachable)
            .is_err());
    }
}
