use uuid::Uuid;

use crate::error::Result;
use crate::filter::{filter_by, sort_by, KolFilter, SortDirection};
use crate::models::{Kol, KolStatus};

/// KOL records owned by one view. Created when the view loads, mutated in place,
/// dropped (or taken back with [`KolStore::into_inner`]) when the view goes away.
#[derive(Debug, Clone, Default)]
pub struct KolStore {
    kols: Vec<Kol>,
}

impl KolStore {
    pub fn new(kols: Vec<Kol>) -> Self {
        Self { kols }
    }

    pub fn len(&self) -> usize {
        self.kols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kols.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&Kol> {
        self.kols.iter().find(|kol| kol.id == id)
    }

    pub fn query(
        &self,
        filter: &KolFilter,
        sort: Option<(&str, SortDirection)>,
    ) -> Result<Vec<&Kol>> {
        let filtered = filter_by(&self.kols, filter);
        match sort {
            Some((key, direction)) => sort_by(filtered, key, direction),
            None => Ok(filtered),
        }
    }

    /// Sets `status` on every listed KOL; returns how many records changed.
    pub fn batch_update_status(&mut self, ids: &[Uuid], status: KolStatus) -> usize {
        let mut updated = 0;
        for kol in self.kols.iter_mut().filter(|kol| ids.contains(&kol.id)) {
            if kol.status != status {
                kol.status = status;
                updated += 1;
            }
        }

        let missing = ids.iter().filter(|id| self.get(**id).is_none()).count();
        if missing > 0 {
            tracing::warn!(missing, "status update skipped unknown KOL ids");
        }
        tracing::debug!(updated, status = %status, "batch status update");
        updated
    }

    pub fn into_inner(self) -> Vec<Kol> {
        self.kols
    }
}
