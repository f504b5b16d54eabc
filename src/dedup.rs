//! Run-scoped deduplication accumulator.
//!
//! A [`Deduplicator`] is created once per run, fed every record in arrival
//! order, and consumed at the end. Records are admitted on first sight of
//! their id; later duplicates are dropped as-is, never merged.

use std::collections::HashSet;

use crate::models::CatalogRecord;

/// Why a record was or wasn't admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Accepted,
    BlankTitle,
    Duplicate,
}

/// Counts of what happened to the records offered in one batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionStats {
    pub accepted: usize,
    pub blank_title: usize,
    pub duplicate: usize,
}

#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<String>,
    records: Vec<CatalogRecord>,
    totals: AdmissionStats,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit `record` unless its title is blank or its id was already seen.
    pub fn offer(&mut self, record: CatalogRecord) -> Admission {
        let admission = if !record.has_title() {
            Admission::BlankTitle
        } else if self.seen.contains(&record.id) {
            Admission::Duplicate
        } else {
            self.seen.insert(record.id.clone());
            self.records.push(record);
            Admission::Accepted
        };

        match admission {
            Admission::Accepted => self.totals.accepted += 1,
            Admission::BlankTitle => self.totals.blank_title += 1,
            Admission::Duplicate => self.totals.duplicate += 1,
        }
        admission
    }

    /// Offer every record of `batch` in order.
    pub fn extend<I>(&mut self, batch: I) -> AdmissionStats
    where
        I: IntoIterator<Item = CatalogRecord>,
    {
        let mut stats = AdmissionStats::default();
        for record in batch {
            match self.offer(record) {
                Admission::Accepted => stats.accepted += 1,
                Admission::BlankTitle => stats.blank_title += 1,
                Admission::Duplicate => stats.duplicate += 1,
            }
        }
        stats
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn totals(&self) -> AdmissionStats {
        self.totals
    }

    /// The admitted records, in arrival order.
    pub fn into_records(self) -> Vec<CatalogRecord> {
        self.records
    }
}
