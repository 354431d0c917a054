//! Append-only, session-scoped record store.

use std::time::SystemTime;

use crate::{Shortcode, UrlRecord};

/// Ordered sequence of accepted records. Insertion order is submission order,
/// then row order. Records are never reordered or removed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordStore {
    records: Vec<UrlRecord>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a batch of accepted records, preserving their order.
    pub fn append<I: IntoIterator<Item = UrlRecord>>(&mut self, records: I) {
        self.records.extend(records);
    }

    /// Consuming form of [`RecordStore::append`].
    pub fn with_appended<I: IntoIterator<Item = UrlRecord>>(mut self, records: I) -> Self {
        self.append(records);
        self
    }

    pub fn records(&self) -> &[UrlRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, UrlRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First record carrying the given shortcode. Shortcodes may repeat.
    pub fn find(&self, shortcode: &str) -> Option<&UrlRecord> {
        self.records.iter().find(|r| r.shortcode.as_str() == shortcode)
    }

    pub fn contains_shortcode(&self, shortcode: &Shortcode) -> bool {
        self.records.iter().any(|r| &r.shortcode == shortcode)
    }

    /// Records whose expiry lies after `now`. Expired records stay stored.
    pub fn active(&self, now: SystemTime) -> impl Iterator<Item = &UrlRecord> {
        self.records.iter().filter(move |r| !r.is_expired(now))
    }
}

impl<'a> IntoIterator for &'a RecordStore {
    type Item = &'a UrlRecord;
    type IntoIter = std::slice::Iter<'a, UrlRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
