use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::{DocumentRecord, DocumentStatus};

/// File name of the index blob inside the base path.
pub const INDEX_FILE_NAME: &str = "index.json";

/// Ordered list of document records, persisted as a single JSON array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentIndex {
    records: Vec<DocumentRecord>,
}

/// Result of merging a record into the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// The title was new; the record was appended at this position.
    Inserted(usize),
    /// A record with the same title was replaced at this position.
    Replaced(usize),
}

impl UpsertOutcome {
    pub fn position(&self) -> usize {
        match *self {
            UpsertOutcome::Inserted(pos) | UpsertOutcome::Replaced(pos) => pos,
        }
    }
}

impl DocumentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<DocumentRecord>) -> Self {
        DocumentIndex { records }
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Serializes the index with two-space indentation.
    pub fn to_json_pretty(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }

    pub fn records(&self) -> &[DocumentRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<DocumentRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn position(&self, title: &str) -> Option<usize> {
        self.records.iter().position(|doc| doc.title == title)
    }

    pub fn get(&self, title: &str) -> Option<&DocumentRecord> {
        self.records.iter().find(|doc| doc.title == title)
    }

    /// Inserts `record`, or replaces the record with the same title in place.
    ///
    /// On replacement the stored `created_at` wins over the incoming one.
    /// In both cases `last_updated` is set to `now`.
    pub fn upsert(&mut self, mut record: DocumentRecord, now: DateTime<Utc>) -> UpsertOutcome {
        record.last_updated = now;
        match self.position(&record.title) {
            Some(pos) => {
                record.created_at = self.records[pos].created_at;
                self.records[pos] = record;
                UpsertOutcome::Replaced(pos)
            }
            None => {
                self.records.push(record);
                UpsertOutcome::Inserted(self.records.len() - 1)
            }
        }
    }

    /// Distinct non-empty categories, in the order they first appear.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for doc in &self.records {
            let category = doc.category.trim();
            if !category.is_empty() && !seen.contains(&category) {
                seen.push(category);
            }
        }
        seen
    }

    pub fn filter<'a>(
        &'a self,
        status: Option<DocumentStatus>,
        category: Option<&'a str>,
    ) -> impl Iterator<Item = &'a DocumentRecord> + 'a {
        self.records.iter()
            .filter(move |doc| status.is_none_or(|s| doc.status == s))
            .filter(move |doc| category.is_none_or(|c| doc.category.eq_ignore_ascii_case(c)))
    }
}

impl IntoIterator for DocumentIndex {
    type Item = DocumentRecord;
    type IntoIter = std::vec::IntoIter<DocumentRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}
