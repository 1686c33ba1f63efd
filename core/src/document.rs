use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Review state of a document.
///
/// Serialized as the lower-case words offered by the upload form, so an
/// existing `index.json` stays readable. `under_review` is accepted as an
/// alternative spelling of `under review`, and an empty string reads as
/// [`DocumentStatus::Draft`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum DocumentStatus {
    #[default]
    #[serde(rename = "draft")]
    Draft,
    #[serde(rename = "under review")]
    UnderReview,
    #[serde(rename = "approved")]
    Approved,
    #[serde(rename = "final")]
    Final,
    #[serde(rename = "archived")]
    Archived,
}

impl DocumentStatus {
    pub const ALL: [DocumentStatus; 5] = [
        DocumentStatus::Draft,
        DocumentStatus::UnderReview,
        DocumentStatus::Approved,
        DocumentStatus::Final,
        DocumentStatus::Archived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Draft => "draft",
            DocumentStatus::UnderReview => "under review",
            DocumentStatus::Approved => "approved",
            DocumentStatus::Final => "final",
            DocumentStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown document status '{0}' (expected one of: draft, under review, approved, final, archived)")]
pub struct ParseStatusError(pub String);

impl FromStr for DocumentStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            "" | "draft" => Ok(DocumentStatus::Draft),
            "under review" => Ok(DocumentStatus::UnderReview),
            "approved" => Ok(DocumentStatus::Approved),
            "final" => Ok(DocumentStatus::Final),
            "archived" => Ok(DocumentStatus::Archived),
            _ => Err(ParseStatusError(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for DocumentStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One entry of the document index.
///
/// The title is the natural key; `id` always mirrors it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub status: DocumentStatus,
    #[serde(default)]
    pub meta: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl DocumentRecord {
    /// Creates a record whose creation and update timestamps are both `now`.
    pub fn new(title: impl Into<String>, now: DateTime<Utc>) -> Self {
        let title = title.into();
        DocumentRecord {
            id: title.clone(),
            title,
            category: String::new(),
            status: DocumentStatus::default(),
            meta: String::new(),
            filename: String::new(),
            url: None,
            created_at: now,
            last_updated: now,
        }
    }

    pub fn with_status(mut self, status: DocumentStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_meta(mut self, meta: impl Into<String>) -> Self {
        self.meta = meta.into();
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_both_spellings() {
        assert_eq!("under review".parse(), Ok(DocumentStatus::UnderReview));
        assert_eq!("Under_Review".parse(), Ok(DocumentStatus::UnderReview));
        assert_eq!("".parse(), Ok(DocumentStatus::Draft));
        assert!("published".parse::<DocumentStatus>().is_err());
    }

    #[test]
    fn record_reads_index_written_by_browser_form() {
        let json = r#"{
            "meta": "quarterly numbers",
            "category": "finance",
            "title": "Report v1",
            "status": "under review",
            "filename": "report.pdf",
            "createdAt": "2024-03-01T10:00:00.000Z",
            "lastUpdated": "2024-03-02T11:30:00.000Z",
            "id": "Report v1",
            "url": "https://raw.githubusercontent.com/o/r/main/docs/Report%20v1"
        }"#;

        let record: DocumentRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.title, "Report v1");
        assert_eq!(record.id, record.title);
        assert_eq!(record.status, DocumentStatus::UnderReview);
        assert_eq!(record.created_at.to_rfc3339(), "2024-03-01T10:00:00+00:00");
        assert!(record.url.is_some());
    }

    #[test]
    fn record_serializes_camel_case_keys() {
        let now = Utc::now();
        let record = DocumentRecord::new("A", now).with_status(DocumentStatus::Final);
        let value = serde_json::to_value(&record).unwrap();

        assert!(value.get("createdAt").is_some());
        assert!(value.get("lastUpdated").is_some());
        assert_eq!(value["status"], "final");
        // Not uploaded yet
        assert!(value.get("url").is_none());
    }
}
