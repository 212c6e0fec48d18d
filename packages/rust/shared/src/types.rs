//! Core domain types for ingested executive orders.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

/// Provenance tag written on every record unless configured otherwise.
pub const DEFAULT_SOURCE_TAG: &str = "whitehouse.gov";

/// Separator placed between paragraphs of an order's body text.
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

// ---------------------------------------------------------------------------
// OrderCandidate
// ---------------------------------------------------------------------------

/// One entry of the listing page, before its detail page is fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCandidate {
    /// Visible anchor text, trimmed.
    pub title: String,
    /// Address of the detail page.
    pub link: String,
}

// ---------------------------------------------------------------------------
// OrderRecord
// ---------------------------------------------------------------------------

/// A persisted executive order.
///
/// `title` is the deduplication key. Records are written once and never
/// updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    /// Order title as listed.
    pub title: String,
    /// Absolute address of the detail page.
    pub link: String,
    /// When this record was ingested.
    pub created_at: DateTime<Utc>,
    /// When the order was issued (falls back to ingestion time).
    pub order_date: DateTime<FixedOffset>,
    /// Body paragraphs joined by [`PARAGRAPH_SEPARATOR`]; possibly empty.
    pub content: String,
    /// Origin site tag.
    pub source: String,
}
