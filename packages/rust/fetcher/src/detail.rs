//! Detail page extraction: issuance date and body text.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use ordertrack_shared::PARAGRAPH_SEPARATOR;
use scraper::Html;
use tracing::debug;

use crate::PageSelectors;

/// Fields extracted from a detail page that was fetched successfully.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailPage {
    /// Machine-readable timestamp of the first time marker, if it parsed.
    pub published: Option<DateTime<FixedOffset>>,
    /// Non-empty paragraphs of the content container, joined by a blank line.
    pub content: String,
}

/// Result of fetching a detail page.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailOutcome {
    /// The page was fetched and parsed.
    Extracted(DetailPage),
    /// The page could not be fetched; record fields fall back to defaults.
    Degraded { reason: String },
}

impl DetailOutcome {
    /// Whether this outcome is the fallback.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    /// Collapse into `(order_date, content)`, substituting `now` for a
    /// missing date and `""` for missing content.
    pub fn resolve(self, now: DateTime<Utc>) -> (DateTime<FixedOffset>, String) {
        match self {
            Self::Extracted(page) => (
                page.published.unwrap_or_else(|| now.fixed_offset()),
                page.content,
            ),
            Self::Degraded { .. } => (now.fixed_offset(), String::new()),
        }
    }
}

/// Extract the issuance date and body text from detail HTML.
pub fn parse_detail(html: &str, selectors: &PageSelectors) -> DetailPage {
    let doc = Html::parse_document(html);

    let published = doc
        .select(&selectors.time)
        .next()
        .and_then(|el| el.value().attr("datetime"))
        .and_then(|raw| {
            let parsed = parse_timestamp(raw);
            if parsed.is_none() {
                debug!(raw, "unparsable datetime attribute");
            }
            parsed
        });

    let content = doc
        .select(&selectors.content)
        .next()
        .map(|container| {
            container
                .select(&selectors.paragraph)
                .map(|p| p.text().collect::<String>().trim().to_string())
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
                .join(PARAGRAPH_SEPARATOR)
        })
        .unwrap_or_default();

    DetailPage { published, content }
}

/// Parse an ISO-8601 timestamp as found in `datetime` attributes.
///
/// A trailing `Z` is rewritten to `+00:00` first. Values without an offset
/// are taken as UTC; a bare date means midnight UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    let normalized = match raw.strip_suffix('Z').or_else(|| raw.strip_suffix('z')) {
        Some(head) => format!("{head}+00:00"),
        None => raw.to_string(),
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalized) {
        return Some(dt);
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M%:z", "%Y-%m-%dT%H:%M:%S%.f%z"] {
        if let Ok(dt) = DateTime::parse_from_str(&normalized, fmt) {
            return Some(dt);
        }
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&normalized, fmt) {
            return Some(naive.and_utc().fixed_offset());
        }
    }

    NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};
    use ordertrack_shared::SourceConfig;

    fn selectors() -> PageSelectors {
        PageSelectors::from_config(&SourceConfig::default()).unwrap()
    }

    fn load_fixture(name: &str) -> String {
        let path = format!("../../../fixtures/html/{name}");
        std::fs::read_to_string(&path).unwrap_or_else(|_| panic!("missing fixture: {path}"))
    }

    #[test]
    fn z_suffix_normalized_to_utc_offset() {
        let dt = parse_timestamp("2025-01-20T16:00:00Z").unwrap();
        assert_eq!(dt.offset().local_minus_utc(), 0);
        assert_eq!(
            dt.with_timezone(&Utc),
            Utc.with_ymd_and_hms(2025, 1, 20, 16, 0, 0).unwrap()
        );
    }

    #[test]
    fn explicit_offset_is_preserved() {
        let dt = parse_timestamp("2025-01-20T11:00:00-05:00").unwrap();
        assert_eq!(dt.offset().local_minus_utc(), -5 * 3600);
        assert_eq!(
            dt.with_timezone(&Utc),
            Utc.with_ymd_and_hms(2025, 1, 20, 16, 0, 0).unwrap()
        );
    }

    #[test]
    fn fractional_seconds_accepted() {
        let dt = parse_timestamp("2025-01-20T16:00:00.250Z").unwrap();
        assert_eq!(dt.nanosecond(), 250_000_000);
    }

    #[test]
    fn naive_and_date_only_forms_taken_as_utc() {
        let naive = parse_timestamp("2025-01-20T16:00:00").unwrap();
        assert_eq!(naive.offset().local_minus_utc(), 0);
        assert_eq!(naive.hour(), 16);

        let date = parse_timestamp("2025-01-20").unwrap();
        assert_eq!(
            date.with_timezone(&Utc),
            Utc.with_ymd_and_hms(2025, 1, 20, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn garbage_timestamp_is_none() {
        assert!(parse_timestamp("January 20, 2025").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn fixture_detail_extracts_fields() {
        let page = parse_detail(&load_fixture("detail.html"), &selectors());
        assert_eq!(
            page.published.unwrap(),
            DateTime::parse_from_rfc3339("2025-01-20T16:00:00+00:00").unwrap()
        );
        let paragraphs: Vec<_> = page.content.split(PARAGRAPH_SEPARATOR).collect();
        assert_eq!(paragraphs.len(), 3);
        assert!(paragraphs[0].starts_with("By the authority vested in me"));
        assert!(!page.content.contains("Subscribe"));
    }

    #[test]
    fn paragraph_join_round_trip() {
        let html = "<main><p>p1</p><p>p2</p></main>";
        let page = parse_detail(html, &selectors());
        assert_eq!(page.content, "p1\n\np2");
        let split: Vec<_> = page.content.split(PARAGRAPH_SEPARATOR).collect();
        assert_eq!(split, vec!["p1", "p2"]);
    }

    #[test]
    fn missing_container_yields_empty_content() {
        let html = r#"<html><body><article><p>Orphan</p></article></body></html>"#;
        let page = parse_detail(html, &selectors());
        assert_eq!(page.content, "");
        assert!(page.published.is_none());
    }

    #[test]
    fn only_first_time_marker_is_used() {
        let html = r#"<main>
            <time>no attribute</time>
            <time datetime="2024-12-31T00:00:00Z">later marker</time>
        </main>"#;
        let page = parse_detail(html, &selectors());
        assert!(page.published.is_none());
    }

    #[test]
    fn extracted_without_date_falls_back_to_now() {
        let now = Utc::now();
        let outcome = DetailOutcome::Extracted(DetailPage {
            published: None,
            content: "Body".into(),
        });
        assert!(!outcome.is_degraded());
        let (date, content) = outcome.resolve(now);
        assert_eq!(date, now.fixed_offset());
        assert_eq!(content, "Body");
    }
}
