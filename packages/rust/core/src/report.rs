//! Console rendering of stored orders.

use std::fmt::Write;

use ordertrack_shared::{OrderRecord, PARAGRAPH_SEPARATOR};

/// Width of the closing separator line.
const RULE_WIDTH: usize = 50;

/// Split stored content back into paragraphs.
pub fn split_paragraphs(content: &str) -> Vec<&str> {
    content.split(PARAGRAPH_SEPARATOR).collect()
}

/// Render the most recently ingested order: title, order date, and each
/// paragraph under a numbered heading.
pub fn render_most_recent(record: &OrderRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Most recent executive order ===");
    let _ = writeln!(out, "Title: {}", record.title);
    let _ = writeln!(out, "Date:  {}", record.order_date.format("%Y-%m-%d %H:%M:%S %:z"));
    let _ = writeln!(out, "Link:  {}", record.link);
    let _ = writeln!(out);
    let _ = writeln!(out, "Content:");

    for (i, paragraph) in split_paragraphs(&record.content).iter().enumerate() {
        let _ = writeln!(out);
        let _ = writeln!(out, "[Paragraph {}]", i + 1);
        let _ = writeln!(out, "{paragraph}");
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
    out
}

/// One line per order for listings: date, then title.
pub fn render_order_line(record: &OrderRecord) -> String {
    format!("{}  {}", record.order_date.format("%Y-%m-%d"), record.title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn record(content: &str) -> OrderRecord {
        OrderRecord {
            title: "Restoring Freedom of Speech".into(),
            link: "https://www.whitehouse.gov/presidential-actions/2025/01/speech/".into(),
            created_at: Utc::now(),
            order_date: DateTime::parse_from_rfc3339("2025-01-20T16:00:00Z").unwrap(),
            content: content.into(),
            source: "whitehouse.gov".into(),
        }
    }

    #[test]
    fn split_recovers_joined_paragraphs() {
        let joined = ["p1", "p2"].join(PARAGRAPH_SEPARATOR);
        assert_eq!(joined, "p1\n\np2");
        assert_eq!(split_paragraphs(&joined), vec!["p1", "p2"]);
    }

    #[test]
    fn render_numbers_paragraphs() {
        let out = render_most_recent(&record("Section 1.\n\nSection 2."));
        assert!(out.contains("Title: Restoring Freedom of Speech"));
        assert!(out.contains("Date:  2025-01-20 16:00:00 +00:00"));
        assert!(out.contains("[Paragraph 1]\nSection 1.\n"));
        assert!(out.contains("[Paragraph 2]\nSection 2.\n"));
        assert!(!out.contains("[Paragraph 3]"));
        assert!(out.trim_end().ends_with(&"=".repeat(RULE_WIDTH)));
    }

    #[test]
    fn render_empty_content() {
        let out = render_most_recent(&record(""));
        assert!(out.contains("[Paragraph 1]"));
        assert!(!out.contains("[Paragraph 2]"));
    }

    #[test]
    fn order_line_shows_date_and_title() {
        assert_eq!(
            render_order_line(&record("")),
            "2025-01-20  Restoring Freedom of Speech"
        );
    }
}
