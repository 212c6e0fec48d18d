//! Listing page extraction.

use ordertrack_shared::OrderCandidate;
use scraper::Html;
use tracing::debug;
use url::Url;

use crate::PageSelectors;

/// Extract order candidates from listing HTML, in document order.
///
/// Each post-title heading contributes its first anchor: the trimmed text
/// becomes the title and the `href` the link. Relative links are resolved
/// against `base_url`; absolute links are kept as written. Headings without
/// a usable anchor are skipped.
pub fn parse_listing(html: &str, base_url: &Url, selectors: &PageSelectors) -> Vec<OrderCandidate> {
    let doc = Html::parse_document(html);
    let mut candidates = Vec::new();

    for heading in doc.select(&selectors.title) {
        let Some(anchor) = heading.select(&selectors.anchor).next() else {
            debug!("post-title heading without anchor, skipping");
            continue;
        };

        let title = anchor.text().collect::<String>().trim().to_string();
        if title.is_empty() {
            debug!("post-title anchor with empty text, skipping");
            continue;
        }

        let Some(href) = anchor.value().attr("href") else {
            debug!(%title, "post-title anchor without href, skipping");
            continue;
        };

        candidates.push(OrderCandidate {
            title,
            link: resolve_link(base_url, href.trim()),
        });
    }

    candidates
}

fn resolve_link(base_url: &Url, href: &str) -> String {
    if Url::parse(href).is_ok() {
        return href.to_string();
    }
    base_url
        .join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ordertrack_shared::SourceConfig;

    fn selectors() -> PageSelectors {
        PageSelectors::from_config(&SourceConfig::default()).unwrap()
    }

    fn base() -> Url {
        Url::parse("https://www.whitehouse.gov/presidential-actions").unwrap()
    }

    fn load_fixture(name: &str) -> String {
        let path = format!("../../../fixtures/html/{name}");
        std::fs::read_to_string(&path).unwrap_or_else(|_| panic!("missing fixture: {path}"))
    }

    #[test]
    fn fixture_listing_in_document_order() {
        let html = load_fixture("listing.html");
        let candidates = parse_listing(&html, &base(), &selectors());

        let titles: Vec<_> = candidates.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Restoring Accountability for Career Senior Executives",
                "Ending Radical and Wasteful Government DEI Programs",
                "Protecting the Meaning and Value of American Citizenship",
            ]
        );
        assert_eq!(
            candidates[0].link,
            "https://www.whitehouse.gov/presidential-actions/2025/01/restoring-accountability-for-career-senior-executives/"
        );
    }

    #[test]
    fn fixture_skips_headings_without_anchor() {
        let html = load_fixture("listing.html");
        let candidates = parse_listing(&html, &base(), &selectors());
        assert!(candidates.iter().all(|c| !c.title.contains("Briefing")));
    }

    #[test]
    fn relative_link_resolved_against_base() {
        let html = r#"<h2 class="wp-block-post-title"><a href="/presidential-actions/2025/02/x/">X</a></h2>"#;
        let candidates = parse_listing(html, &base(), &selectors());
        assert_eq!(
            candidates[0].link,
            "https://www.whitehouse.gov/presidential-actions/2025/02/x/"
        );
    }

    #[test]
    fn other_headings_ignored() {
        let html = r#"
            <h2 class="section-title"><a href="/a">Not an order</a></h2>
            <h3 class="wp-block-post-title"><a href="/b">Wrong level</a></h3>
            <h2 class="wp-block-post-title"><a href="/c">  Order C  </a></h2>
        "#;
        let candidates = parse_listing(html, &base(), &selectors());
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "Order C");
    }

    #[test]
    fn empty_page_yields_nothing() {
        let candidates = parse_listing("<html><body></body></html>", &base(), &selectors());
        assert!(candidates.is_empty());
    }
}
