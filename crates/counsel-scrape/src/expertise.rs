use std::sync::LazyLock;
use std::time::Duration;

use anyhow::Result;
use regex::Regex;
use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;
use scraper::{ElementRef, Html, Selector};
use tracing::{info, warn};

use crate::delay;
use crate::records::{ExpertiseRow, Listing, NAME_NOT_FOUND};

/// EB-1 terminology as it appears on profile pages, in rough order of
/// specificity. "first preference" is the statutory name for the category.
static EB1_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    let parts = [
        r"EB-?1[ABC]?",
        r"extraordinary ability",
        r"outstanding professor",
        r"outstanding researcher",
        r"multinational manager",
        r"multinational executive",
        r"first preference",
        r"employment.{0,20}first.{0,20}preference",
    ];
    Regex::new(&format!("(?i){}", parts.join("|"))).expect("eb1 pattern")
});

/// Snippet-level keywords for the cheap pre-filter.
const SNIPPET_KEYWORDS: &[&str] = &["eb-1", "eb1", "extraordinary", "multinational"];

const PROFILE_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// What a profile-page check found.
#[derive(Debug, Clone, Default)]
pub struct ExpertiseReport {
    pub matched: bool,
    pub mentions: Vec<String>,
    pub mention_count: usize,
    /// Set when the profile could not be checked at all.
    pub detail: Option<String>,
}

impl ExpertiseReport {
    fn unavailable(detail: impl Into<String>) -> Self {
        Self {
            detail: Some(detail.into()),
            ..Self::default()
        }
    }
}

/// Greps lawyer profile pages for EB-1 terminology.
pub struct ExpertiseChecker {
    http: Client,
}

impl Default for ExpertiseChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpertiseChecker {
    pub fn new() -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");
        Self { http }
    }

    /// Fetch one profile page and scan it for EB-1 mentions.
    /// Any failure comes back as an unmatched report, never an error.
    pub fn check_profile(&self, profile_url: &str) -> ExpertiseReport {
        let resp = match self
            .http
            .get(profile_url)
            .header(USER_AGENT, PROFILE_USER_AGENT)
            .send()
        {
            Ok(r) => r,
            Err(e) => {
                warn!(url = %profile_url, "profile fetch failed: {e}");
                return ExpertiseReport::unavailable(format!("Error checking profile: {e}"));
            }
        };

        if !resp.status().is_success() {
            return ExpertiseReport::unavailable("Could not access profile");
        }

        let html = match resp.text() {
            Ok(t) => t,
            Err(e) => {
                warn!(url = %profile_url, "profile body unreadable: {e}");
                return ExpertiseReport::unavailable(format!("Error checking profile: {e}"));
            }
        };

        scan_profile(&html)
    }

    /// Walk the scraped listings, check each profile, and keep the lawyers
    /// whose pages mention EB-1 work. Paced at one second per profile;
    /// stops once `max_matches` lawyers have been found.
    pub fn filter_listings(&self, rows: &[Listing], max_matches: usize) -> Vec<ExpertiseRow> {
        let mut matches = Vec::new();

        for (idx, row) in rows.iter().enumerate() {
            if row.name == NAME_NOT_FOUND || !row.profile_link.starts_with("http") {
                continue;
            }

            info!(
                "checking {}/{}: {}",
                idx + 1,
                rows.len(),
                row.name
            );

            let report = self.check_profile(&row.profile_link);
            if report.matched {
                info!(
                    name = %row.name,
                    mentions = report.mention_count,
                    "found EB-1 expertise"
                );
                matches.push(expertise_row(row, &report));
            }

            if matches.len() >= max_matches {
                info!(count = matches.len(), "reached match limit, stopping search");
                break;
            }

            delay::profile_delay();
        }

        matches
    }
}

/// Snippet-only keyword scan; faster but less accurate than a full
/// profile check. No network.
pub fn quick_filter(rows: &[Listing]) -> Vec<Listing> {
    rows.iter()
        .filter(|row| {
            let snippet = row.snippet.to_lowercase();
            SNIPPET_KEYWORDS.iter().any(|k| snippet.contains(k))
        })
        .cloned()
        .collect()
}

// ── Page scanning ────────────────────────────────────────────────────────

fn sel(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

fn class_contains(el: &ElementRef, needles: &[&str]) -> bool {
    el.value()
        .attr("class")
        .map(|c| {
            let c = c.to_lowercase();
            needles.iter().any(|n| c.contains(n))
        })
        .unwrap_or(false)
}

fn text_of(el: ElementRef) -> String {
    el.text().collect::<String>()
}

/// First `n` characters of `s`, respecting char boundaries.
fn prefix(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn clamp_boundary(s: &str, mut idx: usize) -> usize {
    idx = idx.min(s.len());
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

/// Scan decoded profile HTML for EB-1 mentions across practice-area
/// containers, bio containers, and raw text nodes.
pub fn scan_profile(html: &str) -> ExpertiseReport {
    let document = Html::parse_document(html);
    let mut mentions = Vec::new();

    // Practice areas
    for el in document.select(&sel("div, section")) {
        if !class_contains(&el, &["practice"]) {
            continue;
        }
        let text = text_of(el);
        if EB1_PATTERN.is_match(&text) {
            mentions.push(format!("Practice area: {}...", prefix(text.trim(), 200)));
        }
    }

    // Biography / about sections: keep a little context around each match
    for el in document.select(&sel("div, section")) {
        if !class_contains(&el, &["bio", "about", "description"]) {
            continue;
        }
        let text = text_of(el);
        for m in EB1_PATTERN.find_iter(&text).take(3) {
            let start = clamp_boundary(&text, m.start().saturating_sub(50));
            let end = clamp_boundary(&text, m.end() + 50);
            mentions.push(format!("Bio mention: ...{}...", text[start..end].trim()));
        }
    }

    // Raw matching text nodes, substantial ones only
    let mut node_hits = 0;
    for text in document.root_element().text() {
        if node_hits >= 5 {
            break;
        }
        let trimmed = text.trim();
        if trimmed.len() > 20 && EB1_PATTERN.is_match(trimmed) {
            mentions.push(format!("Visa expertise: {}...", prefix(trimmed, 100)));
            node_hits += 1;
        }
    }

    ExpertiseReport {
        matched: !mentions.is_empty(),
        mention_count: mentions.len(),
        mentions,
        detail: None,
    }
}

fn expertise_row(row: &Listing, report: &ExpertiseReport) -> ExpertiseRow {
    let details = report
        .mentions
        .iter()
        .take(3)
        .cloned()
        .collect::<Vec<_>>()
        .join("; ");
    ExpertiseRow {
        name: row.name.clone(),
        profile_link: row.profile_link.clone(),
        location: row.location.clone(),
        rating: row.rating.clone(),
        expertise: "Yes".to_string(),
        mention_count: report.mention_count,
        details: prefix(&details, 200).to_string(),
    }
}

/// Convenience for the binary: read listings, filter, write matches.
pub fn run_filter(
    checker: &ExpertiseChecker,
    rows: &[Listing],
    max_matches: usize,
    output_csv: &str,
) -> Result<usize> {
    let matches = checker.filter_listings(rows, max_matches);
    if matches.is_empty() {
        warn!("no lawyers with EB-1 expertise found in the current list");
        return Ok(0);
    }
    crate::records::write_expertise(output_csv, &matches)?;
    Ok(matches.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_matches_category_spellings() {
        for text in [
            "EB-1 petitions",
            "EB1 visas",
            "eb-1a cases",
            "extraordinary ability petitions",
            "outstanding researcher category",
            "multinational executive transfers",
            "employment-based first preference",
        ] {
            assert!(EB1_PATTERN.is_match(text), "should match: {text}");
        }
    }

    #[test]
    fn pattern_ignores_unrelated_practice_text() {
        for text in [
            "family-based green cards",
            "H-1B specialty occupation",
            "naturalization and citizenship",
        ] {
            assert!(!EB1_PATTERN.is_match(text), "should not match: {text}");
        }
    }

    #[test]
    fn scan_collects_practice_and_bio_mentions() {
        let html = r#"
        <html><body>
          <section class="practice-areas">
            Immigration: EB-1 extraordinary ability, National Interest Waivers
          </section>
          <div class="attorney-bio">
            Over fifteen years handling EB-1A petitions for scientists and
            founders, with a focus on extraordinary ability evidence.
          </div>
        </body></html>"#;

        let report = scan_profile(html);
        assert!(report.matched);
        assert!(report.mention_count >= 2);
        assert!(report.mentions.iter().any(|m| m.starts_with("Practice area:")));
        assert!(report.mentions.iter().any(|m| m.starts_with("Bio mention:")));
    }

    #[test]
    fn scan_without_eb1_terms_is_unmatched() {
        let html = r#"
        <html><body>
          <section class="practice-areas">Family law, divorce, custody</section>
          <div class="attorney-bio">Twenty years of family court experience.</div>
        </body></html>"#;

        let report = scan_profile(html);
        assert!(!report.matched);
        assert_eq!(report.mention_count, 0);
    }

    #[test]
    fn quick_filter_scans_snippets_only() {
        let rows = vec![
            Listing {
                name: "Jane Smith".into(),
                profile_link: "https://example.com/a".into(),
                location: "NY".into(),
                rating: "9.5".into(),
                snippet: "EB-1 and extraordinary ability petitions".into(),
            },
            Listing {
                name: "Bob Jones".into(),
                profile_link: "https://example.com/b".into(),
                location: "NY".into(),
                rating: "8.0".into(),
                snippet: "Family immigration and citizenship".into(),
            },
        ];

        let hits = quick_filter(&rows);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Jane Smith");
    }

    #[test]
    fn prefix_respects_multibyte_boundaries() {
        let s = "représentation légale";
        assert_eq!(prefix(s, 5), "repré");
        assert_eq!(prefix(s, 500), s);
    }
}
