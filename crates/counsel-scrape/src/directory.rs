use std::sync::LazyLock;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use regex::Regex;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, USER_AGENT};
use scraper::{ElementRef, Html, Selector};
use tracing::{info, warn};
use url::Url;

use crate::delay;
use crate::records::{Listing, LINK_NOT_FOUND, NAME_NOT_FOUND, RATING_NOT_FOUND};

static RATING_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+\.?\d*)").expect("rating pattern"));

/// Phrases the directory renders instead of result cards when a search
/// comes up empty.
const NO_RESULTS_PHRASES: &[&str] = &[
    "try browsing in common practice areas",
    "no results found",
    "didn't find any lawyers",
    "are you a lawyer?",
];

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:121.0) Gecko/20100101 Firefox/121.0",
];

/// Fetches directory result pages and parses lawyer cards out of them.
///
/// The markup is third-party and changes without notice; every field is
/// extracted through a chain of selector strategies with a literal
/// placeholder at the end, and a card that cannot be parsed is skipped.
pub struct DirectoryClient {
    http: Client,
    base_url: String,
}

impl DirectoryClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .default_headers(headers)
            .cookie_store(true)
            .build()
            .expect("failed to build HTTP client");

        Self {
            http,
            base_url: base_url.into(),
        }
    }

    fn random_user_agent(&self) -> &'static str {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        USER_AGENTS[rng.gen_range(0..USER_AGENTS.len())]
    }

    fn fetch(&self, url: &str) -> Result<String> {
        let resp = self
            .http
            .get(url)
            .header(USER_AGENT, self.random_user_agent())
            .send()
            .with_context(|| format!("request to {url} failed"))?;

        let status = resp.status();
        if status.as_u16() == 403 || status.as_u16() == 429 {
            bail!("blocked by directory site at {url}: {status}");
        }
        if !status.is_success() {
            bail!("directory returned {status} for {url}");
        }
        Ok(resp.text()?)
    }

    /// The search form, rendered as its underlying GET.
    pub fn search_page(&self, query: &str, location: &str) -> Result<String> {
        let url = format!(
            "{}/search/lawyer_search?q={}&loc={}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(query),
            urlencoding::encode(location),
        );
        info!(%url, "fetching search results");
        self.fetch(&url)
    }

    /// Practice-area browse page, the fallback when the search yields nothing.
    pub fn browse_page(&self, practice_slug: &str, location_slug: &str, page: u32) -> Result<String> {
        let mut url = format!(
            "{}/{}/{}.html",
            self.base_url.trim_end_matches('/'),
            practice_slug,
            location_slug,
        );
        if page > 1 {
            url.push_str(&format!("?page={page}"));
        }
        info!(%url, "fetching browse page");
        self.fetch(&url)
    }

    /// Full listing scrape: search first, browse pages as fallback.
    /// Never fails out of the top level. Fetch errors are logged and the
    /// result is simply zero or more well-formed rows.
    pub fn scrape_listings(
        &self,
        query: &str,
        location: &str,
        practice_slug: &str,
        location_slug: &str,
        pages: u32,
    ) -> Vec<Listing> {
        match self.search_page(query, location) {
            Ok(html) => {
                let rows = parse_listings(&html, &self.base_url, location);
                if !rows.is_empty() {
                    info!(count = rows.len(), "listings found via search");
                    return rows;
                }
                warn!("search page yielded no listings, trying browse pages");
            }
            Err(e) => warn!("search fetch failed, trying browse pages: {e:#}"),
        }

        let mut all = Vec::new();
        for page in 1..=pages.max(1) {
            if page > 1 {
                delay::page_delay();
            }
            let html = match self.browse_page(practice_slug, location_slug, page) {
                Ok(h) => h,
                Err(e) => {
                    warn!(page, "browse fetch failed, stopping: {e:#}");
                    break;
                }
            };
            let rows = parse_listings(&html, &self.base_url, location);
            if rows.is_empty() {
                info!(page, "no listings on page, stopping");
                break;
            }
            info!(page, count = rows.len(), "listings found");
            all.extend(rows);
        }
        all
    }
}

// ── Parsing ──────────────────────────────────────────────────────────────

fn sel(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

fn text_of(el: ElementRef) -> String {
    el.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn absolutize(base: Option<&Url>, href: &str) -> String {
    if href.starts_with("http") {
        return href.to_string();
    }
    match base.and_then(|b| b.join(href).ok()) {
        Some(u) => u.to_string(),
        None => LINK_NOT_FOUND.to_string(),
    }
}

fn is_no_results(document: &Html) -> bool {
    let page_text = document
        .root_element()
        .text()
        .collect::<String>()
        .to_lowercase();
    NO_RESULTS_PHRASES.iter().any(|p| page_text.contains(p))
}

fn select_cards(document: &Html) -> Vec<ElementRef<'_>> {
    let cards: Vec<_> = document
        .select(&sel(r#"div[data-qa-id="lawyer-card"]"#))
        .collect();
    if !cards.is_empty() {
        return cards;
    }

    let cards: Vec<_> = document.select(&sel("div.lawyer-card")).collect();
    if !cards.is_empty() {
        return cards;
    }

    // Last resort: anything whose class hints at a result card.
    document
        .select(&sel("article, div"))
        .filter(|el| {
            el.value()
                .attr("class")
                .map(|c| {
                    let c = c.to_lowercase();
                    c.contains("lawyer") || c.contains("attorney") || c.contains("result")
                })
                .unwrap_or(false)
        })
        .collect()
}

fn extract_name_and_link(card: ElementRef, base: Option<&Url>) -> (String, String) {
    let anchor = card
        .select(&sel(r#"a[data-qa-id="lawyer-name-link"]"#))
        .next()
        .or_else(|| {
            card.select(&sel(r#"a[href*='/attorneys/'], a[href*='/lawyer/']"#))
                .next()
        });

    if let Some(a) = anchor {
        let name = match text_of(a) {
            t if t.is_empty() => NAME_NOT_FOUND.to_string(),
            t => t,
        };
        let link = a
            .value()
            .attr("href")
            .map(|h| absolutize(base, h))
            .unwrap_or_else(|| LINK_NOT_FOUND.to_string());
        return (name, link);
    }

    // Name wasn't in a link; take the first heading and look for the
    // profile link separately.
    let name = card
        .select(&sel("h2, h3, h4"))
        .next()
        .map(text_of)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| NAME_NOT_FOUND.to_string());
    let link = card
        .select(&sel(r#"a[href*='/attorneys/'], a[href*='/lawyer/']"#))
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(|h| absolutize(base, h))
        .unwrap_or_else(|| LINK_NOT_FOUND.to_string());
    (name, link)
}

fn extract_rating(card: ElementRef) -> String {
    let mut rating = RATING_NOT_FOUND.to_string();
    let mut review_count = String::new();

    for span in card.select(&sel("span.sr-only, span.text-truncate")) {
        let text = text_of(span);
        if text.contains("Avvo Rating") {
            if let Some(m) = RATING_DIGITS.captures(&text).and_then(|c| c.get(1)) {
                rating = m.as_str().to_string();
            }
        } else if text.to_lowercase().contains("review") {
            review_count = format!(" ({text})");
        }
    }

    if rating == RATING_NOT_FOUND {
        if let Some(strong) = card.select(&sel("strong")).next() {
            let t = text_of(strong);
            if !t.is_empty() {
                rating = t;
            }
        }
    }

    format!("{rating}{review_count}")
}

fn extract_snippet(card: ElementRef) -> String {
    card.select(&sel(r#"div[data-qa-id="lawyer-snippet"]"#))
        .next()
        .or_else(|| card.select(&sel("p")).next())
        .map(text_of)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "See profile for details".to_string())
}

fn extract_location(card: ElementRef, default_location: &str) -> String {
    card.select(&sel(r#"div[data-qa-id="lawyer-location"]"#))
        .next()
        .map(text_of)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| default_location.to_string())
}

/// When no cards parse at all, fall back to bare profile links.
fn link_fallback(document: &Html, base: Option<&Url>, default_location: &str) -> Vec<Listing> {
    let anchors: Vec<_> = document
        .select(&sel(r#"a[href*='/lawyer/'], a[href*='/professional/']"#))
        .take(10)
        .collect();
    if !anchors.is_empty() {
        info!(count = anchors.len(), "falling back to bare profile links");
    }
    anchors
        .into_iter()
        .filter_map(|a| {
            let name = text_of(a);
            let href = a.value().attr("href")?;
            if name.is_empty() {
                return None;
            }
            Some(Listing {
                name,
                profile_link: absolutize(base, href),
                location: default_location.to_string(),
                rating: "See profile".to_string(),
                snippet: "Visit profile for details".to_string(),
            })
        })
        .collect()
}

/// Parse a results page into listing rows. Pure function; never fails,
/// returns an empty vec for a no-results page or unrecognized markup.
pub fn parse_listings(html: &str, base_url: &str, default_location: &str) -> Vec<Listing> {
    let document = Html::parse_document(html);
    let base = Url::parse(base_url).ok();

    if is_no_results(&document) {
        info!("no lawyers found for this search");
        return Vec::new();
    }

    let cards = select_cards(&document);
    if cards.is_empty() {
        return link_fallback(&document, base.as_ref(), default_location);
    }

    cards
        .into_iter()
        .map(|card| {
            let (name, profile_link) = extract_name_and_link(card, base.as_ref());
            Listing {
                name,
                profile_link,
                location: extract_location(card, default_location),
                rating: extract_rating(card),
                snippet: extract_snippet(card),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.avvo.com";

    #[test]
    fn parses_qa_tagged_cards() {
        let html = r#"
        <html><body>
          <div data-qa-id="lawyer-card">
            <a data-qa-id="lawyer-name-link" href="/attorneys/10001-ny-jane-smith.html">Jane Smith</a>
            <div data-qa-id="lawyer-location">New York, NY</div>
            <span class="sr-only">Avvo Rating 9.5 out of 10</span>
            <span class="text-truncate">12 reviews</span>
            <div data-qa-id="lawyer-snippet">Immigration attorney handling employment-based petitions.</div>
          </div>
        </body></html>"#;

        let rows = parse_listings(html, BASE, "New York, NY");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Jane Smith");
        assert_eq!(
            rows[0].profile_link,
            "https://www.avvo.com/attorneys/10001-ny-jane-smith.html"
        );
        assert_eq!(rows[0].location, "New York, NY");
        assert_eq!(rows[0].rating, "9.5 (12 reviews)");
        assert!(rows[0].snippet.contains("employment-based"));
    }

    #[test]
    fn parses_class_named_cards_with_heading_name() {
        let html = r#"
        <html><body>
          <div class="lawyer-card">
            <h3>Bob Jones</h3>
            <a href="/lawyer/bob-jones">View profile</a>
            <strong>8.9</strong>
            <p>EB-1 and O-1 petitions for researchers.</p>
          </div>
        </body></html>"#;

        let rows = parse_listings(html, BASE, "New York, NY");
        assert_eq!(rows.len(), 1);
        // Anchor strategy wins over the heading when the href matches.
        assert_eq!(rows[0].name, "View profile");
        assert_eq!(rows[0].profile_link, "https://www.avvo.com/lawyer/bob-jones");
        assert_eq!(rows[0].rating, "8.9");
    }

    #[test]
    fn heading_name_used_when_no_profile_anchor() {
        let html = r#"
        <html><body>
          <div class="lawyer-card">
            <h3>Bob Jones</h3>
            <p>EB-1 and O-1 petitions for researchers.</p>
          </div>
        </body></html>"#;

        let rows = parse_listings(html, BASE, "New York, NY");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Bob Jones");
        assert_eq!(rows[0].profile_link, LINK_NOT_FOUND);
        assert_eq!(rows[0].location, "New York, NY");
    }

    #[test]
    fn no_results_page_yields_empty() {
        let html = r#"
        <html><body>
          <h1>We didn't find any lawyers matching your search</h1>
          <p>Try browsing in common practice areas instead.</p>
          <div class="search-results"></div>
        </body></html>"#;

        let rows = parse_listings(html, BASE, "New York, NY");
        assert!(rows.is_empty());
    }

    #[test]
    fn bare_profile_links_become_minimal_rows() {
        let html = r#"
        <html><body>
          <ul>
            <li><a href="/lawyer/jane-smith">Jane Smith</a></li>
            <li><a href="/professional/bob-jones">Bob Jones</a></li>
          </ul>
        </body></html>"#;

        let rows = parse_listings(html, BASE, "Chicago, IL");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "Jane Smith");
        assert_eq!(rows[0].profile_link, "https://www.avvo.com/lawyer/jane-smith");
        assert_eq!(rows[0].location, "Chicago, IL");
        assert_eq!(rows[0].rating, "See profile");
    }

    #[test]
    fn unrecognized_markup_yields_empty() {
        let html = "<html><body><p>Nothing useful here.</p></body></html>";
        assert!(parse_listings(html, BASE, "NY").is_empty());
    }
}
