//! Bounded crawl of a municipal website for outdoor-facility pages.
//!
//! The crawl is bounded by construction: an explicit frontier queue with a
//! visited set, a page budget, and a depth cap. Only same-host links under
//! recognisably relevant path sections are followed, and the wildcard
//! rules of the site's robots.txt are honoured.

use std::collections::{HashSet, VecDeque};
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use url::Url;
use utflykt_core::{LonLat, Place, PlaceSource, Provenance, SourceError};

/// Source name used in provenance entries.
const SOURCE_NAME: &str = "MunicipalCrawler";

/// Page text fragments mapped to category tags.
const KEYWORD_CATEGORIES: &[(&str, &str)] = &[
    ("utegym", "gym"),
    ("badplats", "swimming"),
    ("bad", "swimming"),
    ("motionsspår", "running"),
    ("elljusspår", "running"),
    ("spår", "running"),
    ("leder", "hiking"),
    ("vandring", "hiking"),
    ("naturreservat", "nature_reserve"),
    ("kanot", "canoe_kayak"),
    ("kajak", "canoe_kayak"),
    ("paddling", "canoe_kayak"),
];

/// Path sections worth entering; anything else is noise for this crawl.
const SECTION_KEYWORDS: &[&str] = &[
    "uppleva", "fritid", "kultur", "motion", "idrott", "bad", "utegym", "natur", "leder",
];

/// Section landing pages tried as seeds next to the site root.
const SEED_PATHS: &[&str] = &[
    "/uppleva-och-gora",
    "/kultur-och-fritid",
    "/fritid-och-kultur",
    "/motion-och-fritid",
    "/idrott",
    "/bad",
    "/utegym",
    "/natur",
    "/leder",
];

/// Crawl limits; defaults mirror a polite, small-scope run.
#[derive(Debug, Clone)]
pub struct CrawlLimits {
    /// Maximum number of successfully fetched pages.
    pub max_pages: usize,
    /// Maximum link depth from the seeds.
    pub max_depth: usize,
    /// Pause between fetches.
    pub delay: Duration,
}

impl Default for CrawlLimits {
    fn default() -> Self {
        Self {
            max_pages: 25,
            max_depth: 2,
            delay: Duration::from_millis(500),
        }
    }
}

/// Crawls one municipality site for pages describing outdoor facilities.
pub struct MunicipalCrawler {
    client: Client,
    site: String,
    limits: CrawlLimits,
    label: String,
}

impl MunicipalCrawler {
    /// Create a crawler for `site` with the given limits.
    pub fn new(client: Client, site: impl Into<String>, limits: CrawlLimits) -> Self {
        let site = site.into();
        // Distinct per-site labels keep multi-site reports attributable.
        let label = format!("{SOURCE_NAME} ({site})");
        Self {
            client,
            site,
            limits,
            label,
        }
    }

    async fn crawl(&self) -> Result<Vec<Place>, SourceError> {
        let seed = Url::parse(&self.site).map_err(|err| SourceError::Fetch {
            url: self.site.clone(),
            message: err.to_string(),
        })?;
        let host = seed.host_str().map(str::to_owned).unwrap_or_default();
        let disallowed = self.fetch_robots_rules(&seed).await;

        let mut frontier: VecDeque<(Url, usize)> = VecDeque::new();
        for path in SEED_PATHS {
            if let Ok(url) = seed.join(path) {
                frontier.push_back((url, 0));
            }
        }
        frontier.push_back((seed.clone(), 0));

        let mut visited: HashSet<String> = HashSet::new();
        let mut places = Vec::new();
        let mut fetched = 0usize;

        while let Some((url, depth)) = frontier.pop_front() {
            if fetched >= self.limits.max_pages {
                break;
            }
            if depth > self.limits.max_depth || !visited.insert(url.as_str().to_owned()) {
                continue;
            }
            if disallowed.iter().any(|rule| url.path().starts_with(rule)) {
                continue;
            }
            let Some(html) = self.fetch_page(&url).await else {
                continue;
            };
            fetched += 1;

            let categories = categorize(&html);
            if !categories.is_empty() {
                places.push(page_to_place(&url, &self.site, &html, categories));
            }
            for link in internal_links(&url, &host, &html) {
                frontier.push_back((link, depth + 1));
            }
            if !self.limits.delay.is_zero() {
                tokio::time::sleep(self.limits.delay).await;
            }
        }
        Ok(places)
    }

    async fn fetch_page(&self, url: &Url) -> Option<String> {
        let response = self.client.get(url.clone()).send().await.ok()?;
        if response.status().as_u16() >= 400 {
            return None;
        }
        response.text().await.ok()
    }

    /// Wildcard-agent `Disallow` prefixes from the site's robots.txt.
    ///
    /// An unreachable or unparseable robots.txt allows everything, as the
    /// original polite-crawl policy did.
    async fn fetch_robots_rules(&self, seed: &Url) -> Vec<String> {
        let Ok(robots_url) = seed.join("/robots.txt") else {
            return Vec::new();
        };
        let Some(body) = self.fetch_page(&robots_url).await else {
            return Vec::new();
        };
        parse_robots(&body)
    }
}

#[async_trait]
impl PlaceSource for MunicipalCrawler {
    fn name(&self) -> &str {
        &self.label
    }

    async fn fetch(&self) -> Result<Vec<Place>, SourceError> {
        self.crawl().await
    }
}

/// Extract `Disallow` prefixes that apply to every agent.
fn parse_robots(body: &str) -> Vec<String> {
    let mut rules = Vec::new();
    let mut wildcard_section = false;
    for line in body.lines() {
        let line = line.split('#').next().unwrap_or_default().trim();
        if let Some(agent) = strip_directive(line, "user-agent") {
            wildcard_section = agent == "*";
        } else if wildcard_section {
            if let Some(path) = strip_directive(line, "disallow") {
                if !path.is_empty() {
                    rules.push(path.to_owned());
                }
            }
        }
    }
    rules
}

fn strip_directive<'a>(line: &'a str, directive: &str) -> Option<&'a str> {
    let (name, value) = line.split_once(':')?;
    name.trim()
        .eq_ignore_ascii_case(directive)
        .then(|| value.trim())
}

/// Categories suggested by the page text.
fn categorize(html: &str) -> Vec<String> {
    let lowered = html.to_lowercase();
    let mut categories: Vec<String> = KEYWORD_CATEGORIES
        .iter()
        .filter(|(keyword, _)| lowered.contains(keyword))
        .map(|(_, category)| (*category).to_owned())
        .collect();
    categories.sort();
    categories.dedup();
    categories
}

fn page_to_place(url: &Url, site: &str, html: &str, categories: Vec<String>) -> Place {
    let mut place = Place::new(
        url.as_str(),
        Provenance {
            name: SOURCE_NAME.into(),
            url: site.to_owned(),
            license: "Website (check terms)".into(),
        },
    );
    place.name = page_title(html).or_else(|| Some(url.as_str().to_owned()));
    place.categories = categories;
    place.coordinates = extract_coordinates(html);
    place.link = Some(url.as_str().to_owned());
    place
}

fn page_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("title").ok()?;
    document.select(&selector).find_map(|element| {
        let text = element.text().collect::<String>();
        let trimmed = text.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_owned())
    })
}

/// Coordinates from JSON-LD `geo` blocks, with a Swedish-bounds regex as a
/// fallback for pages that inline them in text.
fn extract_coordinates(html: &str) -> Option<LonLat> {
    if let Some(coords) = jsonld_coordinates(html) {
        return Some(coords);
    }
    let captures = coordinate_regex()?.captures(html)?;
    let lat: f64 = captures.name("lat")?.as_str().parse().ok()?;
    let lon: f64 = captures.name("lon")?.as_str().parse().ok()?;
    Some(LonLat { lat, lon })
}

fn jsonld_coordinates(html: &str) -> Option<LonLat> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(r#"script[type="application/ld+json"]"#).ok()?;
    document.select(&selector).find_map(|script| {
        let text = script.text().collect::<String>();
        let data: serde_json::Value = serde_json::from_str(text.trim()).ok()?;
        let geo = data.get("geo")?;
        let lat = geo.get("latitude")?.as_f64()?;
        let lon = geo.get("longitude")?.as_f64()?;
        Some(LonLat { lat, lon })
    })
}

/// Lat/lon pairs plausibly inside Sweden.
fn coordinate_regex() -> Option<&'static Regex> {
    static REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    REGEX
        .get_or_init(|| {
            Regex::new(r"(?P<lat>[5-6]\d\.\d+)[,\s]+(?P<lon>(?:1\d|2[0-5])\.\d+)").ok()
        })
        .as_ref()
}

/// Same-host links under a relevant section, resolved against `base`.
fn internal_links(base: &Url, host: &str, html: &str) -> Vec<Url> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    document
        .select(&selector)
        .filter_map(|anchor| {
            let href = anchor.value().attr("href")?;
            if href.starts_with('#') {
                return None;
            }
            let url = base.join(href).ok()?;
            if url.host_str() != Some(host) {
                return None;
            }
            let path = url.path().to_lowercase();
            SECTION_KEYWORDS
                .iter()
                .any(|keyword| path.contains(keyword))
                .then_some(url)
        })
        .collect()
}
