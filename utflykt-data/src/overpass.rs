//! OSM adapter querying the Overpass API for tagged outdoor places.
//!
//! One query per category runs against a rotation of public Overpass
//! endpoints; elements appearing under several categories are fetched once
//! and accumulate every matching tag. Only elements carrying an explicit
//! website (or social profile) and usable coordinates become candidate
//! records, mirroring the published dump's link-first contract.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use utflykt_core::{LonLat, Place, PlaceSource, Provenance, SourceError};

/// Source name used in reports and provenance entries.
const SOURCE_NAME: &str = "OSM";

/// Public Overpass endpoints, tried in order per attempt.
pub const DEFAULT_ENDPOINTS: &[&str] = &[
    "https://overpass.kumi.systems/api/interpreter",
    "https://overpass-api.de/api/interpreter",
];

/// Tag selectors per category, matched for nodes, ways, and relations.
const CATEGORY_SELECTORS: &[(&str, &[&str])] = &[
    (
        "swimming",
        &[r#"["leisure"="swimming_area"]"#, r#"["natural"="beach"]"#],
    ),
    ("gym", &[r#"["leisure"="fitness_station"]"#]),
    ("nature_reserve", &[r#"["leisure"="nature_reserve"]"#]),
    ("canoe_kayak", &[r#"["canoe"="yes"]"#]),
    ("hiking", &[r#"["tourism"="wilderness_hut"]"#]),
];

/// Pause between retry rounds when every endpoint failed.
const RETRY_BACKOFF: Duration = Duration::from_secs(2);

/// Candidate source backed by the Overpass API.
pub struct OverpassSource {
    client: Client,
    endpoints: Vec<String>,
    retries: usize,
}

impl OverpassSource {
    /// Create a source over the default public endpoints.
    pub fn new(client: Client) -> Self {
        let endpoints = DEFAULT_ENDPOINTS
            .iter()
            .map(|ep| (*ep).to_owned())
            .collect();
        Self::with_endpoints(client, endpoints)
    }

    /// Create a source over explicit endpoints (first entry preferred).
    pub fn with_endpoints(client: Client, endpoints: Vec<String>) -> Self {
        Self {
            client,
            endpoints,
            retries: 3,
        }
    }

    /// Override the per-query retry rounds.
    pub fn with_retries(mut self, retries: usize) -> Self {
        self.retries = retries.max(1);
        self
    }

    async fn run_query(&self, ql: &str) -> Result<Value, SourceError> {
        let mut last_error = None;
        for attempt in 0..self.retries {
            if attempt > 0 {
                tokio::time::sleep(RETRY_BACKOFF).await;
            }
            for endpoint in &self.endpoints {
                let outcome = self
                    .client
                    .post(endpoint)
                    .form(&[("data", ql)])
                    .send()
                    .await
                    .and_then(reqwest::Response::error_for_status);
                let response = match outcome {
                    Ok(response) => response,
                    Err(err) => {
                        last_error = Some(SourceError::Fetch {
                            url: endpoint.clone(),
                            message: err.to_string(),
                        });
                        continue;
                    }
                };
                return response.json().await.map_err(|err| SourceError::Decode {
                    url: endpoint.clone(),
                    message: err.to_string(),
                });
            }
        }
        Err(last_error.unwrap_or_else(|| SourceError::Fetch {
            url: String::new(),
            message: "no Overpass endpoint configured".to_owned(),
        }))
    }
}

#[async_trait]
impl PlaceSource for OverpassSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn fetch(&self) -> Result<Vec<Place>, SourceError> {
        // Elements keyed by (type, id) so a feature matched by several
        // category queries is emitted once with every matching tag.
        let mut elements: HashMap<(String, u64), Value> = HashMap::new();
        let mut element_categories: HashMap<(String, u64), Vec<String>> = HashMap::new();

        for (category, selectors) in CATEGORY_SELECTORS {
            let payload = self.run_query(&category_query(selectors)).await?;
            let found = payload
                .get("elements")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            for element in found {
                let Some(key) = element_key(element) else {
                    continue;
                };
                elements
                    .entry(key.clone())
                    .or_insert_with(|| element.clone());
                element_categories
                    .entry(key)
                    .or_default()
                    .push((*category).to_owned());
            }
        }

        let mut places: Vec<Place> = elements
            .iter()
            .filter_map(|(key, element)| {
                let categories = element_categories.get(key).map_or(&[][..], Vec::as_slice);
                element_to_place(element, categories)
            })
            .collect();
        places.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(places)
    }
}

/// Overpass QL fetching node/way/relation for every selector, scoped to
/// Sweden, with centroids for non-node elements.
fn category_query(selectors: &[&str]) -> String {
    let mut body = String::new();
    for selector in selectors {
        for kind in ["node", "way", "relation"] {
            body.push_str(&format!("{kind}{selector}(area.a);\n"));
        }
    }
    format!(
        "[out:json][timeout:180];\n\
         area[\"ISO3166-1\"=\"SE\"][admin_level=2]->.a;\n\
         (\n{body})\n;\nout tags center;\n"
    )
}

fn element_key(element: &Value) -> Option<(String, u64)> {
    let kind = element.get("type").and_then(Value::as_str)?;
    let id = element.get("id").and_then(Value::as_u64)?;
    Some((kind.to_owned(), id))
}

/// Map one Overpass element onto a candidate record.
///
/// Elements without a website link or without usable coordinates yield
/// `None`; unnamed records stay unnamed for later synthesis.
fn element_to_place(element: &Value, categories: &[String]) -> Option<Place> {
    let (kind, id) = element_key(element)?;
    let tags = element.get("tags").cloned().unwrap_or(Value::Null);
    let website = choose_website(&tags)?;
    let coordinates = element_coordinates(element)?;
    let osm_url = format!("https://www.openstreetmap.org/{kind}/{id}");

    let mut place = Place::new(
        format!("{kind}/{id}"),
        Provenance {
            name: SOURCE_NAME.into(),
            url: osm_url,
            license: "ODbL".into(),
        },
    );
    place.name = choose_name(&tags);
    place.categories = categories.to_vec();
    place.categories.sort();
    place.categories.dedup();
    place.coordinates = Some(coordinates);
    place.link = Some(website);
    place.opening_hours = tag(&tags, "opening_hours");
    // A literal always-open tag is trustworthy without evaluation.
    if place.opening_hours.as_deref().map(str::trim) == Some("24/7") {
        place.open_now = Some(true);
    }
    Some(place)
}

/// Preferred name tag, Swedish first.
fn choose_name(tags: &Value) -> Option<String> {
    ["name:sv", "name", "name:en", "ref"]
        .iter()
        .find_map(|key| tag(tags, key))
}

/// Explicit website, falling back to a social profile URL.
fn choose_website(tags: &Value) -> Option<String> {
    if let Some(url) = ["website", "contact:website", "url"]
        .iter()
        .find_map(|key| tag(tags, key))
    {
        return Some(with_scheme(url));
    }
    let socials = [
        ("facebook", "https://facebook.com"),
        ("contact:facebook", "https://facebook.com"),
        ("instagram", "https://instagram.com"),
        ("contact:instagram", "https://instagram.com"),
        ("twitter", "https://twitter.com"),
        ("contact:twitter", "https://twitter.com"),
    ];
    socials.iter().find_map(|(key, base)| {
        let value = tag(tags, key)?;
        if value.starts_with("http://") || value.starts_with("https://") {
            return Some(value);
        }
        let handle = value.trim_matches('/');
        Some(format!("{base}/{handle}"))
    })
}

fn with_scheme(url: String) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url
    } else {
        format!("https://{url}")
    }
}

/// Node coordinates, or the centroid Overpass reports for ways and
/// relations.
fn element_coordinates(element: &Value) -> Option<LonLat> {
    let holder = if element.get("type").and_then(Value::as_str) == Some("node") {
        element
    } else {
        element.get("center")?
    };
    let lat = holder.get("lat").and_then(Value::as_f64)?;
    let lon = holder.get("lon").and_then(Value::as_f64)?;
    Some(LonLat { lat, lon })
}

/// Non-empty string tag.
fn tag(tags: &Value, key: &str) -> Option<String> {
    tags.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}
