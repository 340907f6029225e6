//! Best-effort enrichment from a record's website.
//!
//! Fetches the linked page once and lifts OpenGraph/meta tags and
//! schema.org opening hours into the record. Populated fields are never
//! overwritten; enrichment only fills gaps.

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use utflykt_core::{EnrichError, Enricher, Place};

use crate::{ClientBuildError, build_client};

/// Enricher backed by the record's own website.
pub struct OpenGraphEnricher {
    client: Client,
}

/// Metadata lifted from one fetched page.
#[derive(Debug, Default, PartialEq, Eq)]
struct PageMetadata {
    image: Option<String>,
    description: Option<String>,
    opening_hours: Option<String>,
}

impl OpenGraphEnricher {
    /// Create an enricher with the shared client configuration.
    pub fn new() -> Result<Self, ClientBuildError> {
        Ok(Self {
            client: build_client()?,
        })
    }

    /// Create an enricher over an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Enricher for OpenGraphEnricher {
    async fn enrich(&self, place: &mut Place) -> Result<bool, EnrichError> {
        let Some(url) = place.link.clone() else {
            return Ok(false);
        };
        let fetch_err = |message: String| EnrichError::Fetch {
            url: url.clone(),
            message,
        };
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| fetch_err(err.to_string()))?;
        let html = response
            .text()
            .await
            .map_err(|err| fetch_err(err.to_string()))?;
        if html.trim().is_empty() {
            return Ok(false);
        }
        apply_metadata(place, extract_metadata(&html));
        Ok(true)
    }
}

/// Pull the interesting tags out of a page.
fn extract_metadata(html: &str) -> PageMetadata {
    let document = Html::parse_document(html);
    PageMetadata {
        image: meta_content(
            &document,
            &[r#"meta[property="og:image"]"#, r#"meta[name="twitter:image"]"#],
        ),
        description: meta_content(
            &document,
            &[
                r#"meta[property="og:description"]"#,
                r#"meta[name="description"]"#,
                r#"meta[name="twitter:description"]"#,
            ],
        ),
        opening_hours: first_text(&document, r#"[itemprop="openingHours"]"#),
    }
}

/// Fill gaps on the record; existing values always win.
fn apply_metadata(place: &mut Place, metadata: PageMetadata) {
    if let Some(image) = metadata.image {
        if !place.images.contains(&image) {
            place.images.push(image);
        }
    }
    if place.description.is_none() {
        place.description = metadata.description;
    }
    if place.opening_hours.is_none() {
        place.opening_hours = metadata.opening_hours;
    }
}

/// First non-empty `content` attribute across the given selectors.
fn meta_content(document: &Html, selectors: &[&str]) -> Option<String> {
    selectors.iter().find_map(|selector| {
        let parsed = Selector::parse(selector).ok()?;
        document
            .select(&parsed)
            .find_map(|element| element.value().attr("content"))
            .map(str::trim)
            .filter(|content| !content.is_empty())
            .map(str::to_owned)
    })
}

/// First non-empty text content matching the selector.
fn first_text(document: &Html, selector: &str) -> Option<String> {
    let parsed = Selector::parse(selector).ok()?;
    document.select(&parsed).find_map(|element| {
        let text = element.text().collect::<Vec<_>>().join(" ");
        let trimmed = text.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_owned())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use utflykt_core::Provenance;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = r#"<html><head>
        <meta property="og:image" content="https://img.example.se/bad.jpg">
        <meta property="og:description" content="Badplats med brygga">
        </head><body>
        <span itemprop="openingHours">Mo-Su 08:00-20:00</span>
        </body></html>"#;

    fn place_with_link(link: &str) -> Place {
        let mut place = Place::new(
            "x",
            Provenance {
                name: "Municipal".into(),
                url: "https://data.example.se".into(),
                license: "CC0".into(),
            },
        );
        place.link = Some(link.to_owned());
        place
    }

    #[rstest]
    fn extracts_opengraph_tags() {
        let metadata = extract_metadata(PAGE);
        assert_eq!(
            metadata.image.as_deref(),
            Some("https://img.example.se/bad.jpg")
        );
        assert_eq!(metadata.description.as_deref(), Some("Badplats med brygga"));
        assert_eq!(metadata.opening_hours.as_deref(), Some("Mo-Su 08:00-20:00"));
    }

    #[rstest]
    fn falls_back_to_plain_meta_description() {
        let html = r#"<head><meta name="description" content="Utsiktsplats"></head>"#;
        let metadata = extract_metadata(html);
        assert_eq!(metadata.description.as_deref(), Some("Utsiktsplats"));
    }

    #[rstest]
    fn populated_scalars_are_never_overwritten() {
        let mut place = place_with_link("https://example.se");
        place.description = Some("original".into());
        place.images = vec!["https://img.example.se/bad.jpg".into()];
        apply_metadata(
            &mut place,
            PageMetadata {
                image: Some("https://img.example.se/bad.jpg".into()),
                description: Some("scraped".into()),
                opening_hours: Some("24/7".into()),
            },
        );
        assert_eq!(place.description.as_deref(), Some("original"));
        assert_eq!(place.images.len(), 1, "duplicate image is not re-added");
        assert_eq!(place.opening_hours.as_deref(), Some("24/7"));
    }

    #[tokio::test]
    async fn enriches_from_live_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bad"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .mount(&server)
            .await;

        let enricher = OpenGraphEnricher::with_client(reqwest::Client::new());
        let mut place = place_with_link(&format!("{}/bad", server.uri()));
        let fetched = enricher.enrich(&mut place).await.expect("page fetched");
        assert!(fetched);
        assert_eq!(place.images, vec!["https://img.example.se/bad.jpg"]);
        assert_eq!(place.opening_hours.as_deref(), Some("Mo-Su 08:00-20:00"));
    }

    #[tokio::test]
    async fn error_status_surfaces_as_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(410))
            .mount(&server)
            .await;

        let enricher = OpenGraphEnricher::with_client(reqwest::Client::new());
        let mut place = place_with_link(&format!("{}/gone", server.uri()));
        let err = enricher.enrich(&mut place).await.expect_err("410 fails");
        assert!(matches!(err, EnrichError::Fetch { .. }));
    }

    #[tokio::test]
    async fn record_without_link_is_skipped() {
        let enricher = OpenGraphEnricher::with_client(reqwest::Client::new());
        let mut place = place_with_link("https://example.se");
        place.link = None;
        let fetched = enricher.enrich(&mut place).await.expect("no fetch");
        assert!(!fetched);
    }
}
