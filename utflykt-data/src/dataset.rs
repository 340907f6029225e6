//! Adapter for generic open-data feeds (JSON and GeoJSON).
//!
//! Municipal portals publish the same kind of data in slightly different
//! shapes: GeoJSON feature collections or flat arrays of objects, with
//! Swedish or English property names. Entries without a link or without
//! both coordinates are dropped, per the adapter contract.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use utflykt_core::{LonLat, Place, PlaceSource, Provenance, SourceError};

/// Source name used in provenance entries.
const SOURCE_NAME: &str = "Municipal";

/// Licence label attached to fetched entries.
const LICENSE: &str = "Open data (check source)";

/// One remote JSON/GeoJSON resource mapped onto candidate records.
pub struct DatasetSource {
    client: Client,
    url: String,
    activity: String,
    label: String,
}

impl DatasetSource {
    /// Create an adapter for `url`, tagging records with `activity`.
    pub fn new(client: Client, url: impl Into<String>, activity: impl Into<String>) -> Self {
        let url = url.into();
        let activity = activity.into();
        // Runs configure several feeds; the report label carries the
        // activity and feed URL so failures stay attributable.
        let label = format!("{SOURCE_NAME} ({activity}: {url})");
        Self {
            client,
            url,
            activity,
            label,
        }
    }
}

#[async_trait]
impl PlaceSource for DatasetSource {
    fn name(&self) -> &str {
        &self.label
    }

    async fn fetch(&self) -> Result<Vec<Place>, SourceError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| SourceError::Fetch {
                url: self.url.clone(),
                message: err.to_string(),
            })?;
        let payload: Value = response.json().await.map_err(|err| SourceError::Decode {
            url: self.url.clone(),
            message: err.to_string(),
        })?;
        Ok(parse_dataset(&payload, &self.activity, &self.url))
    }
}

/// Map a decoded feed onto candidate records.
///
/// Accepts a GeoJSON `FeatureCollection` or a flat array of objects; any
/// other shape yields no records.
pub fn parse_dataset(payload: &Value, activity: &str, dataset_url: &str) -> Vec<Place> {
    if payload.get("type").and_then(Value::as_str) == Some("FeatureCollection") {
        let features = payload
            .get("features")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        return features
            .iter()
            .filter_map(|feature| feature_to_place(feature, activity, dataset_url))
            .collect();
    }
    if let Some(items) = payload.as_array() {
        return items
            .iter()
            .filter_map(|item| object_to_place(item, activity, dataset_url))
            .collect();
    }
    Vec::new()
}

fn feature_to_place(feature: &Value, activity: &str, dataset_url: &str) -> Option<Place> {
    let properties = feature.get("properties")?;
    let coordinates = feature
        .get("geometry")
        .and_then(|geometry| geometry.get("coordinates"))
        .and_then(Value::as_array)?;
    let lon = coordinates.first().and_then(number)?;
    let lat = coordinates.get(1).and_then(number)?;
    build_place(properties, LonLat { lat, lon }, activity, dataset_url)
}

fn object_to_place(item: &Value, activity: &str, dataset_url: &str) -> Option<Place> {
    let lat = field(item, &["lat", "latitude"]).and_then(number)?;
    let lon = field(item, &["lon", "longitude", "long"]).and_then(number)?;
    build_place(item, LonLat { lat, lon }, activity, dataset_url)
}

fn build_place(
    properties: &Value,
    coordinates: LonLat,
    activity: &str,
    dataset_url: &str,
) -> Option<Place> {
    let link = text(properties, &["website", "url", "link", "lank"])?;
    let name = text(properties, &["name", "namn"]).unwrap_or_else(|| "Plats".to_owned());
    let id = text(properties, &["id"]).unwrap_or_else(|| format!("muni/{name}"));

    let mut place = Place::new(
        id,
        Provenance {
            name: SOURCE_NAME.into(),
            url: dataset_url.to_owned(),
            license: LICENSE.into(),
        },
    );
    place.name = Some(name);
    place.categories = vec![activity.to_owned()];
    place.coordinates = Some(coordinates);
    place.link = Some(link);
    place.opening_hours = text(properties, &["opening_hours", "oppettider"]);
    place.description = text(properties, &["description", "beskrivning"]);
    Some(place)
}

fn field<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| value.get(key))
}

/// Non-empty string property under any of the alias keys.
fn text(value: &Value, keys: &[&str]) -> Option<String> {
    field(value, keys)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// Numeric value, accepting JSON numbers and numeric strings.
fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn geojson() -> Value {
        json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "properties": {
                        "namn": "Badplats Ängby",
                        "website": "https://example.se/angby",
                        "oppettider": "Mo-Su 09:00-19:00"
                    },
                    "geometry": {"type": "Point", "coordinates": [17.9, 59.34]}
                },
                {
                    "properties": {"name": "No link"},
                    "geometry": {"type": "Point", "coordinates": [18.0, 59.0]}
                }
            ]
        })
    }

    #[rstest]
    fn parses_geojson_features() {
        let places = parse_dataset(&geojson(), "swimming", "https://data.example.se/bad");
        assert_eq!(places.len(), 1, "entries without a link are dropped");
        let place = &places[0];
        assert_eq!(place.name.as_deref(), Some("Badplats Ängby"));
        assert_eq!(place.categories, vec!["swimming"]);
        let coords = place.coordinates.expect("coordinates present");
        assert_eq!(coords.lat, 59.34);
        assert_eq!(coords.lon, 17.9);
        assert_eq!(place.opening_hours.as_deref(), Some("Mo-Su 09:00-19:00"));
        assert_eq!(place.provenance[0].url, "https://data.example.se/bad");
    }

    #[rstest]
    fn parses_flat_arrays_with_string_coordinates() {
        let payload = json!([
            {"name": "Utegym", "url": "https://example.se/gym", "lat": "59.31", "lon": "18.07"},
            {"name": "No coordinates", "url": "https://example.se/x"}
        ]);
        let places = parse_dataset(&payload, "gym", "https://data.example.se/set");
        assert_eq!(places.len(), 1);
        assert_eq!(places[0].coordinates.expect("coords").lat, 59.31);
    }

    #[rstest]
    fn unnamed_entries_get_the_generic_fallback() {
        let payload = json!([
            {"url": "https://example.se/plats", "lat": 59.0, "lon": 18.0}
        ]);
        let places = parse_dataset(&payload, "outdoor", "https://data.example.se/set");
        assert_eq!(places[0].name.as_deref(), Some("Plats"));
        assert_eq!(places[0].id, "muni/Plats");
    }

    #[rstest]
    fn configured_feeds_report_distinct_names() {
        let client = reqwest::Client::new();
        let baths = DatasetSource::new(client.clone(), "https://data.example.se/bad", "swimming");
        let gyms = DatasetSource::new(client, "https://data.example.se/gym", "gym");
        assert_ne!(baths.name(), gyms.name());
        assert!(baths.name().contains("swimming"));
        assert!(baths.name().contains("https://data.example.se/bad"));
    }

    #[rstest]
    fn unsupported_shapes_yield_nothing() {
        let payload = json!({"rows": []});
        assert!(parse_dataset(&payload, "outdoor", "u").is_empty());
    }

    #[tokio::test]
    async fn fetches_and_parses_remote_feed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(geojson()))
            .mount(&server)
            .await;

        let source = DatasetSource::new(
            reqwest::Client::new(),
            format!("{}/feed", server.uri()),
            "swimming",
        );
        let places = source.fetch().await.expect("feed fetches");
        assert_eq!(places.len(), 1);
    }

    #[tokio::test]
    async fn http_error_surfaces_as_source_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let source = DatasetSource::new(
            reqwest::Client::new(),
            format!("{}/feed", server.uri()),
            "swimming",
        );
        let err = source.fetch().await.expect_err("500 fails");
        assert!(matches!(err, SourceError::Fetch { .. }));
    }
}
