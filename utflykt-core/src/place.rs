//! The place record exchanged between sources, stages, and output.
//!
//! A [`Place`] starts life as a candidate emitted by one source adapter and
//! becomes canonical once the merge engine has collapsed duplicates. Later
//! stages mutate it in place; `provenance` entries are never rewritten after
//! creation.

use geo::Coord;
use serde::{Deserialize, Serialize};
use url::Url;

/// Geographic position serialised as top-level `lat`/`lon` keys.
///
/// Stored separately from [`geo::Coord`] so the published dump keeps its
/// flat schema; convert with [`LonLat::coord`] where geometry is needed.
///
/// # Examples
/// ```
/// use utflykt_core::LonLat;
///
/// let pos = LonLat { lat: 59.33, lon: 18.07 };
/// assert_eq!(pos.coord().x, 18.07);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LonLat {
    /// Latitude in WGS84 degrees.
    pub lat: f64,
    /// Longitude in WGS84 degrees.
    pub lon: f64,
}

impl LonLat {
    /// Convert to a [`geo::Coord`] with `x = longitude` and `y = latitude`.
    pub fn coord(self) -> Coord<f64> {
        Coord {
            x: self.lon,
            y: self.lat,
        }
    }
}

impl From<Coord<f64>> for LonLat {
    fn from(coord: Coord<f64>) -> Self {
        Self {
            lat: coord.y,
            lon: coord.x,
        }
    }
}

/// Attribution for one contributing source.
///
/// Created once by the adapter and never mutated afterwards; merged records
/// accumulate one entry per contributing source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Human-readable source name, e.g. `"Municipal"`.
    pub name: String,
    /// URL of the upstream dataset or page.
    pub url: String,
    /// Licence label as published by the source.
    pub license: String,
}

/// Outcome of validating a record's external link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkCheck {
    /// Whether the final response status fell in `[200, 400)`.
    #[serde(rename = "link_ok")]
    pub ok: bool,
    /// Last status code observed, absent when both probes failed outright.
    #[serde(rename = "link_status", skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Effective URL after redirects, reported only when it differs from
    /// the probed URL.
    #[serde(rename = "website_final", skip_serializing_if = "Option::is_none")]
    pub final_url: Option<String>,
}

/// A point-of-interest record in the canonical shape shared by all sources.
///
/// # Examples
/// ```
/// use utflykt_core::{Place, Provenance};
///
/// let place = Place::new(
///     "osm/123",
///     Provenance {
///         name: "OSM".into(),
///         url: "https://osm.org/node/123".into(),
///         license: "ODbL".into(),
///     },
/// );
/// assert!(place.name.is_none());
/// assert_eq!(place.provenance.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    /// Source-local identifier; globally unique only after merging.
    pub id: String,
    /// Display name, absent or the unnamed sentinel until synthesised.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Category tags; kept sorted and deduplicated by the merge engine.
    #[serde(default)]
    pub categories: Vec<String>,
    /// Validated position, if any contributing source supplied one.
    #[serde(flatten)]
    pub coordinates: Option<LonLat>,
    /// External link (website or social profile).
    #[serde(default, rename = "website", skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// One attribution entry per contributing source.
    #[serde(rename = "sources")]
    pub provenance: Vec<Provenance>,
    /// Image URLs, grown during enrichment.
    #[serde(default)]
    pub images: Vec<String>,
    /// Raw opening-hours specification in the source mini-language.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opening_hours: Option<String>,
    /// Free-text description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether a booking channel was detected for the record's link.
    #[serde(default)]
    pub bookable: bool,
    /// Kind of booking channel, when one was detected.
    #[serde(default, rename = "bookingType", skip_serializing_if = "Option::is_none")]
    pub booking_type: Option<crate::BookingType>,
    /// Link validation outcome, flattened into `link_ok` and friends.
    #[serde(flatten)]
    pub link_status: Option<LinkCheck>,
    /// Live availability: `Some(true)`/`Some(false)` when confidently
    /// evaluated, `None` when unknown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_now: Option<bool>,
}

impl Place {
    /// Create an empty candidate record with its identity and attribution.
    pub fn new(id: impl Into<String>, provenance: Provenance) -> Self {
        Self {
            id: id.into(),
            name: None,
            categories: Vec::new(),
            coordinates: None,
            link: None,
            provenance: vec![provenance],
            images: Vec::new(),
            opening_hours: None,
            description: None,
            bookable: false,
            booking_type: None,
            link_status: None,
            open_now: None,
        }
    }
}

/// Extract the host of a URL, lower-cased and with a leading `www.`
/// stripped.
///
/// Returns `None` for unparseable URLs or URLs without a host component.
///
/// # Examples
/// ```
/// use utflykt_core::link_host;
///
/// assert_eq!(link_host("https://www.Example.se/x"), Some("example.se".into()));
/// assert_eq!(link_host("not a url"), None);
/// ```
pub fn link_host(link: &str) -> Option<String> {
    let url = Url::parse(link).ok()?;
    let host = url.host_str()?.to_ascii_lowercase();
    Some(host.strip_prefix("www.").unwrap_or(&host).to_owned())
}
