//! Serialisation of the canonical collection into its published shapes.
//!
//! Two dumps come out of a run: the flat place array consumed by the app,
//! and a GeoJSON `FeatureCollection` for mapping tools. Only records with
//! coordinates appear in the feature collection; the flat dump carries
//! everything.

use geo::{Coord, Rect};
use serde_json::{Value, json};
use utflykt_core::{LonLat, Place};

/// Serialise the canonical collection as the flat place array.
pub fn places_json(places: &[Place]) -> Result<Value, serde_json::Error> {
    serde_json::to_value(places)
}

/// Build a GeoJSON `FeatureCollection` from the records that carry
/// coordinates.
///
/// Records without an id get a positional fallback so every feature is
/// addressable. The collection-level `bbox` covers all emitted features
/// and is omitted when none have coordinates.
pub fn feature_collection(places: &[Place]) -> Value {
    let mut features = Vec::new();
    let mut bounds: Option<Rect<f64>> = None;

    for (index, place) in places.iter().enumerate() {
        let Some(coordinates) = place.coordinates else {
            continue;
        };
        bounds = Some(merge_bounds(bounds, coordinates.coord()));
        features.push(feature(place, coordinates, index));
    }

    let mut collection = json!({
        "type": "FeatureCollection",
        "features": features,
    });
    if let (Some(rect), Some(object)) = (bounds, collection.as_object_mut()) {
        object.insert(
            "bbox".to_owned(),
            json!([rect.min().x, rect.min().y, rect.max().x, rect.max().y]),
        );
    }
    collection
}

fn feature(place: &Place, coordinates: LonLat, index: usize) -> Value {
    let id = if place.id.trim().is_empty() {
        format!("place/{index}")
    } else {
        place.id.clone()
    };
    json!({
        "type": "Feature",
        "id": id,
        "geometry": {
            "type": "Point",
            "coordinates": [coordinates.lon, coordinates.lat],
        },
        "properties": {
            "id": id,
            "name": place.name,
            "categories": place.categories,
            "website": place.link,
            "source_url": place.provenance.first().map(|p| p.url.clone()),
            "bookable": place.bookable,
            "open_now": place.open_now,
            "link_ok": place.link_status.as_ref().map(|status| status.ok),
        },
    })
}

/// Grow `bounds` to cover `point`.
fn merge_bounds(bounds: Option<Rect<f64>>, point: Coord<f64>) -> Rect<f64> {
    match bounds {
        None => Rect::new(point, point),
        Some(rect) => Rect::new(
            Coord {
                x: rect.min().x.min(point.x),
                y: rect.min().y.min(point.y),
            },
            Coord {
                x: rect.max().x.max(point.x),
                y: rect.max().y.max(point.y),
            },
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use utflykt_core::{LonLat, Provenance};

    fn place(id: &str, coordinates: Option<LonLat>) -> Place {
        let mut place = Place::new(
            id,
            Provenance {
                name: "Test".into(),
                url: format!("https://data.example.se/{id}"),
                license: "CC0".into(),
            },
        );
        place.name = Some(format!("Place {id}"));
        place.coordinates = coordinates;
        place
    }

    #[rstest]
    fn only_located_records_become_features() {
        let places = vec![
            place("a", Some(LonLat { lat: 59.3, lon: 18.0 })),
            place("b", None),
            place("c", Some(LonLat { lat: 57.7, lon: 11.9 })),
        ];
        let collection = feature_collection(&places);
        let features = collection["features"].as_array().expect("array");
        assert_eq!(features.len(), 2);
        assert_eq!(features[0]["id"], "a");
        assert_eq!(features[1]["id"], "c");
    }

    #[rstest]
    fn bbox_covers_all_features() {
        let places = vec![
            place("a", Some(LonLat { lat: 59.3, lon: 18.0 })),
            place("c", Some(LonLat { lat: 57.7, lon: 11.9 })),
        ];
        let collection = feature_collection(&places);
        assert_eq!(collection["bbox"], json!([11.9, 57.7, 18.0, 59.3]));
    }

    #[rstest]
    fn empty_collection_has_no_bbox() {
        let collection = feature_collection(&[place("a", None)]);
        assert!(collection.get("bbox").is_none());
        assert!(collection["features"].as_array().expect("array").is_empty());
    }

    #[rstest]
    fn geometry_is_lon_lat_ordered() {
        let places = vec![place("a", Some(LonLat { lat: 59.3, lon: 18.0 }))];
        let collection = feature_collection(&places);
        assert_eq!(
            collection["features"][0]["geometry"]["coordinates"],
            json!([18.0, 59.3])
        );
    }

    #[rstest]
    fn blank_ids_get_positional_fallbacks() {
        let places = vec![
            place("a", Some(LonLat { lat: 59.0, lon: 18.0 })),
            place("", Some(LonLat { lat: 58.0, lon: 17.0 })),
        ];
        let collection = feature_collection(&places);
        assert_eq!(collection["features"][1]["id"], "place/1");
    }

    #[rstest]
    fn flat_dump_serialises_every_record() {
        let places = vec![place("a", None), place("b", None)];
        let value = places_json(&places).expect("serialises");
        assert_eq!(value.as_array().expect("array").len(), 2);
    }
}
