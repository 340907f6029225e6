//! Identity resolution and merge of candidate place records.
//!
//! Candidates from all sources are collapsed into a canonical set keyed on
//! (normalised name, normalised link host). Records carrying neither a name
//! nor a link host never merge with anything; a false merge on empty data
//! would be worse than a duplicate.
//!
//! Known limitation: places sharing a generic host (e.g. a common booking
//! platform) and a name can still over-merge, and the same physical place
//! listed under differing names can under-merge. The key deliberately stays
//! conservative rather than guessing.

use std::collections::HashMap;

use crate::place::{Place, link_host};

/// Identity key for a candidate record.
///
/// `None` means the record has neither a usable name nor a link host and
/// must always be inserted as a new canonical record.
fn identity_key(place: &Place) -> Option<(String, String)> {
    let name = place
        .name
        .as_deref()
        .map(|n| n.trim().to_lowercase())
        .unwrap_or_default();
    let host = place
        .link
        .as_deref()
        .and_then(link_host)
        .unwrap_or_default();
    if name.is_empty() && host.is_empty() {
        None
    } else {
        Some((name, host))
    }
}

/// Collapse an ordered candidate sequence into canonical records.
///
/// First-seen order of distinct identities is preserved. Merging is
/// idempotent: feeding a record twice yields the same canonical set as
/// feeding it once.
///
/// # Examples
/// ```
/// use utflykt_core::{merge_places, Place, Provenance};
///
/// let prov = Provenance {
///     name: "OSM".into(),
///     url: "https://osm.org".into(),
///     license: "ODbL".into(),
/// };
/// let mut a = Place::new("a", prov.clone());
/// a.name = Some("Tanto utegym".into());
/// let mut b = Place::new("b", prov);
/// b.name = Some("tanto utegym ".into());
///
/// assert_eq!(merge_places(vec![a, b]).len(), 1);
/// ```
pub fn merge_places(candidates: impl IntoIterator<Item = Place>) -> Vec<Place> {
    let mut by_key: HashMap<(String, String), usize> = HashMap::new();
    let mut out: Vec<Place> = Vec::new();
    for candidate in candidates {
        match identity_key(&candidate) {
            Some(key) => {
                if let Some(&slot) = by_key.get(&key) {
                    merge_into(&mut out[slot], candidate);
                } else {
                    by_key.insert(key, out.len());
                    out.push(candidate);
                }
            }
            None => out.push(candidate),
        }
    }
    out
}

/// Fold `incoming` into an existing canonical record.
///
/// Categories and images become the sorted union; coordinates are adopted
/// only when unset; populated scalars are never overwritten; provenance
/// accumulates one entry per contributing source.
fn merge_into(existing: &mut Place, incoming: Place) {
    union_sorted(&mut existing.categories, incoming.categories);
    union_sorted(&mut existing.images, incoming.images);
    if existing.coordinates.is_none() {
        existing.coordinates = incoming.coordinates;
    }
    if existing.link.is_none() {
        existing.link = incoming.link;
    }
    if existing.description.is_none() {
        existing.description = incoming.description;
    }
    if existing.opening_hours.is_none() {
        existing.opening_hours = incoming.opening_hours;
    }
    if existing.open_now.is_none() {
        existing.open_now = incoming.open_now;
    }
    for entry in incoming.provenance {
        if !existing.provenance.contains(&entry) {
            existing.provenance.push(entry);
        }
    }
}

/// Extend `target` with `extra`, then sort and deduplicate for stable
/// output.
fn union_sorted(target: &mut Vec<String>, extra: Vec<String>) {
    target.extend(extra);
    target.sort();
    target.dedup();
}
