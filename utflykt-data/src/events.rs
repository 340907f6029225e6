//! Calendar-feed adapter producing event records.
//!
//! Events are a separate artefact from places: they carry a date instead
//! of coordinates and are published as their own dump. The parser handles
//! the ICS subset these feeds actually use: folded lines, `VEVENT` blocks,
//! and properties with optional parameters (`DTSTART;TZID=...`).

use chrono::{NaiveDate, NaiveDateTime};
use reqwest::Client;
use serde::Serialize;

/// One calendar entry from an ICS feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    /// Event title; feeds without a summary get a generic fallback.
    pub name: String,
    /// ISO-8601 start, or the raw ICS value when it cannot be parsed.
    pub date: String,
    /// Venue text; defaults to the country when the feed omits it.
    pub location: String,
    /// Free-text description.
    pub description: String,
    /// Event classification tag in the published dump.
    #[serde(rename = "eventType")]
    pub event_type: String,
    /// Registration or detail URL, if the feed carries one.
    #[serde(rename = "registrationUrl", skip_serializing_if = "Option::is_none")]
    pub registration_url: Option<String>,
}

/// Fetch every feed and collect its events, sorted by date string.
///
/// A failed feed contributes zero events; the batch never fails.
pub async fn fetch_events(client: &Client, urls: &[String]) -> Vec<Event> {
    let mut events = Vec::new();
    for url in urls.iter().filter(|u| !u.trim().is_empty()) {
        let body = match client.get(url).send().await {
            Ok(response) => match response.error_for_status() {
                Ok(response) => response.text().await.ok(),
                Err(err) => {
                    log::warn!("event feed {url} rejected: {err}");
                    None
                }
            },
            Err(err) => {
                log::warn!("event feed {url} unreachable: {err}");
                None
            }
        };
        if let Some(body) = body {
            events.extend(parse_ics(&body));
        }
    }
    events.sort_by(|a, b| a.date.cmp(&b.date));
    events
}

/// Parse the `VEVENT` blocks of an ICS document.
pub fn parse_ics(text: &str) -> Vec<Event> {
    let mut events = Vec::new();
    let mut current: Option<Vec<(String, String)>> = None;
    for line in unfold_lines(text) {
        if line.eq_ignore_ascii_case("BEGIN:VEVENT") {
            current = Some(Vec::new());
            continue;
        }
        if line.eq_ignore_ascii_case("END:VEVENT") {
            if let Some(properties) = current.take() {
                events.push(event_from(&properties));
            }
            continue;
        }
        if let (Some(properties), Some((key, value))) = (current.as_mut(), split_property(&line)) {
            properties.push((key, value));
        }
    }
    events
}

/// Join folded continuation lines (leading space or tab) per RFC 5545.
fn unfold_lines(text: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for raw in text.lines() {
        if let Some(rest) = raw.strip_prefix(' ').or_else(|| raw.strip_prefix('\t')) {
            if let Some(last) = lines.last_mut() {
                last.push_str(rest);
                continue;
            }
        }
        lines.push(raw.trim_end_matches('\r').to_owned());
    }
    lines
}

/// Split `KEY;PARAM=...:value` into the bare key and its value.
fn split_property(line: &str) -> Option<(String, String)> {
    let (name, value) = line.split_once(':')?;
    let key = name.split(';').next().unwrap_or(name);
    Some((key.to_ascii_uppercase(), value.trim().to_owned()))
}

fn event_from(properties: &[(String, String)]) -> Event {
    let get = |key: &str| {
        properties
            .iter()
            .find(|(k, _)| k.as_str() == key)
            .map(|(_, v)| v.trim())
            .filter(|v| !v.is_empty())
    };
    Event {
        name: get("SUMMARY").unwrap_or("Evenemang").to_owned(),
        date: get("DTSTART").map(normalise_date).unwrap_or_default(),
        location: get("LOCATION").unwrap_or("Sverige").to_owned(),
        description: get("DESCRIPTION").unwrap_or_default().to_owned(),
        event_type: "evenemang".to_owned(),
        registration_url: get("URL").map(str::to_owned),
    }
}

/// Convert ICS date values to ISO-8601, keeping the raw value as a
/// fallback so sorting stays stable for unparseable feeds.
fn normalise_date(value: &str) -> String {
    let bare = value.trim_end_matches('Z');
    if let Ok(datetime) = NaiveDateTime::parse_from_str(bare, "%Y%m%dT%H%M%S") {
        return if value.ends_with('Z') {
            format!("{}+00:00", datetime.format("%Y-%m-%dT%H:%M:%S"))
        } else {
            datetime.format("%Y-%m-%dT%H:%M:%S").to_string()
        };
    }
    if let Ok(date) = NaiveDate::parse_from_str(bare, "%Y%m%d") {
        return date.format("%Y-%m-%d").to_string();
    }
    value.to_owned()
}
