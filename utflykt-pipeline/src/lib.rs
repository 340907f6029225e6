//! Orchestrates the aggregation pipeline over one shared record collection.
//!
//! Stages run to completion in order: collect → merge → enrich → booking →
//! names → link validation → opening hours. Stages after the merge are
//! independent per record and never reorder the collection, so the whole
//! run needs no per-record locking. The only internal fan-out is the link
//! validator's bounded concurrency.
//!
//! Nothing here aborts the run: a failed source or probe degrades to
//! missing data and an entry in the run report.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use utflykt_core::{
    Enricher, OpenState, Place, PlaceSource, detect_booking_type, ensure_name, evaluate,
    merge_places,
};
use utflykt_data::LinkChecker;

pub mod output;

pub use output::{feature_collection, places_json};

/// Budgets and locale for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum number of records enriched from their websites.
    pub enrich_max: usize,
    /// Maximum number of records whose links are validated.
    pub linkcheck_max: usize,
    /// Cap on simultaneous in-flight link probes.
    pub linkcheck_concurrency: usize,
    /// Zone in which opening hours are evaluated.
    pub timezone: Tz,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            enrich_max: 200,
            linkcheck_max: 200,
            linkcheck_concurrency: utflykt_data::linkcheck::DEFAULT_CONCURRENCY,
            timezone: chrono_tz::Europe::Stockholm,
        }
    }
}

/// Outcome of fetching one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    /// Source name as reported by the adapter.
    pub name: String,
    /// Candidate records contributed.
    pub records: usize,
    /// Failure description when the fetch degraded to zero records.
    pub error: Option<String>,
}

/// Stage counts for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    /// Per-source outcomes in wiring order.
    pub sources: Vec<SourceReport>,
    /// Candidate records before merging.
    pub candidates: usize,
    /// Canonical records after merging.
    pub canonical: usize,
    /// Records whose websites were actually fetched for enrichment.
    pub enriched: usize,
    /// Records whose links were probed.
    pub links_checked: usize,
    /// Records whose opening hours evaluated to a confident result.
    pub hours_evaluated: usize,
}

/// Final collection plus the run report.
#[derive(Debug)]
pub struct PipelineRun {
    /// Canonical records in first-seen order.
    pub places: Vec<Place>,
    /// What happened along the way.
    pub report: PipelineReport,
}

/// Run the full pipeline at the current instant.
pub async fn run(
    sources: &[Box<dyn PlaceSource>],
    enricher: &dyn Enricher,
    checker: &LinkChecker,
    config: &PipelineConfig,
) -> PipelineRun {
    run_at(sources, enricher, checker, config, Utc::now()).await
}

/// Run the full pipeline, evaluating opening hours at `instant`.
///
/// Exposed separately so runs are reproducible under test.
pub async fn run_at(
    sources: &[Box<dyn PlaceSource>],
    enricher: &dyn Enricher,
    checker: &LinkChecker,
    config: &PipelineConfig,
    instant: DateTime<Utc>,
) -> PipelineRun {
    let mut report = PipelineReport::default();

    let candidates = collect_candidates(sources, &mut report).await;
    report.candidates = candidates.len();

    let mut places = merge_places(candidates);
    report.canonical = places.len();

    report.enriched = enrich_stage(&mut places, enricher, config.enrich_max).await;
    classify_booking(&mut places);
    for place in &mut places {
        ensure_name(place);
    }
    report.links_checked = linkcheck_stage(&mut places, checker, config).await;
    report.hours_evaluated = hours_stage(&mut places, &instant.with_timezone(&config.timezone));

    log::info!(
        "pipeline: {} candidates from {} sources, {} canonical, {} enriched, {} links checked",
        report.candidates,
        report.sources.len(),
        report.canonical,
        report.enriched,
        report.links_checked,
    );
    PipelineRun { places, report }
}

/// Fetch every source, absorbing failures into the report.
async fn collect_candidates(
    sources: &[Box<dyn PlaceSource>],
    report: &mut PipelineReport,
) -> Vec<Place> {
    let mut candidates = Vec::new();
    for source in sources {
        match source.fetch().await {
            Ok(records) => {
                report.sources.push(SourceReport {
                    name: source.name().to_owned(),
                    records: records.len(),
                    error: None,
                });
                candidates.extend(records);
            }
            Err(err) => {
                log::warn!("source {} failed: {err}", source.name());
                report.sources.push(SourceReport {
                    name: source.name().to_owned(),
                    records: 0,
                    error: Some(err.to_string()),
                });
            }
        }
    }
    candidates
}

/// Enrich linked records until the page budget is spent.
async fn enrich_stage(places: &mut [Place], enricher: &dyn Enricher, budget: usize) -> usize {
    let mut fetched = 0usize;
    for place in places.iter_mut() {
        if fetched >= budget {
            break;
        }
        match enricher.enrich(place).await {
            Ok(true) => fetched += 1,
            Ok(false) => {}
            Err(err) => log::debug!("enrichment skipped for {}: {err}", place.id),
        }
    }
    fetched
}

fn classify_booking(places: &mut [Place]) {
    for place in places.iter_mut() {
        if let Some(kind) = place.link.as_deref().and_then(detect_booking_type) {
            place.bookable = true;
            place.booking_type = Some(kind);
        }
    }
}

/// Probe links for up to the configured number of linked records.
///
/// Outcomes are zipped back positionally onto the sampled records, so the
/// collection order never changes regardless of probe completion order.
async fn linkcheck_stage(
    places: &mut [Place],
    checker: &LinkChecker,
    config: &PipelineConfig,
) -> usize {
    let sampled: Vec<usize> = places
        .iter()
        .enumerate()
        .filter(|(_, place)| place.link.is_some())
        .map(|(index, _)| index)
        .take(config.linkcheck_max)
        .collect();
    let urls: Vec<String> = sampled
        .iter()
        .filter_map(|&index| places[index].link.clone())
        .collect();
    let outcomes = checker
        .check_all(&urls, config.linkcheck_concurrency)
        .await;
    let checked = outcomes.len();
    for (&index, outcome) in sampled.iter().zip(outcomes) {
        places[index].link_status = Some(outcome);
    }
    checked
}

/// Evaluate opening hours, leaving `open_now` untouched on `Unknown`.
fn hours_stage(places: &mut [Place], now: &DateTime<Tz>) -> usize {
    let mut evaluated = 0usize;
    for place in places.iter_mut() {
        let Some(spec) = place.opening_hours.as_deref() else {
            continue;
        };
        if spec.trim().is_empty() {
            continue;
        }
        match evaluate(spec, now) {
            OpenState::Unknown => {}
            state => {
                place.open_now = state.as_open_now();
                evaluated += 1;
            }
        }
    }
    evaluated
}
