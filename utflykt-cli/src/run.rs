//! Run command implementation for the Utflykt CLI.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::fs_utf8;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use utflykt_core::PlaceSource;
use utflykt_data::{
    CrawlLimits, DatasetSource, Event, LinkChecker, MunicipalCrawler, OpenGraphEnricher,
    OverpassSource, build_client, fetch_events,
};
use utflykt_pipeline::{PipelineConfig, PipelineRun, feature_collection, places_json};

use crate::{CliError, fs::open_output_dir};

/// CLI arguments for the `run` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Fetch the configured open-data feeds, crawl sites, and \
                 event calendars, collapse the results into one canonical \
                 collection, and write places.json, places.geojson, and \
                 events.json under the output directory. Options can come \
                 from CLI flags, configuration files, or environment \
                 variables.",
    about = "Aggregate configured sources into the published dumps"
)]
#[ortho_config(prefix = "UTFLYKT")]
pub(crate) struct RunArgs {
    /// Query OpenStreetMap via the public Overpass endpoints.
    #[arg(long = "osm")]
    #[serde(default)]
    osm: bool,
    /// Overpass endpoint to query instead of the defaults; repeatable,
    /// implies `--osm`.
    #[arg(long = "overpass-endpoint", value_name = "url")]
    #[serde(default)]
    overpass_endpoints: Vec<String>,
    /// Open-data feed to ingest, as `activity=url`; repeatable.
    #[arg(long = "dataset", value_name = "activity=url")]
    #[serde(default)]
    datasets: Vec<String>,
    /// Municipal site to crawl for places; repeatable.
    #[arg(long = "crawl-site", value_name = "url")]
    #[serde(default)]
    crawl_sites: Vec<String>,
    /// iCalendar feed contributing events; repeatable.
    #[arg(long = "event-feed", value_name = "url")]
    #[serde(default)]
    event_feeds: Vec<String>,
    /// Page budget per crawled site.
    #[arg(long = "max-pages", value_name = "n")]
    #[serde(default)]
    max_pages: Option<usize>,
    /// Link depth budget per crawled site.
    #[arg(long = "max-depth", value_name = "n")]
    #[serde(default)]
    max_depth: Option<usize>,
    /// Maximum number of records enriched from their websites.
    #[arg(long = "enrich-max", value_name = "n")]
    #[serde(default)]
    enrich_max: Option<usize>,
    /// Maximum number of records whose links are validated.
    #[arg(long = "linkcheck-max", value_name = "n")]
    #[serde(default)]
    linkcheck_max: Option<usize>,
    /// Cap on simultaneous in-flight link probes.
    #[arg(long = "linkcheck-concurrency", value_name = "n")]
    #[serde(default)]
    linkcheck_concurrency: Option<usize>,
    /// IANA zone for opening-hours evaluation.
    #[arg(long = "timezone", value_name = "zone")]
    #[serde(default)]
    timezone: Option<String>,
    /// Directory receiving the dumps.
    #[arg(long = "output-dir", value_name = "dir")]
    #[serde(default)]
    output_dir: Option<Utf8PathBuf>,
}

impl RunArgs {
    fn into_config(self) -> Result<RunConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        RunConfig::try_from(merged)
    }
}

/// One open-data feed and the activity tag its records carry.
#[derive(Debug, Clone, PartialEq, Eq)]
struct DatasetSpec {
    activity: String,
    url: String,
}

/// Resolved `run` command configuration.
#[derive(Debug, Clone)]
struct RunConfig {
    /// `Some` enables the OSM source; an empty list means the default
    /// public endpoints.
    overpass: Option<Vec<String>>,
    datasets: Vec<DatasetSpec>,
    crawl_sites: Vec<String>,
    event_feeds: Vec<String>,
    crawl_limits: CrawlLimits,
    pipeline: PipelineConfig,
    output_dir: Utf8PathBuf,
}

impl TryFrom<RunArgs> for RunConfig {
    type Error = CliError;

    fn try_from(args: RunArgs) -> Result<Self, Self::Error> {
        let datasets = args
            .datasets
            .iter()
            .map(|spec| parse_dataset_spec(spec))
            .collect::<Result<_, _>>()?;

        let crawl_defaults = CrawlLimits::default();
        let crawl_limits = CrawlLimits {
            max_pages: args.max_pages.unwrap_or(crawl_defaults.max_pages),
            max_depth: args.max_depth.unwrap_or(crawl_defaults.max_depth),
            delay: crawl_defaults.delay,
        };

        let pipeline_defaults = PipelineConfig::default();
        let timezone = match args.timezone {
            Some(value) => value
                .parse()
                .map_err(|_| CliError::InvalidTimezone { value })?,
            None => pipeline_defaults.timezone,
        };
        let pipeline = PipelineConfig {
            enrich_max: args.enrich_max.unwrap_or(pipeline_defaults.enrich_max),
            linkcheck_max: args.linkcheck_max.unwrap_or(pipeline_defaults.linkcheck_max),
            linkcheck_concurrency: args
                .linkcheck_concurrency
                .unwrap_or(pipeline_defaults.linkcheck_concurrency),
            timezone,
        };

        let overpass = if !args.overpass_endpoints.is_empty() {
            Some(args.overpass_endpoints)
        } else if args.osm {
            Some(Vec::new())
        } else {
            None
        };

        Ok(Self {
            overpass,
            datasets,
            crawl_sites: args.crawl_sites,
            event_feeds: args.event_feeds,
            crawl_limits,
            pipeline,
            output_dir: args.output_dir.unwrap_or_else(|| Utf8PathBuf::from("data")),
        })
    }
}

fn parse_dataset_spec(spec: &str) -> Result<DatasetSpec, CliError> {
    let invalid = || CliError::InvalidDataset {
        value: spec.to_owned(),
    };
    let (activity, url) = spec.split_once('=').ok_or_else(invalid)?;
    let activity = activity.trim();
    let url = url.trim();
    if activity.is_empty() || url.is_empty() {
        return Err(invalid());
    }
    Ok(DatasetSpec {
        activity: activity.to_owned(),
        url: url.to_owned(),
    })
}

pub(crate) fn execute(args: RunArgs) -> Result<(), CliError> {
    let config = args.into_config()?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    runtime.block_on(execute_with(config))
}

async fn execute_with(config: RunConfig) -> Result<(), CliError> {
    let client = build_client()?;
    let sources = wire_sources(&client, &config);
    let enricher = OpenGraphEnricher::with_client(client.clone());
    let checker = LinkChecker::with_client(client.clone());

    let run = utflykt_pipeline::run(&sources, &enricher, &checker, &config.pipeline).await;
    let events = fetch_events(&client, &config.event_feeds).await;
    write_outputs(&config.output_dir, &run, &events)?;

    eprintln!(
        "utflykt: {} places from {} sources ({} enriched, {} links checked, \
         {} hours evaluated), {} events -> {}",
        run.report.canonical,
        run.report.sources.len(),
        run.report.enriched,
        run.report.links_checked,
        run.report.hours_evaluated,
        events.len(),
        config.output_dir,
    );
    Ok(())
}

fn wire_sources(client: &reqwest::Client, config: &RunConfig) -> Vec<Box<dyn PlaceSource>> {
    let mut sources: Vec<Box<dyn PlaceSource>> = Vec::new();
    if let Some(endpoints) = &config.overpass {
        let source = if endpoints.is_empty() {
            OverpassSource::new(client.clone())
        } else {
            OverpassSource::with_endpoints(client.clone(), endpoints.clone())
        };
        sources.push(Box::new(source));
    }
    for dataset in &config.datasets {
        sources.push(Box::new(DatasetSource::new(
            client.clone(),
            dataset.url.clone(),
            dataset.activity.clone(),
        )));
    }
    for site in &config.crawl_sites {
        sources.push(Box::new(MunicipalCrawler::new(
            client.clone(),
            site.clone(),
            config.crawl_limits.clone(),
        )));
    }
    sources
}

/// Write the dumps under the output directory.
///
/// `events.json` only appears when at least one event was fetched, so a run
/// without calendar feeds leaves no stale artefact behind.
fn write_outputs(dir_path: &Utf8Path, run: &PipelineRun, events: &[Event]) -> Result<(), CliError> {
    let dir = open_output_dir(dir_path).map_err(|source| CliError::OpenOutputDir {
        path: dir_path.to_path_buf(),
        source,
    })?;

    let places = places_json(&run.places).map_err(|source| CliError::SerialiseOutput {
        name: "places.json",
        source,
    })?;
    write_json(&dir, dir_path, "places.json", &places)?;
    write_json(&dir, dir_path, "places.geojson", &feature_collection(&run.places))?;

    if !events.is_empty() {
        let value = serde_json::to_value(events).map_err(|source| CliError::SerialiseOutput {
            name: "events.json",
            source,
        })?;
        write_json(&dir, dir_path, "events.json", &value)?;
    }
    Ok(())
}

fn write_json(
    dir: &fs_utf8::Dir,
    dir_path: &Utf8Path,
    name: &'static str,
    value: &serde_json::Value,
) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(value).map_err(|source| CliError::SerialiseOutput {
        name,
        source,
    })?;
    dir.write(name, format!("{payload}\n"))
        .map_err(|source| CliError::WriteOutput {
            name,
            path: dir_path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use utflykt_core::{LonLat, Place, Provenance};
    use utflykt_pipeline::PipelineReport;

    #[rstest]
    #[case("swimming=https://data.example.se/bad", "swimming", "https://data.example.se/bad")]
    #[case(" gym = https://data.example.se/gym ", "gym", "https://data.example.se/gym")]
    fn dataset_specs_parse(#[case] spec: &str, #[case] activity: &str, #[case] url: &str) {
        let parsed = parse_dataset_spec(spec).expect("valid spec");
        assert_eq!(parsed.activity, activity);
        assert_eq!(parsed.url, url);
    }

    #[rstest]
    #[case("no-separator")]
    #[case("=https://data.example.se/bad")]
    #[case("swimming=")]
    fn malformed_dataset_specs_are_rejected(#[case] spec: &str) {
        let err = parse_dataset_spec(spec).expect_err("invalid spec");
        assert!(matches!(err, CliError::InvalidDataset { .. }));
    }

    #[rstest]
    fn defaults_fill_unset_options() {
        let config = RunConfig::try_from(RunArgs::default()).expect("defaults resolve");
        assert!(config.overpass.is_none(), "OSM querying is opt-in");
        assert_eq!(config.output_dir, Utf8PathBuf::from("data"));
        assert_eq!(config.pipeline.enrich_max, 200);
        assert_eq!(config.pipeline.linkcheck_max, 200);
        assert_eq!(config.pipeline.linkcheck_concurrency, 10);
        assert_eq!(config.pipeline.timezone, chrono_tz::Europe::Stockholm);
        assert_eq!(config.crawl_limits.max_pages, 25);
        assert_eq!(config.crawl_limits.max_depth, 2);
    }

    #[rstest]
    fn osm_flag_enables_overpass_with_default_endpoints() {
        let args = RunArgs {
            osm: true,
            ..RunArgs::default()
        };
        let config = RunConfig::try_from(args).expect("flag resolves");
        assert_eq!(config.overpass, Some(Vec::new()));
    }

    #[rstest]
    fn explicit_overpass_endpoints_imply_the_source() {
        let args = RunArgs {
            overpass_endpoints: vec!["https://overpass.example.se/api".into()],
            ..RunArgs::default()
        };
        let config = RunConfig::try_from(args).expect("endpoints resolve");
        assert_eq!(
            config.overpass,
            Some(vec!["https://overpass.example.se/api".to_owned()])
        );
    }

    #[rstest]
    fn unknown_timezone_is_rejected() {
        let args = RunArgs {
            timezone: Some("Mars/Olympus_Mons".into()),
            ..RunArgs::default()
        };
        let err = RunConfig::try_from(args).expect_err("bad zone");
        assert!(matches!(err, CliError::InvalidTimezone { .. }));
    }

    #[rstest]
    fn overrides_replace_defaults() {
        let args = RunArgs {
            enrich_max: Some(5),
            max_pages: Some(3),
            timezone: Some("Europe/Oslo".into()),
            ..RunArgs::default()
        };
        let config = RunConfig::try_from(args).expect("overrides resolve");
        assert_eq!(config.pipeline.enrich_max, 5);
        assert_eq!(config.crawl_limits.max_pages, 3);
        assert_eq!(config.pipeline.timezone, chrono_tz::Europe::Oslo);
    }

    #[rstest]
    fn dumps_land_in_the_output_directory() {
        let mut place = Place::new(
            "muni/1",
            Provenance {
                name: "Municipal".into(),
                url: "https://data.example.se/set".into(),
                license: "CC0".into(),
            },
        );
        place.name = Some("Badplats".into());
        place.coordinates = Some(LonLat {
            lat: 59.3,
            lon: 18.0,
        });
        let run = PipelineRun {
            places: vec![place],
            report: PipelineReport::default(),
        };
        let events = vec![Event {
            name: "Naturvandring".into(),
            date: "2024-06-01".into(),
            location: "Sverige".into(),
            description: String::new(),
            event_type: "evenemang".into(),
            registration_url: None,
        }];

        let tmp = tempfile::tempdir().expect("tempdir");
        let out = Utf8PathBuf::from_path_buf(tmp.path().join("dumps")).expect("utf-8 path");
        write_outputs(&out, &run, &events).expect("outputs written");

        let places: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(out.join("places.json")).expect("places.json"),
        )
        .expect("valid JSON");
        assert_eq!(places.as_array().expect("array").len(), 1);
        let geojson: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(out.join("places.geojson")).expect("places.geojson"),
        )
        .expect("valid JSON");
        assert_eq!(geojson["type"], "FeatureCollection");
        assert!(out.join("events.json").as_std_path().is_file());
    }

    #[rstest]
    fn eventless_runs_write_no_events_file() {
        let run = PipelineRun {
            places: Vec::new(),
            report: PipelineReport::default(),
        };
        let tmp = tempfile::tempdir().expect("tempdir");
        let out = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 path");
        write_outputs(&out, &run, &[]).expect("outputs written");
        assert!(!out.join("events.json").as_std_path().exists());
    }
}
