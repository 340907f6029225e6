//! Facade crate for the Utflykt aggregation pipeline.
//!
//! Re-exports the domain types, the network adapters, and the orchestrator
//! so library users depend on a single crate.

#![forbid(unsafe_code)]

pub use utflykt_core::{
    BookingType, EnrichError, Enricher, LinkCheck, LonLat, OpenState, Place, PlaceSource,
    Provenance, SourceError, UNNAMED, detect_booking_type, ensure_name, evaluate, link_host,
    merge_places,
};

pub use utflykt_data::{
    CrawlLimits, DatasetSource, Event, LinkChecker, MunicipalCrawler, OpenGraphEnricher,
    OverpassSource, build_client, fetch_events,
};

pub use utflykt_pipeline::{
    PipelineConfig, PipelineReport, PipelineRun, SourceReport, feature_collection, places_json,
    run, run_at,
};
