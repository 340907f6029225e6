//! Core domain types and pure logic for the Utflykt aggregation pipeline.
//!
//! Responsibilities:
//! - Define the place record shared by every source adapter.
//! - Collapse candidate records into a canonical set (identity & merge).
//! - Interpret the restricted opening-hours mini-language.
//! - Classify booking capability and synthesise display names.
//! - Declare the collaborator traits implemented by network adapters.
//!
//! Boundaries:
//! - No network or filesystem access; everything here is deterministic.
//! - Adapters and probes live in `utflykt-data`, sequencing in
//!   `utflykt-pipeline`.

pub mod bookable;
pub mod hours;
pub mod merge;
pub mod name;
pub mod place;
pub mod source;

pub use bookable::{BookingType, detect_booking_type};
pub use hours::{OpenState, evaluate};
pub use merge::merge_places;
pub use name::{UNNAMED, ensure_name};
pub use place::{LinkCheck, LonLat, Place, Provenance, link_host};
pub use source::{Enricher, EnrichError, PlaceSource, SourceError};
