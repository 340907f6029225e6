//! Error types emitted by the Utflykt CLI.
//!
//! Only configuration and output failures are fatal; source and probe
//! failures are absorbed by the pipeline and surface in the run report.

use std::sync::Arc;

use camino::Utf8PathBuf;
use thiserror::Error;
use utflykt_data::ClientBuildError;

/// Errors emitted by the Utflykt CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A dataset specification is not of the form `activity=url`.
    #[error("invalid dataset {value:?} (expected activity=url)")]
    InvalidDataset { value: String },
    /// The configured time zone is not a known IANA zone name.
    #[error("unknown time zone {value:?}")]
    InvalidTimezone { value: String },
    /// Building the shared HTTP client failed.
    #[error(transparent)]
    Client(#[from] ClientBuildError),
    /// Starting the async runtime failed.
    #[error("failed to start runtime: {0}")]
    Runtime(#[source] std::io::Error),
    /// The output directory could not be created or opened.
    #[error("failed to open output directory {path:?}: {source}")]
    OpenOutputDir {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Serialising a dump failed.
    #[error("failed to serialise {name}: {source}")]
    SerialiseOutput {
        name: &'static str,
        #[source]
        source: serde_json::Error,
    },
    /// Writing a dump to disk failed.
    #[error("failed to write {name} under {path:?}: {source}")]
    WriteOutput {
        name: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}
