use std::path::PathBuf;

use thiserror::Error;

/// Construction-time failures. Nothing in a running tick produces one of these.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("maze layout is empty")]
    EmptyLayout,

    #[error("maze row {row} has width {found}, expected {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("unknown cell code {code:?} at ({x}, {y})")]
    UnknownCell { code: char, x: usize, y: usize },

    #[error("maze layout has no player start cell")]
    MissingPlayerStart,

    #[error("maze layout has no ghost house center")]
    MissingGhostHouse,

    #[error("maze layout has no ghost house exit")]
    MissingHouseExit,

    #[error("marker {marker:?} appears more than once")]
    DuplicateMarker { marker: char },

    #[error("no level layouts configured")]
    NoLevels,

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}
