//! Cleaning of noisy consumer GPS tracks.
//!
//! Raw fixes go through three stages: week-rollover timestamp repair,
//! declustering of buffered timestamps, and a recursive position filter that
//! drops teleports and smooths jitter. [`pipeline::clean`] runs all three.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod filters;
pub mod geodesy;
pub mod pipeline;
pub mod timestamps;
pub mod track;
pub mod types;

pub use error::{Result, TrackError};
pub use filters::{FilterParameters, TrackFilter};
pub use types::{Fix, FixKind, Motion, Position};
