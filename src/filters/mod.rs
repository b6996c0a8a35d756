pub mod track_filter;

pub use track_filter::{FilterParameters, FilterStream, TrackFilter, MIN_DT_SECS};
