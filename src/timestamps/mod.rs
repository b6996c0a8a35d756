//! Timestamp repair stages
//!
//! The rollover corrector streams; the declusterer needs the whole track
//! resident because it rewrites a span only after seeing its far end.

pub mod decluster;
pub mod rollover;

pub use decluster::{decluster, CLUSTER_THRESHOLD};
pub use rollover::{correct_rollover, fix_rollover, ROLLOVER_YEAR};
