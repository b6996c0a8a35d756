//! Per-leg speed/bearing diagnostics and whole-track summaries
//!
//! Both work on raw or filtered tracks alike and keep no state between calls.

use std::fmt::{Display, Formatter};

use chrono::Duration;
use serde::Serialize;

use crate::error::Result;
use crate::geodesy;
use crate::types::Fix;

/// Motion between a fix and its predecessor
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LegDiagnostic {
    /// Original index of the leg's end fix, or its position in the slice
    pub index: usize,
    /// m/s; `None` when either end lacks a timestamp or time did not advance
    pub speed: Option<f64>,
    /// Degrees from north, [0, 360)
    pub bearing: f64,
}

impl Display for LegDiagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.speed {
            Some(speed) => write!(f, "{:>6} {:>9.2} m/s {:>6.1}°", self.index, speed, self.bearing),
            None => write!(f, "{:>6} {:>9} m/s {:>6.1}°", self.index, "-", self.bearing),
        }
    }
}

/// Lazy iterator over consecutive legs; call [`legs`] again to start over.
///
/// A leg touching a non-finite or out-of-range position yields
/// [`TrackError::InvalidInput`](crate::error::TrackError::InvalidInput).
#[derive(Clone, Debug)]
pub struct Legs<'a> {
    fixes: &'a [Fix],
    next: usize,
}

pub fn legs(fixes: &[Fix]) -> Legs<'_> {
    Legs { fixes, next: 1 }
}

impl<'a> Iterator for Legs<'a> {
    type Item = Result<LegDiagnostic>;

    fn next(&mut self) -> Option<Self::Item> {
        let i = self.next;
        let current = self.fixes.get(i)?;
        let previous = &self.fixes[i - 1];
        self.next += 1;

        let meters = match geodesy::distance(&previous.position, &current.position) {
            Ok(meters) => f64::from(meters),
            Err(e) => return Some(Err(e)),
        };
        let speed = match (previous.timestamp, current.timestamp) {
            (Some(from), Some(to)) => {
                let secs = (to - from).num_milliseconds() as f64 / 1000.0;
                (secs > 0.0).then(|| meters / secs)
            }
            _ => None,
        };

        Some(Ok(LegDiagnostic {
            index: current.index.unwrap_or(i),
            speed,
            bearing: geodesy::bearing(&previous.position, &current.position),
        }))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.fixes.len().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Legs<'_> {}

/// Total length and elapsed time of a track
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackSummary {
    /// Sum of rounded leg distances, each leg counted once
    pub meters: f64,
    pub duration: Duration,
}

impl TrackSummary {
    pub fn empty() -> Self {
        Self {
            meters: 0.0,
            duration: Duration::zero(),
        }
    }
}

impl Display for TrackSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let secs = self.duration.num_seconds();
        write!(
            f,
            "{:.0} m in {:02}:{:02}:{:02}",
            self.meters,
            secs / 3600,
            (secs % 3600) / 60,
            secs % 60
        )
    }
}

/// Fails on the first leg with an invalid position rather than counting it as 0 m.
pub fn summarize(fixes: &[Fix]) -> Result<TrackSummary> {
    fixes
        .windows(2)
        .try_fold(TrackSummary::empty(), |mut summary, pair| {
            summary.meters += f64::from(geodesy::distance(&pair[0].position, &pair[1].position)?);
            if let (Some(from), Some(to)) = (pair[0].timestamp, pair[1].timestamp) {
                summary.duration = summary.duration + (to - from);
            }
            Ok(summary)
        })
}
