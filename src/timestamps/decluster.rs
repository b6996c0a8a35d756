use chrono::{DateTime, Duration, FixedOffset};

use crate::error::{Result, TrackError};
use crate::types::Fix;

/// Timestamp jump that counts as an anomaly (strictly greater)
pub const CLUSTER_THRESHOLD: Duration = Duration::seconds(30);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DeclusterState {
    Normal,
    /// Saw a forward jump after `anchor`, waiting for the backward correction
    GapUp { anchor: usize },
    /// Saw a backward jump after `anchor`, waiting for the forward correction
    GapDown { anchor: usize },
}

/// Spreads clustered timestamps evenly between matched jump pairs.
///
/// Buffered-then-flushed receivers produce a forward jump followed later by
/// a backward one (or the reverse). Once both ends of such a span are seen,
/// the interior instants are rewritten to even steps between the two anchors.
/// Positions, motion and indices are never touched.
///
/// While a gap is pending, further jumps in the same direction are ignored:
/// the anchor stays bound to the first unresolved jump. A gap still pending
/// at the end of the track is dropped without correction.
pub fn decluster(mut fixes: Vec<Fix>) -> Result<Vec<Fix>> {
    let instants = fixes
        .iter()
        .enumerate()
        .map(|(i, fix)| {
            fix.timestamp.ok_or_else(|| {
                TrackError::InvalidInput(format!("fix {i} has no timestamp to decluster"))
            })
        })
        .collect::<Result<Vec<DateTime<FixedOffset>>>>()?;

    let threshold = nanos(CLUSTER_THRESHOLD)?;
    let mut state = DeclusterState::Normal;

    for i in 1..instants.len() {
        let delta = nanos(instants[i] - instants[i - 1])?;

        state = match state {
            DeclusterState::Normal if delta > threshold => DeclusterState::GapUp { anchor: i - 1 },
            DeclusterState::Normal if delta < -threshold => {
                DeclusterState::GapDown { anchor: i - 1 }
            }
            DeclusterState::GapUp { anchor } if delta < -threshold => {
                redistribute(&mut fixes, &instants, anchor, i)?;
                DeclusterState::Normal
            }
            DeclusterState::GapDown { anchor } if delta > threshold => {
                redistribute(&mut fixes, &instants, anchor, i)?;
                DeclusterState::Normal
            }
            other => other,
        };
    }

    match state {
        DeclusterState::GapUp { anchor } | DeclusterState::GapDown { anchor } => {
            log::warn!(
                "Unmatched timestamp jump after fix {} left uncorrected at end of track",
                anchor
            );
        }
        DeclusterState::Normal => {}
    }

    Ok(fixes)
}

/// Rewrites fixes strictly between `a` and `b` to `t[a] + step * k`.
///
/// Reads anchors from `instants`, which still holds the input instants;
/// a resolved span never overlaps an earlier one, so both anchors are unmodified.
fn redistribute(
    fixes: &mut [Fix],
    instants: &[DateTime<FixedOffset>],
    a: usize,
    b: usize,
) -> Result<()> {
    let interior = b - a - 1;
    let span = nanos(instants[b] - instants[a])?;
    let step = span / (interior as i64 + 1);

    log::debug!(
        "Declustering fixes {}..{} ({} interior, step {} ms)",
        a + 1,
        b,
        interior,
        step / 1_000_000
    );

    for (k, fix) in fixes[a + 1..b].iter_mut().enumerate() {
        let offset = Duration::nanoseconds(step * (k as i64 + 1));
        let display_zone = fix.timestamp.map(|ts| *ts.offset());
        let instant = instants[a] + offset;
        fix.timestamp = Some(match display_zone {
            Some(zone) => instant.with_timezone(&zone),
            None => instant,
        });
    }
    Ok(())
}

fn nanos(delta: Duration) -> Result<i64> {
    delta.num_nanoseconds().ok_or_else(|| {
        TrackError::InvalidInput(format!("timestamp gap of {delta} is out of range"))
    })
}
