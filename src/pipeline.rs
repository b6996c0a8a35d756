//! Full cleaning pass: rollover repair, declustering, then filtering.

use crate::error::{Result, TrackError};
use crate::filters::{FilterParameters, TrackFilter};
use crate::timestamps::{correct_rollover, decluster};
use crate::types::Fix;

/// Runs the three stages over a whole track.
///
/// Parameters are checked before any fix is touched. The declusterer forces
/// the corrected track to be buffered; the other two stages stream.
pub fn clean<I>(fixes: I, params: &FilterParameters) -> Result<Vec<Fix>>
where
    I: IntoIterator<Item = Fix>,
{
    let filter = TrackFilter::new(*params)?;

    let corrected: Vec<Fix> = correct_rollover(fixes).collect();
    if corrected.is_empty() {
        return Err(TrackError::InvalidInput(
            "cannot clean an empty track".to_string(),
        ));
    }
    let raw_len = corrected.len();

    let declustered = decluster(corrected)?;
    let filtered = filter.filter(declustered)?;

    log::info!(
        "Cleaned track: {} fixes in, {} out ({} rejected)",
        raw_len,
        filtered.len(),
        raw_len - filtered.len()
    );
    Ok(filtered)
}

/// Polyline coordinates in `[longitude, latitude]` order, one per fix, in track order.
pub fn polyline(fixes: &[Fix]) -> Vec<[f64; 2]> {
    fixes.iter().map(|fix| fix.position.to_lon_lat()).collect()
}
