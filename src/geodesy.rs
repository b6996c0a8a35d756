//! Great-circle math on a spherical Earth
//!
//! Distances are haversine over a 6,371 km sphere. `distance` rounds to the
//! nearest whole meter (ties to even); `haversine_distance` keeps the raw
//! value and is symmetric in its arguments.

use crate::error::{Result, TrackError};
use crate::types::Position;

/// Mean Earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in meters, unrounded
pub fn haversine_distance(a: &Position, b: &Position) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).max(0.0).sqrt());
    EARTH_RADIUS_M * c
}

/// Great-circle distance rounded to whole meters
///
/// Both ends are validated first; a NaN would otherwise cast to 0 m.
pub fn distance(a: &Position, b: &Position) -> Result<u32> {
    a.validate()?;
    b.validate()?;
    Ok(haversine_distance(a, b).round_ties_even() as u32)
}

/// Initial bearing (forward azimuth) from `a` to `b`, degrees in [0, 360)
pub fn bearing(a: &Position, b: &Position) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let y = d_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();
    let deg = y.atan2(x).to_degrees().rem_euclid(360.0);
    // rem_euclid can return 360.0 for tiny negative inputs
    if deg >= 360.0 {
        0.0
    } else {
        deg
    }
}

/// Geographic center: mean of the unit vectors, projected back to lat/lon.
pub fn center(positions: &[Position]) -> Result<Position> {
    match positions {
        [] => Err(TrackError::InvalidInput(
            "cannot find the center of an empty track".to_string(),
        )),
        [single] => Ok(*single),
        _ => {
            let (mut x, mut y, mut z) = (0.0, 0.0, 0.0);
            for p in positions {
                let lat = p.latitude.to_radians();
                let lon = p.longitude.to_radians();
                x += lat.cos() * lon.cos();
                y += lat.cos() * lon.sin();
                z += lat.sin();
            }
            let n = positions.len() as f64;
            x /= n;
            y /= n;
            z /= n;

            let lon = y.atan2(x);
            let lat = z.atan2((x * x + y * y).sqrt());
            Ok(Position::new(lat.to_degrees(), lon.to_degrees()))
        }
    }
}
