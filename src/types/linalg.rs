//! Linear algebra aliases for the track estimator
//!
//! The estimator works on (latitude, longitude) pairs and applies its gain
//! independently per axis, so a plain 2-vector is all it needs.

use nalgebra::Vector2;

use super::Position;

pub type PositionVec = Vector2<f64>;

impl From<Position> for PositionVec {
    fn from(position: Position) -> Self {
        PositionVec::new(position.latitude, position.longitude)
    }
}

impl From<PositionVec> for Position {
    fn from(vec: PositionVec) -> Self {
        Position::new(vec[0], vec[1])
    }
}
