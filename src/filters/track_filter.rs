use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackError};
use crate::geodesy;
use crate::types::{Fix, PositionVec};

/// Floor for dt when two accepted fixes share an instant (seconds)
pub const MIN_DT_SECS: f64 = 1e-3;

/// Tunables for one filtering run
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterParameters {
    /// Process noise: variance added per second of elapsed time
    pub model_precision: f64,
    /// Measurement noise of a single fix
    pub sensor_precision: f64,
    /// Implied speed (m/s) above which a fix is discarded as a teleport
    pub outline_speed: f64,
    /// Implied speed (m/s) at or below which the receiver is considered parked
    pub zero_speed_drift: f64,
}

impl FilterParameters {
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("modelPrecision", self.model_precision),
            ("sensorPrecision", self.sensor_precision),
            ("outlineSpeed", self.outline_speed),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(TrackError::InvalidParameters(format!(
                    "{name} must be a finite value > 0, got {value}"
                )));
            }
        }
        if !self.zero_speed_drift.is_finite() || self.zero_speed_drift < 0.0 {
            return Err(TrackError::InvalidParameters(format!(
                "zeroSpeedDrift must be a finite value >= 0, got {}",
                self.zero_speed_drift
            )));
        }
        Ok(())
    }
}

/// How a fix was handled by the estimator
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Verdict {
    Rejected,
    Stationary,
    Updated,
}

/// Estimate owned by a single run; only accepted fixes mutate it.
#[derive(Clone, Debug)]
struct EstimatorState {
    /// Smoothed estimate
    position: PositionVec,
    /// Raw position of the last accepted fix; implied speed is measured from here
    last_fix: PositionVec,
    instant: DateTime<FixedOffset>,
    /// Always > 0
    variance: f64,
}

impl EstimatorState {
    fn new(position: PositionVec, instant: DateTime<FixedOffset>, sensor_precision: f64) -> Self {
        Self {
            position,
            last_fix: position,
            instant,
            variance: sensor_precision,
        }
    }

    /// Parked: a zero-innovation measurement. Tightens variance, keeps position.
    fn hold(
        &mut self,
        measured: PositionVec,
        instant: DateTime<FixedOffset>,
        sensor_precision: f64,
    ) {
        self.variance = self.variance * sensor_precision / (self.variance + sensor_precision);
        self.last_fix = measured;
        self.instant = instant;
    }

    /// Predict over `dt` seconds, then blend in the measurement per axis.
    fn update(
        &mut self,
        measured: PositionVec,
        instant: DateTime<FixedOffset>,
        dt: f64,
        params: &FilterParameters,
    ) {
        let predicted = self.variance + params.model_precision * dt;
        let gain = predicted / (predicted + params.sensor_precision);

        self.position += (measured - self.position) * gain;
        // (1 - gain) * predicted, kept strictly positive when gain rounds to 1
        self.variance = predicted * params.sensor_precision / (predicted + params.sensor_precision);
        self.last_fix = measured;
        self.instant = instant;
    }
}

/// Recursive position smoother with teleport rejection
///
/// Implied speed is the distance from the last *accepted* raw fix over the
/// time since it. The smoothed estimate lags a moving receiver, so it is never
/// the basis for gating.
/// - implied speed above `outline_speed`: dropped, state untouched
/// - implied speed at or below `zero_speed_drift`: emitted at the held estimate
/// - otherwise: Kalman-style predict/update, emitted at the new estimate
///
/// Time running backwards is [`TrackError::NonMonotonicTime`]. A fix sharing
/// its predecessor's instant is not an error: dt is floored at
/// [`MIN_DT_SECS`], so it is gated by distance alone.
///
/// Emitted fixes keep their timestamp, motion and index; only the position changes.
#[derive(Clone, Debug)]
pub struct TrackFilter {
    params: FilterParameters,
}

impl TrackFilter {
    pub fn new(params: FilterParameters) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &FilterParameters {
        &self.params
    }

    /// Lazy single pass; stop consuming whenever you like.
    ///
    /// After the first error the stream ends.
    pub fn stream<I>(&self, fixes: I) -> FilterStream<I::IntoIter>
    where
        I: IntoIterator<Item = Fix>,
    {
        FilterStream {
            params: self.params,
            inner: fixes.into_iter(),
            state: None,
            ordinal: 0,
            failed: false,
        }
    }

    /// Whole-track run: either every surviving fix, or the first error.
    pub fn filter<I>(&self, fixes: I) -> Result<Vec<Fix>>
    where
        I: IntoIterator<Item = Fix>,
    {
        let filtered = self.stream(fixes).collect::<Result<Vec<Fix>>>()?;
        if filtered.is_empty() {
            return Err(TrackError::InvalidInput(
                "track filter needs at least one fix".to_string(),
            ));
        }
        Ok(filtered)
    }
}

/// Iterator returned by [`TrackFilter::stream`]
pub struct FilterStream<I> {
    params: FilterParameters,
    inner: I,
    state: Option<EstimatorState>,
    ordinal: usize,
    failed: bool,
}

impl<I> FilterStream<I> {
    fn step(&mut self, fix: Fix, ordinal: usize) -> Result<Option<Fix>> {
        fix.position.validate()?;
        let instant = fix.timestamp.ok_or_else(|| {
            TrackError::InvalidInput(format!("fix {ordinal} has no timestamp"))
        })?;
        let measured = PositionVec::from(fix.position);

        let state = match self.state.as_mut() {
            None => {
                self.state = Some(EstimatorState::new(
                    measured,
                    instant,
                    self.params.sensor_precision,
                ));
                return Ok(Some(fix));
            }
            Some(state) => state,
        };

        let elapsed = instant - state.instant;
        if elapsed < chrono::Duration::zero() {
            return Err(TrackError::NonMonotonicTime {
                index: ordinal,
                previous: state.instant,
                current: instant,
            });
        }
        let dt = elapsed.num_milliseconds() as f64 / 1000.0;

        let meters = f64::from(geodesy::distance(&state.last_fix.into(), &fix.position)?);
        let implied_speed = meters / dt.max(MIN_DT_SECS);

        let verdict = if implied_speed > self.params.outline_speed {
            Verdict::Rejected
        } else if implied_speed <= self.params.zero_speed_drift {
            Verdict::Stationary
        } else {
            Verdict::Updated
        };

        match verdict {
            Verdict::Rejected => {
                log::debug!(
                    "Rejected fix {}: implied speed {:.1} m/s over {:.1} m/s ({} m in {:.3} s)",
                    ordinal,
                    implied_speed,
                    self.params.outline_speed,
                    meters,
                    dt
                );
                Ok(None)
            }
            Verdict::Stationary => {
                state.hold(measured, instant, self.params.sensor_precision);
                log::trace!(
                    "Fix {} stationary ({:.2} m/s), variance {:.4}",
                    ordinal,
                    implied_speed,
                    state.variance
                );
                Ok(Some(fix.with_position(state.position.into())))
            }
            Verdict::Updated => {
                state.update(measured, instant, dt, &self.params);
                log::trace!(
                    "Fix {} updated ({:.2} m/s), variance {:.4}",
                    ordinal,
                    implied_speed,
                    state.variance
                );
                Ok(Some(fix.with_position(state.position.into())))
            }
        }
    }
}

impl<I> Iterator for FilterStream<I>
where
    I: Iterator<Item = Fix>,
{
    type Item = Result<Fix>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            let fix = self.inner.next()?;
            let ordinal = self.ordinal;
            self.ordinal += 1;
            match self.step(fix, ordinal) {
                Ok(Some(out)) => return Some(Ok(out)),
                Ok(None) => continue,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
