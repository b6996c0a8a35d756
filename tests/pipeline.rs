//! End-to-end checks of the cleaning pipeline on synthetic tracks.

use approx::assert_abs_diff_eq;
use chrono::{DateTime, Duration, FixedOffset, TimeZone};

use gps_track_filter::geodesy::{self, haversine_distance};
use gps_track_filter::pipeline::{clean, polyline};
use gps_track_filter::timestamps::fix_rollover;
use gps_track_filter::track::TrackRecord;
use gps_track_filter::{FilterParameters, Fix, Position, TrackError, TrackFilter};

const METERS_PER_DEG_LAT: f64 = 111_194.93;

fn params() -> FilterParameters {
    FilterParameters {
        model_precision: 1.0,
        sensor_precision: 10.0,
        outline_speed: 60.0,
        zero_speed_drift: 0.5,
    }
}

fn t0() -> DateTime<FixedOffset> {
    FixedOffset::east_opt(3 * 3600)
        .unwrap()
        .with_ymd_and_hms(2019, 9, 9, 7, 21, 44)
        .unwrap()
}

fn at_ms(ms: i64) -> DateTime<FixedOffset> {
    t0() + Duration::milliseconds(ms)
}

/// Northbound track: `step_m` meters every `dt_s` seconds.
fn northbound(n: usize, step_m: f64, dt_s: i64) -> Vec<Fix> {
    (0..n)
        .map(|i| {
            let lat = 55.0 + i as f64 * step_m / METERS_PER_DEG_LAT;
            Fix::moving(lat, 37.0, step_m / dt_s as f64, 0.0, at_ms(i as i64 * dt_s * 1000))
                .with_index(i)
        })
        .collect()
}

fn max_shift(a: &[Fix], b: &[Fix]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| haversine_distance(&x.position, &y.position))
        .fold(0.0, f64::max)
}

#[test]
fn stationary_track_comes_out_unchanged() {
    for drift in [0.0, 0.5, 3.0] {
        let track: Vec<Fix> = (0..20)
            .map(|i| {
                Fix::moving(55.7264485, 37.5289398, 0.0, f64::NAN, at_ms(i * 1000))
                    .with_index(i as usize)
            })
            .collect();
        let p = FilterParameters {
            zero_speed_drift: drift,
            ..params()
        };

        let out = clean(track.clone(), &p).unwrap();
        assert_eq!(out.len(), track.len());
        for (before, after) in track.iter().zip(&out) {
            assert_eq!(before.position, after.position);
            assert_eq!(before.timestamp, after.timestamp);
            assert_eq!(before.index, after.index);
        }
    }
}

#[test]
fn refiltering_a_slow_track_barely_moves_it() {
    let p = FilterParameters {
        zero_speed_drift: 0.01,
        ..params()
    };
    let filter = TrackFilter::new(p).unwrap();

    let once = filter.filter(northbound(60, 1.0, 10)).unwrap();
    let twice = filter.filter(once.clone()).unwrap();

    assert_eq!(once.len(), twice.len());
    assert!(max_shift(&once, &twice) < 1.0);
}

#[test]
fn teleport_is_dropped() {
    let mut track = northbound(12, 5.0, 1);
    let displaced = Position::new(track[6].latitude() + 9.0, 37.0);
    track[6] = track[6].clone().with_position(displaced);
    assert!(geodesy::distance(&track[5].position, &displaced).unwrap() > 1_000_000);

    let out = clean(track.clone(), &params()).unwrap();
    assert_eq!(out.len(), track.len() - 1);
    assert!(out.iter().all(|fix| fix.position != displaced));
    assert!(out.iter().all(|fix| fix.index != Some(6)));

    let kept: Vec<Option<usize>> = out.iter().map(|f| f.index).collect();
    let mut expected: Vec<Option<usize>> = (0..12).map(Some).collect();
    expected.remove(6);
    assert_eq!(kept, expected);
}

#[test]
fn highway_speed_track_loses_no_fixes() {
    // half of outline_speed, noise-free
    let track = northbound(120, 30.0, 1);
    let out = clean(track.clone(), &params()).unwrap();
    assert_eq!(out.len(), track.len());
    let indices: Vec<Option<usize>> = out.iter().map(|f| f.index).collect();
    assert_eq!(indices, (0..120).map(Some).collect::<Vec<_>>());
}

#[test]
fn rejection_does_not_shift_the_comparison_basis() {
    let clean_track = northbound(15, 4.0, 1);
    let mut noisy = clean_track.clone();
    let spike = Position::new(10.0, 120.0);
    noisy.insert(8, Fix::moving(10.0, 120.0, 0.0, 0.0, at_ms(7500)).with_index(99));

    let a = clean(clean_track, &params()).unwrap();
    let b = clean(noisy, &params()).unwrap();
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(&b) {
        assert_eq!(x.position, y.position);
        assert_eq!(x.index, y.index);
    }
    assert!(b.iter().all(|f| f.position != spike));
}

#[test]
fn rolled_over_week_number_is_repaired_in_place() {
    let true_time = t0() - Duration::days(365);
    let rolled = true_time - Duration::days(7168);
    assert_eq!(rolled.format("%Y").to_string(), "1999");

    let fix = Fix::moving(55.1, 37.2, 3.5, 271.0, rolled).with_index(4);
    let repaired = fix_rollover(fix.clone());

    assert_eq!(repaired.timestamp, Some(true_time));
    assert_eq!(repaired.timestamp.unwrap().offset(), rolled.offset());
    assert_eq!(repaired.latitude().to_bits(), fix.latitude().to_bits());
    assert_eq!(repaired.longitude().to_bits(), fix.longitude().to_bits());
    let (before, after) = (fix.motion.unwrap(), repaired.motion.unwrap());
    assert_eq!(before.speed.to_bits(), after.speed.to_bits());
    assert_eq!(before.heading.to_bits(), after.heading.to_bits());
    assert_eq!(repaired.index, Some(4));
}

#[test]
fn buffered_timestamps_are_spread_before_filtering() {
    let offsets_ms = [0, 5_000, 50_000, 55_000, 10_000, 15_000];
    let track: Vec<Fix> = offsets_ms
        .iter()
        .enumerate()
        .map(|(i, ms)| Fix::moving(55.0, 37.0, 0.0, 0.0, at_ms(*ms)).with_index(i))
        .collect();

    let out = clean(track, &params()).unwrap();
    let ts: Vec<DateTime<FixedOffset>> = out.iter().map(|f| f.timestamp.unwrap()).collect();

    assert_eq!(out.len(), 6);
    assert_eq!(ts[0], at_ms(0));
    assert_eq!(ts[1], at_ms(5_000));
    assert_eq!(ts[4], at_ms(10_000));
    assert_eq!(ts[5], at_ms(15_000));

    let step = ts[2] - ts[1];
    assert_eq!(ts[3] - ts[2], step);
    let last = ts[4] - ts[3];
    assert!((last - step).num_nanoseconds().unwrap().abs() < 1_000);
    assert!(step > Duration::milliseconds(1_666) && step < Duration::milliseconds(1_667));
}

#[test]
fn backward_time_after_repair_is_a_hard_failure() {
    let track = vec![
        Fix::timed(55.0, 37.0, at_ms(0)),
        Fix::timed(55.0, 37.0, at_ms(10_000)),
        Fix::timed(55.0, 37.0, at_ms(5_000)),
    ];
    assert!(matches!(
        clean(track, &params()),
        Err(TrackError::NonMonotonicTime { index: 2, .. })
    ));
}

#[test]
fn one_degree_of_longitude_on_the_equator() {
    let origin = Position::new(0.0, 0.0);
    assert_eq!(geodesy::distance(&origin, &origin).unwrap(), 0);
    let d = geodesy::distance(&origin, &Position::new(0.0, 1.0)).unwrap();
    assert!((111_194..=111_196).contains(&d));
    assert_abs_diff_eq!(
        haversine_distance(&origin, &Position::new(0.0, 1.0)),
        haversine_distance(&Position::new(0.0, 1.0), &origin),
        epsilon = 1e-9
    );
}

#[test]
fn repeated_runs_serialize_identically() {
    let mut track = northbound(40, 7.0, 2);
    track[20] = track[20].clone().with_position(Position::new(56.0, 38.0));

    let a = clean(track.clone(), &params()).unwrap();
    let b = clean(track, &params()).unwrap();
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
    assert_eq!(polyline(&a), polyline(&b));
}

#[test]
fn cleaned_track_round_trips_through_a_record_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cleaned.rwt.gz");

    let out = clean(northbound(25, 6.0, 1), &params()).unwrap();
    TrackRecord::from_fixes(11, &out).unwrap().save(&path).unwrap();
    let restored = TrackRecord::load(&path).unwrap().to_fixes();

    assert_eq!(restored.len(), out.len());
    for (a, b) in out.iter().zip(&restored) {
        assert_eq!(a.index, b.index);
        assert_eq!(a.timestamp, b.timestamp);
        assert_abs_diff_eq!(a.latitude(), b.latitude(), epsilon = 1e-12);
    }
}
