use pretty_assertions::assert_eq;
use rstest::rstest;
use volume_forecast::window::{FeatureWindower, WindowGeometry};
use volume_forecast::ForecastError;

fn ramp(n: usize) -> Vec<f64> {
    (0..n).map(|i| i as f64).collect()
}

fn windower(lag: usize, horizon: usize, stride: usize) -> FeatureWindower {
    FeatureWindower::new(WindowGeometry::new(lag, horizon, stride).unwrap()).unwrap()
}

#[test]
fn test_twelve_by_twelve_on_four_years() {
    let pair = windower(12, 12, 12).windows(&ramp(48)).unwrap();
    assert_eq!(pair.len(), 3);
    assert_eq!(pair.starts, vec![0, 12, 24]);
    assert_eq!(pair.x[2], ramp(48)[24..36].to_vec());
    assert_eq!(pair.y[2], ramp(48)[36..48].to_vec());
}

#[rstest]
#[case(48, 12, 12, 12)]
#[case(50, 12, 12, 12)]
#[case(61, 12, 12, 6)]
#[case(100, 12, 6, 3)]
#[case(37, 5, 3, 1)]
#[case(24, 12, 12, 12)]
fn test_rows_align_with_series(
    #[case] n: usize,
    #[case] lag: usize,
    #[case] horizon: usize,
    #[case] stride: usize,
) {
    let series = ramp(n);
    let w = windower(lag, horizon, stride);
    let pair = w.windows(&series).unwrap();

    let offset = n % lag;
    assert_eq!(pair.len(), (n - offset - lag - horizon) / stride + 1);
    assert_eq!(pair.len(), w.geometry().row_count(n));
    for ((x, y), &start) in pair.x.iter().zip(&pair.y).zip(&pair.starts) {
        assert_eq!(x.len(), lag);
        assert_eq!(y.len(), horizon);
        assert_eq!(x[0], series[start]);
        // The target follows the last lag value directly.
        assert_eq!(y[0], x[lag - 1] + 1.0);
        assert_eq!(*y.last().unwrap(), series[start + lag + horizon - 1]);
    }
    assert_eq!(pair.starts[0], offset);
}

#[test]
fn test_final_row_ends_on_last_observation() {
    let series = ramp(50);
    let pair = windower(12, 12, 12).windows(&series).unwrap();
    assert_eq!(pair.y.last().unwrap().last().copied(), Some(49.0));
}

#[test]
fn test_short_series_is_insufficient() {
    let err = windower(12, 12, 12).windows(&ramp(23)).unwrap_err();
    assert!(matches!(
        err,
        ForecastError::InsufficientData {
            needed: 24,
            available: 23
        }
    ));
}

#[test]
fn test_offset_can_leave_no_room() {
    // 15 mod 4 = 3 leaves only one spare observation for a 14-value span.
    let err = windower(4, 10, 2).windows(&ramp(15)).unwrap_err();
    assert!(matches!(err, ForecastError::InsufficientData { needed: 17, .. }));
}

#[test]
fn test_invalid_geometry() {
    assert!(WindowGeometry::new(0, 12, 1).is_err());
    assert!(WindowGeometry::new(12, 0, 1).is_err());
    assert!(WindowGeometry::new(12, 12, 0).is_err());
    assert!(WindowGeometry::new(12, 12, 13).is_err());
}

#[test]
fn test_paired_windows_use_both_series() {
    let features = ramp(48);
    let targets: Vec<f64> = ramp(48).iter().map(|v| v * 10.0).collect();
    let pair = windower(12, 12, 12).paired(&features, &targets).unwrap();
    assert_eq!(pair.x[0][0], 0.0);
    assert_eq!(pair.y[0][0], 120.0);

    assert!(windower(12, 12, 12).paired(&features, &targets[1..]).is_err());
}

#[test]
fn test_validation_and_last_windows() {
    let series = ramp(48);
    let w = windower(12, 12, 12);
    let (window, actual) = w.validation_window(&series).unwrap();
    assert_eq!(window, &series[24..36]);
    assert_eq!(actual, &series[36..48]);
    assert_eq!(w.last_window(&series).unwrap(), &series[36..48]);
    assert!(w.last_window(&series[..11]).is_err());
}

#[test]
fn test_split_tail() {
    let pair = windower(12, 12, 12).windows(&ramp(60)).unwrap();
    let (train, test) = pair.split_tail(1).unwrap();
    assert_eq!(train.len(), 3);
    assert_eq!(test.len(), 1);
    assert_eq!(test.starts, vec![36]);
    assert!(pair.split_tail(4).is_err());
}
