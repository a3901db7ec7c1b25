use assert_approx_eq::assert_approx_eq;
use rstest::rstest;
use volume_forecast::validation::WalkForward;
use volume_forecast::ForecastError;

#[test]
fn test_fold_layout() {
    let folds = WalkForward::new(3, 1).unwrap().folds(10).unwrap();
    assert_eq!(folds.len(), 3);
    assert_eq!(folds[0].train, 0..7);
    assert_eq!(folds[0].test, 7..8);
    assert_eq!(folds[2].train, 0..9);
    assert_eq!(folds[2].test, 9..10);
}

#[rstest]
#[case(3, 1, 4)]
#[case(3, 1, 25)]
#[case(3, 12, 60)]
#[case(5, 2, 11)]
fn test_no_leakage_and_expanding_train(#[case] splits: usize, #[case] test_size: usize, #[case] rows: usize) {
    let folds = WalkForward::new(splits, test_size).unwrap().folds(rows).unwrap();
    assert_eq!(folds.len(), splits);
    for fold in &folds {
        assert!(!fold.train.is_empty());
        assert_eq!(fold.test.len(), test_size);
        assert!(fold.test.start >= fold.train.end);
    }
    for pair in folds.windows(2) {
        assert!(pair[1].train.end > pair[0].train.end);
        assert_eq!(pair[1].train.start, pair[0].train.start);
    }
    assert_eq!(folds.last().unwrap().test.end, rows);
}

#[test]
fn test_too_few_rows() {
    let err = WalkForward::new(3, 12).unwrap().folds(36).unwrap_err();
    assert!(matches!(
        err,
        ForecastError::InsufficientData {
            needed: 37,
            available: 36
        }
    ));
}

#[test]
fn test_rejects_empty_configuration() {
    assert!(WalkForward::new(0, 1).is_err());
    assert!(WalkForward::new(3, 0).is_err());
}

#[test]
fn test_mean_error() {
    let walk = WalkForward::new(3, 1).unwrap();
    let mean = walk.mean_error(10, |fold| Ok(fold.test.start as f64)).unwrap();
    assert_approx_eq!(mean, 8.0);

    let failed = walk.mean_error(10, |_| Err(ForecastError::DataError("boom".to_string())));
    assert!(failed.is_err());
}

#[test]
fn test_partial_failure_ranks_ahead_of_total_failure() {
    let walk = WalkForward::new(3, 1).unwrap();
    let one_failed = walk
        .mean_error(10, |fold| Ok(if fold.test.start == 7 { f64::MAX } else { 1.0 }))
        .unwrap();
    let all_failed = walk.mean_error(10, |_| Ok(f64::MAX)).unwrap();

    assert!(one_failed.is_finite());
    assert_eq!(all_failed, f64::MAX);
    assert!(one_failed < all_failed);
}
