use pretty_assertions::assert_eq;
use rstest::rstest;
use std::sync::atomic::{AtomicUsize, Ordering};
use volume_forecast::search::{batch_size, GridSearch, SearchConfig};
use volume_forecast::ForecastError;

fn candidates() -> Vec<(u32, u32)> {
    (0..7).flat_map(|a| (0..5).map(move |b| (a, b))).collect()
}

// Minimum at (4, 2); several ties elsewhere.
fn score(p: &(u32, u32)) -> f64 {
    let (a, b) = (p.0 as f64, p.1 as f64);
    ((a - 4.0).powi(2) + (b - 2.0).powi(2)).min(9.0)
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(3)]
#[case(8)]
#[case(64)]
fn test_winner_independent_of_workers(#[case] workers: usize) {
    let search = GridSearch::new(workers).unwrap();
    let best = search.run(&candidates(), |p| Ok(score(p))).unwrap();
    assert_eq!(best.params, (4, 2));
    assert_eq!(best.error, 0.0);
}

#[test]
fn test_repeated_runs_agree() {
    let search = GridSearch::new(4).unwrap();
    let first = search.run(&candidates(), |p| Ok(score(p))).unwrap();
    let second = search.run(&candidates(), |p| Ok(score(p))).unwrap();
    assert_eq!(first, second);
}

#[rstest]
#[case(1)]
#[case(3)]
#[case(10)]
fn test_ties_keep_first_candidate(#[case] workers: usize) {
    let search = GridSearch::new(workers).unwrap();
    let best = search.run(&candidates(), |_| Ok(1.0)).unwrap();
    assert_eq!(best.params, (0, 0));
}

#[test]
fn test_nan_scores_lose() {
    let search = GridSearch::new(2).unwrap();
    let candidates = vec![0, 1, 2, 3];
    let best = search
        .run(&candidates, |&c| Ok(if c == 2 { 5.0 } else { f64::NAN }))
        .unwrap();
    assert_eq!(best.params, 2);
}

#[test]
fn test_every_candidate_is_scored_once() {
    let calls = AtomicUsize::new(0);
    let search = GridSearch::new(3).unwrap();
    search
        .run(&candidates(), |p| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(score(p))
        })
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), candidates().len());
}

#[test]
fn test_worker_failure_aborts_search() {
    let search = GridSearch::new(2).unwrap();
    let result = search.run(&candidates(), |p| {
        if *p == (6, 4) {
            Err(ForecastError::DataError("worker failed".to_string()))
        } else {
            Ok(score(p))
        }
    });
    assert!(matches!(result, Err(ForecastError::DataError(_))));
}

#[test]
fn test_empty_grid() {
    let search = GridSearch::new(2).unwrap();
    let empty: Vec<u32> = Vec::new();
    assert!(matches!(
        search.run(&empty, |_| Ok(0.0)),
        Err(ForecastError::SearchError(_))
    ));
}

#[test]
fn test_worker_configuration() {
    assert!(GridSearch::new(0).is_err());
    assert_eq!(GridSearch::from_config(&SearchConfig { workers: 3 }).unwrap().workers(), 3);
    assert!(GridSearch::from_config(&SearchConfig::default()).unwrap().workers() >= 1);
    assert_eq!(batch_size(35, 4), 8);
}
