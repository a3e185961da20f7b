//! Async integration tests for the search engine.
//!
//! These tests are only compiled when the `async` feature is enabled.

#![cfg(feature = "async")]

use core::ops::ControlFlow;
use std::sync::Arc;

use cg_calibrate::prelude::*;

fn objective() -> CalibrationObjective {
    let batch = EvaluationBatch::from_ground_truth(sample_design(5, 42)).unwrap();
    CalibrationObjective::new(Arc::new(batch))
}

fn config() -> SearchConfig {
    SearchConfig::builder()
        .population_size(20)
        .generations(10)
        .seed(42)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_run_parallel_matches_sequential() {
    let mut sequential = SearchEngine::new(config(), objective());
    sequential.run();

    for concurrency in [1, 3, 8] {
        let mut parallel = SearchEngine::new(config(), objective());
        parallel
            .run_parallel(concurrency)
            .await
            .expect("parallel run should succeed");
        assert_eq!(parallel.history().entries(), sequential.history().entries());
        assert_eq!(parallel.pareto_front(), sequential.pareto_front());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_run_parallel_multi_thread_runtime() {
    let mut engine = SearchEngine::new(config(), objective());
    engine.run_parallel(4).await.unwrap();
    assert_eq!(engine.history().len(), 200);
    assert!(!engine.pareto_front().is_empty());
}

struct StopAtFirst;

impl Objective for StopAtFirst {
    fn evaluate(&self, vector: &CalibrationVector) -> Objectives {
        Objectives::new(vector.s1, 1.0 / vector.c_scale)
    }

    fn after_generation(&self, _generation: usize, _history: &History) -> ControlFlow<()> {
        ControlFlow::Break(())
    }
}

#[tokio::test]
async fn test_run_parallel_honors_hook() {
    let mut engine = SearchEngine::new(config(), StopAtFirst);
    engine.run_parallel(2).await.unwrap();
    assert_eq!(engine.generation(), 1);
    assert_eq!(engine.history().len(), 20);
}

#[tokio::test]
async fn test_run_parallel_isolates_panics() {
    // Fails on the first call only.
    let calls = std::sync::atomic::AtomicUsize::new(0);
    let inner = objective();
    let flaky = move |v: &CalibrationVector| -> Objectives {
        let call = calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        assert!(call > 0, "evaluation failed");
        inner.evaluate(v)
    };
    let mut engine = SearchEngine::new(config(), flaky);
    engine
        .run_parallel(2)
        .await
        .expect("a failed evaluation must not end the run");

    let history = engine.history();
    assert_eq!(history.len(), 200);
    assert_eq!(history.n_generations(), 10);
    assert_eq!(engine.generation(), 10);
    assert_eq!(history.generation(0).len(), 20);

    let excluded = history.excluded();
    assert_eq!(excluded.len(), 1);
    assert_eq!(excluded[0].generation, 0);
    assert!(excluded[0].candidate.objectives.error.is_nan());
    assert!(
        engine
            .pareto_front()
            .iter()
            .all(|c| c.objectives.error.is_finite())
    );
}
