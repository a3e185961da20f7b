//! Calibrates the coarse-grained model against 50 ground-truth design rows
//! with a 200-trial budget, writes the full history to
//! `results/study_results.csv`, and prints the 10 lowest-error candidates.
//!
//! ```sh
//! cargo run --example calibrate
//! ```

use std::sync::Arc;

use cg_calibrate::prelude::*;

fn main() -> std::result::Result<(), Box<dyn core::error::Error>> {
    let batch = EvaluationBatch::from_ground_truth(sample_design(50, 42))?;
    let objective = CalibrationObjective::new(Arc::new(batch));

    let config = SearchConfig::builder().trials(200).seed(42).build()?;
    let mut engine = SearchEngine::new(config, objective);
    engine.run();

    std::fs::create_dir_all("results")?;
    engine.history().export_csv("results/study_results.csv")?;
    println!(
        "Evaluated {} candidates over {} generations; history written to results/study_results.csv",
        engine.history().len(),
        engine.generation()
    );

    let mut ranked = engine.history().ranked();
    ranked.sort_by(|a, b| {
        a.candidate
            .objectives
            .error
            .total_cmp(&b.candidate.objectives.error)
    });

    println!();
    println!(
        "{:>8} {:>8} {:>8} {:>8} {:>8} {:>10} {:>10}",
        "s1", "s2", "s3", "c_scale", "sb", "error", "runtime"
    );
    for entry in ranked.iter().take(10) {
        let v = entry.candidate.vector;
        let o = entry.candidate.objectives;
        println!(
            "{:>8.4} {:>8.4} {:>8.4} {:>8.4} {:>8.4} {:>10.4} {:>10.4}",
            v.s1, v.s2, v.s3, v.c_scale, v.sb, o.error, o.runtime_cost
        );
    }

    let front = engine.pareto_front();
    println!();
    println!("Pareto front: {} candidates", front.len());
    Ok(())
}
