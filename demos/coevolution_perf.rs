//! Quick coevolution performance test

use cohort_coevo::{
    schema::{
        CoevolutionConfig, EvaluationMode, PairSequenceMutatorConfig, PopulationConfig,
        SelectionMethod, SortingExperimentConfig,
    },
    sorting::build_engine,
};
use std::time::Instant;

fn experiment(
    population: usize,
    evaluation: EvaluationMode,
    selection: SelectionMethod,
) -> SortingExperimentConfig {
    SortingExperimentConfig {
        coevolution: CoevolutionConfig {
            solution_population: PopulationConfig { size: population },
            test_population: PopulationConfig { size: population },
            evaluation,
            solution_selection: selection,
            test_selection: selection,
            max_generations: 50,
            random_seed: Some(42),
            ..Default::default()
        },
        network_mutation: PairSequenceMutatorConfig {
            domain_size: 8,
            min_len: 1,
            max_len: 32,
            index_substitution_rate: 0.01,
            duplication_rate: 0.01,
            insertion_rate: 0.01,
            deletion_rate: 0.01,
            swap_rate: 0.01,
        },
        sequences_per_test: 4,
        ..Default::default()
    }
}

fn report(label: &str, config: &SortingExperimentConfig) {
    println!("{}", label);

    let start = Instant::now();
    let mut engine = match build_engine(config) {
        Ok(engine) => engine,
        Err(e) => {
            println!("  Setup failed: {}", e);
            return;
        }
    };
    let result = match engine.run() {
        Ok(result) => result,
        Err(e) => {
            println!("  Run failed: {}", e);
            return;
        }
    };
    let elapsed = start.elapsed();

    let total_evals = result.stats.total_evaluations;
    let evals_per_sec = total_evals as f64 / elapsed.as_secs_f64();

    println!("  Generations:    {}", result.stats.generations);
    println!("  Evaluations:    {}", total_evals);
    println!("  Elapsed:        {:.2}s", elapsed.as_secs_f64());
    println!("  Evals/sec:      {:.1}", evals_per_sec);
    println!("  Best passes:    {:.2}", result.stats.best_passes);
    println!();
}

fn main() {
    println!("=== Cohort Size Comparison (512 networks x 512 tests) ===\n");

    for cohort_size in [8, 32, 128] {
        let config = experiment(
            512,
            EvaluationMode::Cohort { cohort_size },
            SelectionMethod::CohortLexicase { max_funs: 0 },
        );
        report(&format!("Cohort size: {}", cohort_size), &config);
    }

    println!("=== Full Evaluation Scalability ===\n");

    for pop_size in [32, 64, 128] {
        let config = experiment(
            pop_size,
            EvaluationMode::Full,
            SelectionMethod::Lexicase { max_funs: 0 },
        );
        report(&format!("Population: {}", pop_size), &config);
    }
}
