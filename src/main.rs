//! Cohort coevolution CLI - Evolve sorting networks against tests from JSON configuration.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::path::PathBuf;
use std::time::Instant;

use cohort_coevo::{
    schema::{CoevolutionPhase, EvaluationMode, SortingExperimentConfig},
    sorting::{build_engine, sorts_all_binary},
};

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <config.json> [generations]", args[0]);
        eprintln!();
        eprintln!("Coevolve sorting networks against sorting tests.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to experiment configuration file");
        eprintln!("  generations  Override the configured maximum generations");
        eprintln!();
        eprintln!("Example configuration is generated with --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_config();
        return;
    }

    let config_path = PathBuf::from(&args[1]);
    let mut config = SortingExperimentConfig::from_json_file(&config_path).unwrap_or_else(|e| {
        eprintln!("Error loading {}: {}", config_path.display(), e);
        std::process::exit(1);
    });
    if let Some(generations) = args.get(2).and_then(|s| s.parse().ok()) {
        config.coevolution.max_generations = generations;
    }

    let coevolution = &config.coevolution;
    println!("Sorting Network Coevolution");
    println!("===========================");
    println!("Inputs: {}", config.input_size());
    println!(
        "Networks: {} (length {}..={})",
        coevolution.solution_population.size,
        config.network_mutation.min_len,
        config.network_mutation.max_len
    );
    println!(
        "Tests: {} ({} sequence(s) each)",
        coevolution.test_population.size, config.sequences_per_test
    );
    match coevolution.evaluation {
        EvaluationMode::Full => println!("Evaluation: full"),
        EvaluationMode::Cohort { cohort_size } => println!(
            "Evaluation: cohorts of {} ({} cohorts)",
            cohort_size,
            coevolution.num_cohorts().unwrap_or(0)
        ),
    }
    println!("Generations: {}", coevolution.max_generations);
    println!();

    let mut engine = build_engine(&config).unwrap_or_else(|e| {
        eprintln!("Error setting up experiment: {}", e);
        std::process::exit(1);
    });

    println!("Running coevolution...");
    let start = Instant::now();
    let report_every = (config.coevolution.max_generations / 10).max(1);

    let result = engine
        .run_with_callback(|progress| {
            if let Some(summary) = &progress.latest
                && progress.generation % report_every == 0
                && !matches!(
                    progress.phase,
                    CoevolutionPhase::Complete | CoevolutionPhase::Stopped
                )
            {
                println!(
                    "  Generation {}/{}: best passes={:.1}, mean passes={:.2}, best test fails={:.1}, {:.1} gen/s",
                    progress.generation,
                    progress.total_generations,
                    summary.dominant_solution_passes,
                    summary.mean_solution_passes,
                    summary.dominant_test_fails,
                    progress.generation as f64 / start.elapsed().as_secs_f64()
                );
            }
        })
        .unwrap_or_else(|e| {
            eprintln!("Error during run: {}", e);
            std::process::exit(1);
        });

    let stats = &result.stats;
    println!();
    println!("Stopped: {:?}", stats.stop_reason);
    println!("Generations: {}", stats.generations);
    println!(
        "Evaluations: {} ({:.0}/s)",
        stats.total_evaluations, stats.evaluations_per_second
    );
    println!("Time: {:.2}s", stats.elapsed_seconds);

    if let Some(best) = &result.best_solution {
        println!();
        println!(
            "Best network (generation {}, {:.1} passes, {} gates):",
            best.generation,
            best.score,
            best.genome.len()
        );
        println!("  {:?}", best.genome.genes);
        let verdict = match sorts_all_binary(&best.genome, config.input_size()) {
            Some(true) => "yes",
            Some(false) => "no",
            None => "unchecked",
        };
        println!("  Sorts all binary inputs: {}", verdict);
    }
    if let Some(test) = &result.final_test {
        println!();
        println!("Hardest final test ({:.1} failures induced):", test.score);
        for sequence in &test.genome.sequences {
            println!("  {:?}", sequence);
        }
    }
}

fn print_example_config() {
    let config = SortingExperimentConfig::default();

    match serde_json::to_string_pretty(&config) {
        Ok(json) => {
            println!("Example configuration (config.json):");
            println!("{}", json);
        }
        Err(e) => {
            eprintln!("Error serializing example config: {}", e);
            std::process::exit(1);
        }
    }
}
