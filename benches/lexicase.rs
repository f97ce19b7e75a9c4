//! Benchmarks for selection, mutation and cohort evaluation.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use cohort_coevo::{
    compute::{
        CoevoRng, CohortLexicaseSelector, CohortPartitioner, EvaluationOrchestrator,
        FitnessTable, LexicaseSelector, Mutator, Objective, PairSequenceMutator, Population,
        RandomSource,
    },
    schema::{EvaluationMode, PairSequenceGenome, PairSequenceMutatorConfig},
    sorting::{SortingNetworkEvaluator, random_network, random_test},
};

/// Population of `size` members with random pass/fail rows of length `slots`.
fn scored_population(size: usize, slots: usize, rng: &mut CoevoRng) -> Population<usize> {
    let mut population = Population::from_genomes(size, (0..size).collect()).unwrap();
    for (_, individual) in population.iter_mut() {
        individual.phenotype.results = (0..slots)
            .map(|_| if rng.bernoulli(0.5) { 1.0 } else { 0.0 })
            .collect();
        individual.phenotype.aggregate();
    }
    population
}

fn bench_lexicase(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexicase_select");

    for size in [64, 256, 1024] {
        let mut rng = CoevoRng::new(1);
        let population = scored_population(size, size, &mut rng);
        let candidates = population.occupied_ids();
        let table =
            FitnessTable::from_results(&population, &candidates, size, Objective::Passes)
                .unwrap();
        let selector = LexicaseSelector::new(0);

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                black_box(selector.select_one(&table, &mut rng).unwrap());
            });
        });
    }

    group.finish();
}

fn bench_cohort_lexicase(c: &mut Criterion) {
    let mut group = c.benchmark_group("cohort_lexicase");

    for cohort_size in [8, 32, 128] {
        let mut rng = CoevoRng::new(2);
        let population = scored_population(1024, cohort_size, &mut rng);
        let mut cohorts = CohortPartitioner::setup(1024, cohort_size).unwrap();
        cohorts.randomize(&mut rng);
        let selector = CohortLexicaseSelector::new(0);

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("1024/{}", cohort_size)),
            &cohort_size,
            |b, _| {
                b.iter(|| {
                    let mut population = population.clone();
                    selector
                        .select(&mut population, &cohorts, Objective::Passes, &mut rng)
                        .unwrap();
                    population.advance();
                    black_box(population);
                });
            },
        );
    }

    group.finish();
}

fn bench_network_mutation(c: &mut Criterion) {
    let mut group = c.benchmark_group("network_mutation");

    for max_len in [16, 64, 256] {
        let mutator = PairSequenceMutator::new(PairSequenceMutatorConfig {
            domain_size: 16,
            min_len: 1,
            max_len,
            ..Default::default()
        })
        .unwrap();
        let mut rng = CoevoRng::new(3);
        let network: PairSequenceGenome = random_network(&mut rng, 16, max_len, max_len);

        group.bench_with_input(BenchmarkId::from_parameter(max_len), &max_len, |b, _| {
            b.iter(|| {
                let mut genome = network.clone();
                black_box(mutator.mutate(&mut rng, &mut genome));
            });
        });
    }

    group.finish();
}

fn bench_cohort_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("cohort_evaluation");
    group.sample_size(20);

    let input_size = 8;
    let evaluator = SortingNetworkEvaluator::new(input_size);

    for cohort_size in [8, 32] {
        let mut rng = CoevoRng::new(4);
        let networks = (0..512)
            .map(|_| random_network(&mut rng, input_size, 16, 32))
            .collect();
        let sequences = (0..512)
            .map(|_| random_test(&mut rng, input_size, 4, 0, 1))
            .collect();
        let mut solutions = Population::from_genomes(512, networks).unwrap();
        let mut tests = Population::from_genomes(512, sequences).unwrap();
        let mut orchestrator =
            EvaluationOrchestrator::new(EvaluationMode::Cohort { cohort_size }, 512, 512)
                .unwrap();

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("512/{}", cohort_size)),
            &cohort_size,
            |b, _| {
                b.iter(|| {
                    black_box(
                        orchestrator
                            .evaluate(&evaluator, &mut solutions, &mut tests, &mut rng)
                            .unwrap(),
                    );
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_lexicase,
    bench_cohort_lexicase,
    bench_network_mutation,
    bench_cohort_evaluation
);
criterion_main!(benches);
