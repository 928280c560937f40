//! Evolves a minimal feed-forward network to solve XOR.
//!
//! Demonstrates the host-side embedding contract from spec.md §6: own a
//! `Generation`, drive `mutate -> evaluate -> speciate -> reproduce` each
//! tick, and read back the champion.

use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use neat::{
    Activation, CompatDistParams, Generation, GenomeLayout, GenomeView, MutateParams,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Route `generation.print_info()`'s `log::info!` calls to the console so a
/// `cargo run --example xor` actually shows per-generation progress.
fn init_logging() {
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{l} - {m}{n}")))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(LevelFilter::Info))
        .expect("log4rs config is well-formed");
    log4rs::init_config(config).expect("log4rs can only be initialized once per process");
}

const XOR_CASES: [([f64; 2], f64); 4] = [
    ([0.0, 0.0], 0.0),
    ([0.0, 1.0], 1.0),
    ([1.0, 0.0], 1.0),
    ([1.0, 1.0], 0.0),
];

fn xor_fitness(genome: &mut impl GenomeView) -> f64 {
    let mut error = 0.0;
    for (inputs, expected) in XOR_CASES {
        let outputs = genome.propagate(&inputs).expect("xor genome takes 2 inputs");
        error += (outputs[0] - expected).powi(2);
    }
    4.0 - error
}

fn main() {
    init_logging();
    let mut rng = StdRng::seed_from_u64(0);
    let layout = GenomeLayout::new(2, 1, Activation::Sigmoid);
    let mut generation = Generation::new(layout, 150, &mut rng);

    let mutate_params = MutateParams::default();
    let compat_params = CompatDistParams::default();
    let compat_threshold = 3.0;
    let stagnation_threshold = 15;
    let kill_percent = 0.5;
    let mutation_offspring_percent = 0.25;

    for _ in 0..100 {
        generation.mutate(&mutate_params, &mut rng).unwrap();
        generation.evaluate(&|g| xor_fitness(g));
        generation.speciate(compat_threshold, &compat_params);
        generation
            .reproduce(
                kill_percent,
                stagnation_threshold,
                mutation_offspring_percent,
                &mutate_params,
                &mut rng,
            )
            .unwrap();
        generation.print_info();

        if let Some(champion) = generation.champion() {
            if champion.fitness >= 3.9 {
                break;
            }
        }
    }

    if let Some(champion) = generation.champion() {
        println!(
            "champion fitness {:.4} over {} nodes, {} connections",
            champion.fitness,
            champion.nodes.len(),
            champion.connections.len()
        );
        champion.print_genotype();
    }
}
