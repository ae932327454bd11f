//! Runs many independent games across a thread pool and aggregates win and
//! bankruptcy statistics. Trials are seeded by index, so a run is
//! reproducible for a fixed base seed.

use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use monopoly_sim::game::{GameConfig, GameState};

#[derive(Parser)]
struct Args {
    /// Number of games to run.
    #[arg(long, default_value_t = 1000)]
    trials: u64,
    /// Base seed; trial i uses seed base + i.
    #[arg(long, default_value_t = 0)]
    seed: u64,
    #[arg(long, default_value_t = 10_000)]
    max_turns: u32,
}

#[derive(Default)]
struct Tally {
    wins: [u64; 4],
    bankruptcies: [u64; 4],
    stalemates: u64,
    total_turns: u64,
}

impl Tally {
    fn merge(mut self, other: Tally) -> Tally {
        for i in 0..4 {
            self.wins[i] += other.wins[i];
            self.bankruptcies[i] += other.bankruptcies[i];
        }
        self.stalemates += other.stalemates;
        self.total_turns += other.total_turns;
        self
    }
}

const NAMES: [&str; 4] = ["North", "East", "South", "West"];

fn run_trial(seed: u64, config: GameConfig) -> Tally {
    let mut tally = Tally::default();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut game = match GameState::new(&NAMES, config) {
        Ok(game) => game,
        Err(e) => {
            eprintln!("failed to set up game: {}", e);
            std::process::exit(1);
        }
    };
    while game.is_running() {
        game.advance_one_turn(&mut rng);
    }
    let solvent: Vec<usize> = (0..NAMES.len())
        .filter(|&i| !game.players()[i].bankrupt)
        .collect();
    match solvent.as_slice() {
        [winner] => tally.wins[*winner] += 1,
        _ => tally.stalemates += 1,
    }
    for (i, player) in game.players().iter().enumerate() {
        if player.bankrupt {
            tally.bankruptcies[i] += 1;
        }
    }
    tally.total_turns = u64::from(game.turns_played());
    tally
}

fn main() {
    let args = Args::parse();
    let config = GameConfig {
        max_turns: args.max_turns,
        ..GameConfig::default()
    };

    let tally = (0..args.trials)
        .into_par_iter()
        .map(|i| run_trial(args.seed + i, config))
        .reduce(Tally::default, Tally::merge);

    println!("{} trials, {} stalemates", args.trials, tally.stalemates);
    println!(
        "mean game length: {:.0} turns",
        tally.total_turns as f64 / args.trials as f64
    );
    for (i, name) in NAMES.iter().enumerate() {
        println!(
            "  {:<6} {:>6} wins ({:>5.1}%), {:>6} bankruptcies",
            name,
            tally.wins[i],
            tally.wins[i] as f64 / args.trials as f64 * 100.0,
            tally.bankruptcies[i]
        );
    }
}
