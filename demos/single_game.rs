//! Narrates one full game turn by turn. Set RUST_LOG=debug for the engine's
//! own event trace on top of the narration.

use clap::Parser;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;

use monopoly_sim::events::{GameEvent, LandingOutcome};
use monopoly_sim::game::{GameConfig, GameState};

#[derive(Parser)]
struct Args {
    /// Seed for a reproducible game; omit for a random one.
    #[arg(long)]
    seed: Option<u64>,
    /// Turn limit before the game is called a stalemate.
    #[arg(long, default_value_t = 10_000)]
    max_turns: u32,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args = Args::parse();

    let config = GameConfig {
        max_turns: args.max_turns,
        ..GameConfig::default()
    };
    let names = ["North", "East", "South", "West"];
    let mut game = match GameState::new(&names, config) {
        Ok(game) => game,
        Err(e) => {
            eprintln!("failed to set up game: {}", e);
            std::process::exit(1);
        }
    };

    let mut rng: Box<dyn RngCore> = match args.seed {
        Some(seed) => Box::new(ChaCha8Rng::seed_from_u64(seed)),
        None => Box::new(rand::thread_rng()),
    };
    while game.is_running() {
        game.advance_one_turn(&mut rng);
        for event in game.drain_events() {
            narrate(&game, &event);
        }
    }

    println!("\nFinal standings after {} turns:", game.turns_played());
    for (i, player) in game.players().iter().enumerate() {
        if player.bankrupt {
            println!("  {} - bankrupt", player.name);
        } else {
            println!(
                "  {} - win chance {:.0}%, {} assets",
                player,
                game.chance_of_winning(i) * 100.0,
                player.assets.len()
            );
        }
    }
}

fn narrate(game: &GameState, event: &GameEvent) {
    let name = |i: usize| game.players()[i].name.as_str();
    let tile = |t: usize| game.tile_at(t).name;
    match *event {
        GameEvent::DiceRolled { player, dice } => {
            println!("{} rolls {}+{}", name(player), dice.0, dice.1)
        }
        GameEvent::PassedGo { player, bonus } => {
            println!("  {} passes Go and collects ${}", name(player), bonus)
        }
        GameEvent::Moved { player, to, .. } => {
            println!("  {} moves to {}", name(player), tile(to))
        }
        GameEvent::Landed {
            player,
            tile: t,
            outcome,
        } => match outcome {
            LandingOutcome::Purchased { price } => {
                println!("  {} buys {} for ${}", name(player), tile(t), price)
            }
            LandingOutcome::PaidRent { to, amount } => println!(
                "  {} pays {} ${} rent at {}",
                name(player),
                name(to),
                amount,
                tile(t)
            ),
            LandingOutcome::NoEffect => {}
        },
        GameEvent::CardDrawn {
            player, message, ..
        } => println!("  {} draws: {}", name(player), message),
        GameEvent::TradeExecuted {
            proposer,
            counterparty,
            gave,
            received,
            cash,
        } => println!(
            "  {} trades {} (+${}) to {} for {}",
            name(proposer),
            tile(gave),
            cash,
            name(counterparty),
            tile(received)
        ),
        GameEvent::Mortgaged { player, tile: t } => {
            println!("  {} mortgages {}", name(player), tile(t))
        }
        GameEvent::Unmortgaged { player, tile: t } => {
            println!("  {} lifts the mortgage on {}", name(player), tile(t))
        }
        GameEvent::HouseBuilt {
            player,
            tile: t,
            houses,
        } => println!("  {} builds on {} ({} houses)", name(player), tile(t), houses),
        GameEvent::HouseSold { player, tile: t, .. } => {
            println!("  {} sells houses on {}", name(player), tile(t))
        }
        GameEvent::TaxPaid { player, amount } => {
            println!("  {} pays ${} tax", name(player), amount)
        }
        GameEvent::FreeParkingCollected { player, amount } => {
            println!("  {} collects ${} from Free Parking", name(player), amount)
        }
        GameEvent::WentToJail { player } => println!("  {} goes to jail", name(player)),
        GameEvent::ReleasedFromJail { player } => {
            println!("  {} gets out of jail", name(player))
        }
        GameEvent::Bankrupted { player, creditor } => match creditor {
            Some(c) => println!("  {} goes bankrupt; {} takes over", name(player), name(c)),
            None => println!("  {} goes bankrupt", name(player)),
        },
    }
}
