use monopoly_sim::board::BOARD_SIZE;
use monopoly_sim::events::{GameEvent, LandingOutcome};
use monopoly_sim::game::{GameConfig, GameState};

/// Runs a batch of full games and reports, per tile, how often players land
/// there and how much rent it collects. Pass the number of trials as the
/// first argument (default 20).
fn main() {
    let trials: u32 = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(20);

    let mut rng = rand::thread_rng();
    let mut landings = [0u64; BOARD_SIZE];
    let mut rent_collected = [0i64; BOARD_SIZE];

    for _ in 0..trials {
        let mut game = match GameState::new(
            &["North", "East", "South", "West"],
            GameConfig::default(),
        ) {
            Ok(game) => game,
            Err(e) => {
                eprintln!("failed to set up game: {}", e);
                std::process::exit(1);
            }
        };
        while game.is_running() {
            game.advance_one_turn(&mut rng);
        }
        for event in game.drain_events() {
            match event {
                GameEvent::Moved { to, .. } => landings[to] += 1,
                GameEvent::Landed {
                    tile,
                    outcome: LandingOutcome::PaidRent { amount, .. },
                    ..
                } => rent_collected[tile] += amount,
                _ => {}
            }
        }
    }

    let board = monopoly_sim::board::build_board();
    println!("{:>4}  {:<25} {:>9} {:>12}", "tile", "name", "landings", "rent");
    for (pos, tile) in board.iter().enumerate() {
        println!(
            "{:>4}  {:<25} {:>9} {:>12}",
            pos, tile.name, landings[pos], rent_collected[pos]
        );
    }
}
