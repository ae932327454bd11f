//! Autonomous trade brokering: a valuation heuristic over a player's assets
//! and a negotiation routine that proposes fair two-party swaps.

use crate::events::GameEvent;
use crate::game::GameState;
use crate::board::TileKind;

/// Starting set-completion threshold for the most-wanted ranking; relaxed in
/// 0.1 steps until something qualifies.
const DEFAULT_COMPLETION_THRESHOLD: f64 = 0.5;

/// Fraction of the asset's monopoly set the client currently holds.
pub fn set_completion(game: &GameState, client: usize, tile: usize) -> f64 {
    match game.tile_at(tile).set_id() {
        Some(set) => game.count_in_set(client, set) as f64 / set.size() as f64,
        None => 0.0,
    }
}

/// Heuristic worth of an asset to a given player: base 200, scaled by how far
/// along the client is on the asset's set, bumped for properties and for
/// buildings on a completed monopoly, plus the face price.
pub fn value_to_client(game: &GameState, client: usize, tile: usize) -> i64 {
    let t = game.tile_at(tile);
    let set = match t.set_id() {
        Some(set) => set,
        None => return 0,
    };
    let owned = game.count_in_set(client, set);
    let complete = owned == set.size();
    let completion = owned as f64 / set.size() as f64;

    let mut value = 200.0;
    if complete {
        value *= 2.0;
    } else if completion >= 0.5 {
        value *= 1.0 + completion;
    }
    if matches!(t.kind, TileKind::Property { .. }) {
        value *= 1.33;
        let houses = t.houses();
        if complete && (1..=4).contains(&houses) {
            value *= f64::from(houses);
        }
    }
    value as i64 + t.price()
}

/// The client's assets whose set-completion meets the threshold, most
/// valuable first.
pub fn most_wanted(game: &GameState, client: usize, threshold: f64) -> Vec<usize> {
    let mut wanted: Vec<usize> = game.players()[client]
        .assets
        .iter()
        .copied()
        .filter(|&t| set_completion(game, client, t) >= threshold)
        .collect();
    wanted.sort_by_key(|&t| std::cmp::Reverse(value_to_client(game, client, t)));
    wanted
}

/// `most_wanted` starting at the default threshold, relaxing by 0.1 until at
/// least one asset qualifies or the threshold would go negative.
pub fn most_wanted_default(game: &GameState, client: usize) -> Vec<usize> {
    let mut threshold = DEFAULT_COMPLETION_THRESHOLD;
    loop {
        let wanted = most_wanted(game, client, threshold);
        if !wanted.is_empty() || threshold < 0.0 {
            return wanted;
        }
        threshold -= 0.1;
    }
}

/// Re-order the client's asset list most valuable first, so liquidation
/// consumes the tail (least valuable) and building favors the head.
pub fn sort_assets_by_worth(game: &mut GameState, client: usize) {
    let mut keyed: Vec<(i64, usize)> = game.players()[client]
        .assets
        .iter()
        .map(|&t| (value_to_client(game, client, t), t))
        .collect();
    keyed.sort_by_key(|&(value, _)| std::cmp::Reverse(value));
    game.players[client].assets = keyed.into_iter().map(|(_, t)| t).collect();
}

/// An asset-for-asset-plus-cash swap between two players. Ephemeral: built,
/// checked, then either executed atomically or dropped.
#[derive(Clone, Copy, Debug)]
pub struct TradeOffer {
    pub proposer: usize,
    pub counterparty: usize,
    /// Tile the proposer hands over.
    pub give: usize,
    /// Tile the proposer receives.
    pub take: usize,
    /// Positive: the proposer pays the counterparty.
    pub cash: i64,
}

impl TradeOffer {
    /// Both ownership transfers and the cash movement happen together; the
    /// builder already verified solvency, so no liquidation can trigger here.
    fn execute(self, game: &mut GameState) {
        if self.cash > 0 {
            game.transfer(self.proposer, self.counterparty, self.cash);
        } else if self.cash < 0 {
            game.transfer(self.counterparty, self.proposer, -self.cash);
        }
        game.transfer_asset(self.give, self.counterparty);
        game.transfer_asset(self.take, self.proposer);
        game.emit(GameEvent::TradeExecuted {
            proposer: self.proposer,
            counterparty: self.counterparty,
            gave: self.give,
            received: self.take,
            cash: self.cash,
        });
    }
}

/// Build and, if it is fair and affordable, execute the best trade between
/// the client and another player. Returns whether a trade happened.
pub fn build_best_trade_offer(game: &mut GameState, client: usize, other: usize) -> bool {
    let ranked = most_wanted_default(game, client);
    let other_ranked = most_wanted_default(game, other);
    let (Some(&top), Some(&other_top)) = (ranked.first(), other_ranked.first()) else {
        return false;
    };

    let (Some(wanted_set), Some(other_wanted_set)) =
        (game.tile_at(top).set_id(), game.tile_at(other_top).set_id())
    else {
        return false;
    };
    if wanted_set == other_wanted_set {
        return false;
    }

    // Each side must already hold something from the set the other is after.
    let give = game.players()[client]
        .assets
        .iter()
        .copied()
        .find(|&t| game.tile_at(t).set_id() == Some(other_wanted_set));
    let take = game.players()[other]
        .assets
        .iter()
        .copied()
        .find(|&t| game.tile_at(t).set_id() == Some(wanted_set));
    let (Some(give), Some(take)) = (give, take) else {
        return false;
    };

    // Price each tile at the average of the two parties' valuations.
    let take_value = (value_to_client(game, client, take) + value_to_client(game, other, take)) / 2;
    let give_value = (value_to_client(game, client, give) + value_to_client(game, other, give)) / 2;
    let cash = take_value - give_value;

    let floor = game.config().solvency_floor;
    if cash > 0 && game.players()[client].balance - cash < floor {
        return false;
    }
    if cash < 0 && game.players()[other].balance + cash < floor {
        return false;
    }

    TradeOffer {
        proposer: client,
        counterparty: other,
        give,
        take,
        cash,
    }
    .execute(game);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameConfig;

    fn game_with(names: &[&str]) -> GameState {
        GameState::new(names, GameConfig::default()).unwrap()
    }

    fn grant(game: &mut GameState, player: usize, tile: usize) {
        game.board[tile].set_owner(Some(player));
        game.players[player].assets.push(tile);
    }

    #[test]
    fn valuation_spot_checks() {
        let mut game = game_with(&["North", "East"]);
        // A lone railroad: completion 1/4, no scaling.
        grant(&mut game, 0, 5);
        assert_eq!(value_to_client(&game, 0, 5), 400);
        // Two of group 2: completion 2/3 scales by 1+2/3, then the 1.33
        // property bump, plus the $100 face price.
        grant(&mut game, 0, 6);
        grant(&mut game, 0, 8);
        assert_eq!(value_to_client(&game, 0, 6), 543);
        // Non-ownable tiles are worthless.
        assert_eq!(value_to_client(&game, 0, 0), 0);
    }

    #[test]
    fn completed_monopoly_doubles_and_houses_multiply() {
        let mut game = game_with(&["North", "East"]);
        grant(&mut game, 0, 1);
        grant(&mut game, 0, 3);
        // 200 * 2 * 1.33 + 60
        assert_eq!(value_to_client(&game, 0, 1), 592);
        game.board[1].set_houses(3);
        // 200 * 2 * 1.33 * 3 + 60
        assert_eq!(value_to_client(&game, 0, 1), 1656);
        // A hotel (5) is not a bare house count and does not multiply.
        game.board[1].set_houses(5);
        assert_eq!(value_to_client(&game, 0, 1), 592);
    }

    #[test]
    fn completion_fractions() {
        let mut game = game_with(&["North", "East"]);
        grant(&mut game, 0, 12);
        assert!((set_completion(&game, 0, 12) - 0.5).abs() < 1e-9);
        grant(&mut game, 0, 28);
        assert!((set_completion(&game, 0, 12) - 1.0).abs() < 1e-9);
        assert!((set_completion(&game, 1, 12) - 0.0).abs() < 1e-9);
    }

    #[test]
    fn most_wanted_relaxes_threshold() {
        let mut game = game_with(&["North", "East"]);
        // A lone railroad sits at completion 0.25, below the 0.5 default;
        // the threshold relaxes until it qualifies.
        grant(&mut game, 0, 5);
        assert!(most_wanted(&game, 0, 0.5).is_empty());
        assert_eq!(most_wanted_default(&game, 0), vec![5]);
        // No assets at all: ranking stays empty even at negative thresholds.
        assert!(most_wanted_default(&game, 1).is_empty());
    }

    #[test]
    fn sort_is_descending_by_worth() {
        let mut game = game_with(&["North", "East"]);
        grant(&mut game, 0, 5); // lone railroad: 400
        grant(&mut game, 0, 1); // group 1 pair: 592
        grant(&mut game, 0, 3);
        sort_assets_by_worth(&mut game, 0);
        let values: Vec<i64> = game.players[0]
            .assets
            .iter()
            .map(|&t| value_to_client(&game, 0, t))
            .collect();
        assert!(values.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(*game.players[0].assets.last().unwrap(), 5);
    }

    fn trade_setup() -> GameState {
        let mut game = game_with(&["North", "East"]);
        // North is halfway into group 1 and holds a stray group-2 tile;
        // East is halfway into group 1 too but wants to finish group 2.
        grant(&mut game, 0, 1); // group 1
        grant(&mut game, 0, 6); // group 2
        grant(&mut game, 1, 3); // group 1
        grant(&mut game, 1, 8); // group 2
        grant(&mut game, 1, 9); // group 2
        game
    }

    #[test]
    fn trade_executes_atomically() {
        let mut game = trade_setup();
        assert!(build_best_trade_offer(&mut game, 0, 1));
        // North traded the group-2 tile (and $5) for East's group-1 tile.
        assert_eq!(game.board[3].owner(), Some(0));
        assert_eq!(game.board[6].owner(), Some(1));
        assert_eq!(game.players[0].balance, 1495);
        assert_eq!(game.players[1].balance, 1505);
        assert!(game.players[0].assets.contains(&3));
        assert!(!game.players[0].assets.contains(&6));
        assert!(game.players[1].assets.contains(&6));
        assert!(!game.players[1].assets.contains(&3));
    }

    #[test]
    fn trade_respects_solvency_floor() {
        let mut game = trade_setup();
        game.players[0].balance = 302; // paying $5 would land below 300
        assert!(!build_best_trade_offer(&mut game, 0, 1));
        assert_eq!(game.board[3].owner(), Some(1));
        assert_eq!(game.board[6].owner(), Some(0));
        assert_eq!(game.players[0].balance, 302);
    }

    #[test]
    fn no_trade_when_wants_align() {
        let mut game = game_with(&["North", "East"]);
        // Both sides' top want is group 1.
        grant(&mut game, 0, 1);
        grant(&mut game, 1, 3);
        assert!(!build_best_trade_offer(&mut game, 0, 1));
    }

    #[test]
    fn no_trade_without_crossing_assets() {
        let mut game = game_with(&["North", "East"]);
        // Wants differ but North holds nothing from East's wanted set.
        grant(&mut game, 0, 1);
        grant(&mut game, 0, 3); // North completes group 1
        grant(&mut game, 1, 8);
        grant(&mut game, 1, 9); // East builds group 2
        assert!(!build_best_trade_offer(&mut game, 0, 1));
    }
}
