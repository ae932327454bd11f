use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::board::{self, SetId, Tile, TileKind, BOARD_SIZE};
use crate::broker;
use crate::cards::{Card, CardError, Command, Deck, NearestKind};
use crate::dice::Roll;
use crate::events::{DeckKind, GameEvent, LandingOutcome};
use crate::player::{Player, BANKRUPT_BALANCE};

/// Tunables threaded into the engine at construction; no process-wide flags.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct GameConfig {
    /// Safety limit converting a non-terminating game into a stalemate.
    pub max_turns: u32,
    pub starting_balance: i64,
    pub pass_go_bonus: i64,
    /// Trades that would leave either party below this are refused.
    pub solvency_floor: i64,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            max_turns: 10_000,
            starting_balance: 1500,
            pass_go_bonus: 200,
            solvency_floor: 300,
        }
    }
}

/// A full game: the board, the player rotation, and the per-turn control
/// flow. Single-threaded and synchronous; randomness comes in through the
/// `Rng` handed to each turn.
pub struct GameState {
    pub(crate) board: Vec<Tile>,
    pub(crate) players: Vec<Player>,
    current: usize,
    turns_played: u32,
    parking_pool: i64,
    chance: Deck,
    community_chest: Deck,
    events: Vec<GameEvent>,
    config: GameConfig,
}

impl GameState {
    /// Build a fresh game. Deck construction parses the card effect programs,
    /// so malformed card scripts fail here and never during play.
    pub fn new(player_names: &[&str], config: GameConfig) -> Result<Self, CardError> {
        let players = player_names
            .iter()
            .map(|name| Player::new(name, config.starting_balance))
            .collect::<Vec<_>>();
        // The rotation starts just before index 0.
        let current = players.len().saturating_sub(1);
        Ok(GameState {
            board: board::build_board(),
            players,
            current,
            turns_played: 0,
            parking_pool: 0,
            chance: Deck::chance()?,
            community_chest: Deck::community_chest()?,
            events: Vec::new(),
            config,
        })
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn board(&self) -> &[Tile] {
        &self.board
    }

    pub fn tile_at(&self, index: usize) -> &Tile {
        &self.board[index]
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn current_player(&self) -> usize {
        self.current
    }

    pub fn turns_played(&self) -> u32 {
        self.turns_played
    }

    pub fn parking_pool(&self) -> i64 {
        self.parking_pool
    }

    /// Take all notifications queued since the last drain.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn emit(&mut self, event: GameEvent) {
        tracing::debug!(?event, "game event");
        self.events.push(event);
    }

    pub fn solvent_players(&self) -> usize {
        self.players.iter().filter(|p| !p.bankrupt).count()
    }

    fn solvent_others(&self, player: usize) -> Vec<usize> {
        (0..self.players.len())
            .filter(|&q| q != player && !self.players[q].bankrupt)
            .collect()
    }

    /// The game runs until one solvent player remains or the turn limit
    /// converts it into a stalemate.
    pub fn is_running(&self) -> bool {
        self.turns_played < self.config.max_turns && self.solvent_players() > 1
    }

    /// Rotate to the next solvent player. Bounded scan; returns false when
    /// every player is bankrupt instead of spinning.
    fn select_next_player(&mut self) -> bool {
        let n = self.players.len();
        for _ in 0..n {
            self.current = (self.current + 1) % n;
            if !self.players[self.current].bankrupt {
                return true;
            }
        }
        false
    }

    /// Run one player's turn, including any doubles repeats. Each repeat
    /// counts against the turn limit like a turn of its own.
    pub fn advance_one_turn(&mut self, rng: &mut impl Rng) {
        if !self.is_running() || !self.select_next_player() {
            return;
        }
        let player = self.current;
        loop {
            let roll = Roll::random(rng);
            let doubles = self.play_single_turn(player, roll, rng);
            if !doubles
                || self.players[player].bankrupt
                || self.turns_played >= self.config.max_turns
            {
                break;
            }
        }
    }

    /// One roll's worth of turn: jail resolution, movement, landing, and the
    /// post-move economy. Returns whether doubles earned a repeat.
    fn play_single_turn(&mut self, player: usize, roll: Roll, rng: &mut impl Rng) -> bool {
        self.turns_played += 1;
        self.emit(GameEvent::DiceRolled {
            player,
            dice: (roll.first, roll.second),
        });

        if self.players[player].in_jail && !self.resolve_jail(player, roll) {
            return false;
        }

        let from = self.players[player].position;
        let mut to = from + roll.total();
        if to >= BOARD_SIZE {
            to -= BOARD_SIZE;
            let bonus = self.config.pass_go_bonus;
            self.credit(player, bonus);
            self.emit(GameEvent::PassedGo { player, bonus });
        }
        self.players[player].position = to;
        self.emit(GameEvent::Moved { player, from, to });

        self.resolve_landing(player, roll, rng);
        if self.players[player].bankrupt {
            return false;
        }
        self.post_move_economy(player);
        roll.is_double()
    }

    /// Returns whether the player gets to move this turn. Doubles break a
    /// player out immediately; the fourth consecutive jail turn releases
    /// unconditionally.
    fn resolve_jail(&mut self, player: usize, roll: Roll) -> bool {
        self.players[player].turns_in_jail += 1;
        if roll.is_double() || self.players[player].turns_in_jail >= 4 {
            self.players[player].in_jail = false;
            self.players[player].turns_in_jail = 0;
            self.emit(GameEvent::ReleasedFromJail { player });
            true
        } else {
            false
        }
    }

    fn resolve_landing(&mut self, player: usize, roll: Roll, rng: &mut impl Rng) {
        enum Landing {
            Ownable,
            Card(DeckKind),
            GoToJail,
            FreeParking,
            Tax(i64),
            Nothing,
        }
        let pos = self.players[player].position;
        let landing = match self.board[pos].kind {
            TileKind::Property { .. } | TileKind::Railroad { .. } | TileKind::Utility { .. } => {
                Landing::Ownable
            }
            TileKind::Chance => Landing::Card(DeckKind::Chance),
            TileKind::CommunityChest => Landing::Card(DeckKind::CommunityChest),
            TileKind::GoToJail => Landing::GoToJail,
            TileKind::FreeParking => Landing::FreeParking,
            TileKind::Tax { amount } => Landing::Tax(amount),
            TileKind::Go | TileKind::Jail => Landing::Nothing,
        };
        match landing {
            Landing::Ownable => self.resolve_ownable(player, pos, roll.total() as i64),
            Landing::Card(deck) => self.draw_and_apply(player, deck, roll, rng),
            Landing::GoToJail => {
                self.players[player].go_to_jail();
                self.emit(GameEvent::WentToJail { player });
            }
            Landing::FreeParking => {
                let amount = std::mem::take(&mut self.parking_pool);
                self.credit(player, amount);
                self.emit(GameEvent::FreeParkingCollected { player, amount });
            }
            Landing::Tax(amount) => {
                let paid = self.deduct(player, amount, None);
                self.parking_pool += paid;
                self.emit(GameEvent::TaxPaid {
                    player,
                    amount: paid,
                });
            }
            Landing::Nothing => {}
        }
    }

    /// Purchase / rent / no-op dispatch for an ownable tile under the
    /// auto-buy policy.
    fn resolve_ownable(&mut self, player: usize, pos: usize, roll_total: i64) {
        match self.board[pos].owner() {
            None => self.buy(player, pos),
            Some(owner) if owner == player => self.emit(GameEvent::Landed {
                player,
                tile: pos,
                outcome: LandingOutcome::NoEffect,
            }),
            Some(owner) => {
                let amount = self.rent(pos, roll_total);
                self.transfer(player, owner, amount);
                self.emit(GameEvent::Landed {
                    player,
                    tile: pos,
                    outcome: LandingOutcome::PaidRent { to: owner, amount },
                });
            }
        }
    }

    /// Buy an unowned tile at face value. Buying beyond one's means runs
    /// through liquidation like any other deduction.
    pub fn buy(&mut self, player: usize, pos: usize) {
        if !self.board[pos].is_ownable() || self.board[pos].owner().is_some() {
            tracing::warn!(tile = pos, "buy on a tile that is not purchasable");
            return;
        }
        let price = self.board[pos].price();
        self.deduct(player, price, None);
        if self.players[player].bankrupt {
            return;
        }
        self.board[pos].set_owner(Some(player));
        self.players[player].assets.push(pos);
        self.emit(GameEvent::Landed {
            player,
            tile: pos,
            outcome: LandingOutcome::Purchased { price },
        });
    }

    pub(crate) fn count_in_set(&self, player: usize, set: SetId) -> usize {
        self.board
            .iter()
            .filter(|t| t.set_id() == Some(set) && t.owner() == Some(player))
            .count()
    }

    pub fn owns_full_set(&self, player: usize, set: SetId) -> bool {
        self.count_in_set(player, set) == set.size()
    }

    fn in_completed_set(&self, tile: usize) -> bool {
        match (self.board[tile].owner(), self.board[tile].set_id()) {
            (Some(owner), Some(set)) => self.owns_full_set(owner, set),
            _ => false,
        }
    }

    /// Rent due for landing on `pos`. Mortgaged tiles earn nothing; utility
    /// rent is keyed to the roll that landed the payer here.
    pub fn rent(&self, pos: usize, roll_total: i64) -> i64 {
        let tile = &self.board[pos];
        let owner = match tile.owner() {
            Some(owner) => owner,
            None => {
                tracing::warn!(tile = pos, "rent on an unowned tile");
                return 0;
            }
        };
        if tile.is_mortgaged() {
            return 0;
        }
        match tile.kind {
            TileKind::Property {
                rents,
                group,
                houses,
                ..
            } => {
                if self.owns_full_set(owner, SetId::Group(group)) {
                    if houses == 0 {
                        rents[0] * 2
                    } else {
                        rents[houses as usize]
                    }
                } else {
                    rents[0]
                }
            }
            TileKind::Railroad { .. } => railroad_rent(self.count_in_set(owner, SetId::Railroads)),
            TileKind::Utility { .. } => {
                if self.owns_full_set(owner, SetId::Utilities) {
                    roll_total * 10
                } else {
                    roll_total * 4
                }
            }
            _ => 0,
        }
    }

    pub fn credit(&mut self, player: usize, amount: i64) {
        if self.players[player].bankrupt {
            tracing::warn!(player, "credit to a bankrupt player dropped");
            return;
        }
        self.players[player].balance += amount;
    }

    /// Deduct, liquidating as needed. Returns the amount actually collected;
    /// a shortfall bankrupts the player and yields whatever they had left.
    pub fn deduct(&mut self, player: usize, amount: i64, creditor: Option<usize>) -> i64 {
        if self.players[player].bankrupt {
            tracing::warn!(player, "deduct from a bankrupt player dropped");
            return 0;
        }
        if amount > self.players[player].balance {
            self.liquidate(player, amount);
        }
        let balance = self.players[player].balance;
        if amount > balance {
            self.bankrupt(player, creditor);
            balance
        } else {
            self.players[player].balance = balance - amount;
            amount
        }
    }

    /// Move money between players; a payer who cannot cover the debt goes
    /// bankrupt with the payee as creditor, who then collects the remainder
    /// in assets.
    pub fn transfer(&mut self, payer: usize, payee: usize, amount: i64) {
        let paid = self.deduct(payer, amount, Some(payee));
        self.credit(payee, paid);
    }

    /// Raise cash toward `target` in ordered, exhaustive passes. Each pass
    /// re-sorts so the least valuable assets are consumed first.
    fn liquidate(&mut self, player: usize, target: i64) {
        // Pass 1: mortgage assets outside any completed monopoly.
        broker::sort_assets_by_worth(self, player);
        let order: Vec<usize> = self.players[player].assets.iter().rev().copied().collect();
        for tile in order {
            if self.players[player].balance >= target {
                return;
            }
            if !self.board[tile].is_mortgaged() && !self.in_completed_set(tile) {
                self.mortgage(tile);
            }
        }

        // Pass 2: sell houses one at a time, always from the property
        // currently holding the most.
        loop {
            if self.players[player].balance >= target {
                return;
            }
            let candidate = self.players[player]
                .assets
                .iter()
                .copied()
                .max_by_key(|&t| self.board[t].houses());
            match candidate {
                Some(tile) if self.board[tile].houses() > 0 => self.sell_house(tile),
                _ => break,
            }
        }

        // Pass 3: mortgage whatever is left.
        broker::sort_assets_by_worth(self, player);
        let order: Vec<usize> = self.players[player].assets.iter().rev().copied().collect();
        for tile in order {
            if self.players[player].balance >= target {
                return;
            }
            if !self.board[tile].is_mortgaged() {
                self.mortgage(tile);
            }
        }
    }

    /// Terminal: fix the sentinel balance, hand remaining assets to the
    /// creditor (or back to the bank), and drop out of the rotation for good.
    fn bankrupt(&mut self, player: usize, creditor: Option<usize>) {
        self.players[player].balance = BANKRUPT_BALANCE;
        self.players[player].bankrupt = true;
        let assets = std::mem::take(&mut self.players[player].assets);
        match creditor {
            Some(c) if !self.players[c].bankrupt => {
                for tile in assets {
                    self.board[tile].set_owner(Some(c));
                    self.players[c].assets.push(tile);
                }
            }
            _ => {
                for tile in assets {
                    self.board[tile].set_owner(None);
                    self.board[tile].set_mortgaged(false);
                    self.board[tile].set_houses(0);
                }
            }
        }
        self.emit(GameEvent::Bankrupted { player, creditor });
    }

    /// Move one asset to a new owner, keeping the ownership partition intact.
    pub(crate) fn transfer_asset(&mut self, tile: usize, to: usize) {
        let from = match self.board[tile].owner() {
            Some(from) => from,
            None => {
                tracing::warn!(tile, "asset transfer of an unowned tile");
                return;
            }
        };
        self.players[from].assets.retain(|&t| t != tile);
        self.board[tile].set_owner(Some(to));
        self.players[to].assets.push(tile);
    }

    /// Mortgage an asset for half its face value. A built-up monopoly member
    /// first force-sells every house in its group at half house price.
    pub fn mortgage(&mut self, tile: usize) {
        let owner = match self.board[tile].owner() {
            Some(owner) => owner,
            None => {
                tracing::warn!(tile, "mortgage on an unowned tile");
                return;
            }
        };
        if self.board[tile].is_mortgaged() {
            tracing::warn!(tile, "mortgage on an already mortgaged tile");
            return;
        }
        if let Some(set @ SetId::Group(_)) = self.board[tile].set_id() {
            if self.owns_full_set(owner, set) {
                let members: Vec<usize> = (0..BOARD_SIZE)
                    .filter(|&i| self.board[i].set_id() == Some(set))
                    .collect();
                for member in members {
                    let houses = self.board[member].houses();
                    if houses > 0 {
                        let refund = i64::from(houses) * self.board[member].house_price() / 2;
                        self.board[member].set_houses(0);
                        self.credit(owner, refund);
                        self.emit(GameEvent::HouseSold {
                            player: owner,
                            tile: member,
                            houses: 0,
                        });
                    }
                }
            }
        }
        let principal = self.board[tile].price() / 2;
        self.board[tile].set_mortgaged(true);
        self.credit(owner, principal);
        self.emit(GameEvent::Mortgaged {
            player: owner,
            tile,
        });
    }

    /// Clear a mortgage for 110% of half the face value, affordable only
    /// when the balance exceeds the fee.
    pub fn unmortgage(&mut self, tile: usize) {
        let owner = match self.board[tile].owner() {
            Some(owner) => owner,
            None => {
                tracing::warn!(tile, "unmortgage on an unowned tile");
                return;
            }
        };
        if !self.board[tile].is_mortgaged() {
            return;
        }
        let fee = redemption_fee(self.board[tile].price());
        if self.players[owner].balance <= fee {
            return;
        }
        self.players[owner].balance -= fee;
        self.board[tile].set_mortgaged(false);
        self.emit(GameEvent::Unmortgaged {
            player: owner,
            tile,
        });
    }

    /// The even-build rule: only on an unmortgaged member of a completed
    /// color group, and never ahead of the group's other members.
    pub fn allowed_to_build(&self, tile: usize) -> bool {
        let t = &self.board[tile];
        let set = match t.set_id() {
            Some(set @ SetId::Group(_)) => set,
            _ => return false,
        };
        let owner = match t.owner() {
            Some(owner) => owner,
            None => return false,
        };
        if t.is_mortgaged() || t.has_hotel() || !self.owns_full_set(owner, set) {
            return false;
        }
        let mine = t.houses();
        self.board
            .iter()
            .all(|m| m.set_id() != Some(set) || m.houses() >= mine)
    }

    /// Buy one house (the fifth converts to a hotel). Returns whether a
    /// house was placed.
    pub fn buy_house(&mut self, tile: usize) -> bool {
        if !self.allowed_to_build(tile) {
            tracing::warn!(tile, "house purchase where building is not allowed");
            return false;
        }
        let owner = match self.board[tile].owner() {
            Some(owner) => owner,
            None => return false,
        };
        let price = self.board[tile].house_price();
        self.deduct(owner, price, None);
        if self.players[owner].bankrupt {
            return false;
        }
        let houses = self.board[tile].houses() + 1;
        self.board[tile].set_houses(houses);
        self.emit(GameEvent::HouseBuilt {
            player: owner,
            tile,
            houses,
        });
        true
    }

    /// Sell one house back to the bank at half price.
    pub fn sell_house(&mut self, tile: usize) {
        let owner = match self.board[tile].owner() {
            Some(owner) => owner,
            None => {
                tracing::warn!(tile, "house sale on an unowned tile");
                return;
            }
        };
        let houses = self.board[tile].houses();
        if houses == 0 {
            return;
        }
        self.board[tile].set_houses(houses - 1);
        let refund = self.board[tile].house_price() / 2;
        self.credit(owner, refund);
        self.emit(GameEvent::HouseSold {
            player: owner,
            tile,
            houses: houses - 1,
        });
    }

    /// Trades to exhaustion, then building, then mortgage redemption.
    fn post_move_economy(&mut self, player: usize) {
        for other in self.solvent_others(player) {
            // Bounded: valuations can oscillate, exhaustion must terminate.
            let mut rounds = self.players[player].assets.len() + self.players[other].assets.len();
            while rounds > 0 && broker::build_best_trade_offer(self, player, other) {
                rounds -= 1;
            }
        }

        broker::sort_assets_by_worth(self, player);
        let assets = self.players[player].assets.clone();
        for tile in assets {
            loop {
                let price = self.board[tile].house_price();
                if price == 0
                    || price * 4 >= self.players[player].balance
                    || !self.allowed_to_build(tile)
                {
                    break;
                }
                if !self.buy_house(tile) {
                    break;
                }
            }
        }

        // Redeem mortgages while the fee stays small next to cash on hand,
        // least valuable assets first.
        broker::sort_assets_by_worth(self, player);
        let assets: Vec<usize> = self.players[player].assets.iter().rev().copied().collect();
        for tile in assets {
            if self.board[tile].is_mortgaged()
                && redemption_fee(self.board[tile].price()) * 4 < self.players[player].balance
            {
                self.unmortgage(tile);
            }
        }
    }

    fn draw_and_apply(&mut self, player: usize, deck: DeckKind, roll: Roll, rng: &mut impl Rng) {
        let card = match deck {
            DeckKind::Chance => self.chance.draw(rng).clone(),
            DeckKind::CommunityChest => self.community_chest.draw(rng).clone(),
        };
        self.emit(GameEvent::CardDrawn {
            player,
            deck,
            message: card.message,
        });
        self.apply_card(player, &card, roll, rng);
    }

    /// Run a card's effect program against a player. A program that moves
    /// the token onto an ownable tile resolves that landing again: unowned
    /// tiles are bought, and rent is charged unless a jackpot command
    /// already settled it.
    fn apply_card(&mut self, player: usize, card: &Card, roll: Roll, rng: &mut impl Rng) {
        let mut relocated = false;
        let mut settled = false;
        for command in &card.program {
            if self.players[player].bankrupt {
                return;
            }
            match *command {
                Command::Advance(dest) => {
                    if dest < self.players[player].position {
                        let bonus = self.config.pass_go_bonus;
                        self.credit(player, bonus);
                        self.emit(GameEvent::PassedGo { player, bonus });
                    }
                    self.players[player].position = dest;
                    relocated = true;
                }
                Command::AdvanceNearest(kind) => {
                    let mut pos = self.players[player].position;
                    loop {
                        pos = (pos + 1) % BOARD_SIZE;
                        let hit = match kind {
                            NearestKind::Railroad => {
                                matches!(self.board[pos].kind, TileKind::Railroad { .. })
                            }
                            NearestKind::Utility => {
                                matches!(self.board[pos].kind, TileKind::Utility { .. })
                            }
                        };
                        if hit {
                            break;
                        }
                    }
                    self.players[player].position = pos;
                    relocated = true;
                }
                Command::Goto(dest) => {
                    self.players[player].position = dest;
                    relocated = true;
                }
                Command::Earn(amount) => self.credit(player, amount),
                Command::EarnFromAll(amount) => {
                    for other in self.solvent_others(player) {
                        self.transfer(other, player, amount);
                    }
                }
                Command::Pay(amount) => {
                    let paid = self.deduct(player, amount, None);
                    self.parking_pool += paid;
                }
                Command::PayAll(amount) => {
                    for other in self.solvent_others(player) {
                        self.transfer(player, other, amount);
                        if self.players[player].bankrupt {
                            break;
                        }
                    }
                }
                Command::PayBuildings {
                    per_house,
                    per_hotel,
                } => {
                    let fee: i64 = self.players[player]
                        .assets
                        .iter()
                        .map(|&t| match self.board[t].houses() {
                            0 => 0,
                            5 => per_hotel,
                            houses => i64::from(houses) * per_house,
                        })
                        .sum();
                    let paid = self.deduct(player, fee, None);
                    self.parking_pool += paid;
                }
                Command::GetOutOfJail => self.players[player].jail_cards += 1,
                Command::GoToJail => {
                    self.players[player].go_to_jail();
                    self.emit(GameEvent::WentToJail { player });
                }
                Command::UtilityJackpot => {
                    let pos = self.players[player].position;
                    if matches!(self.board[pos].kind, TileKind::Utility { .. }) {
                        if let Some(owner) = self.board[pos].owner() {
                            if owner != player {
                                let jackpot_roll = Roll::random(rng);
                                self.transfer(player, owner, jackpot_roll.total() as i64 * 10);
                            }
                        }
                        settled = true;
                    } else {
                        tracing::warn!(tile = pos, "utility-jackpot away from a utility");
                    }
                }
                Command::RailroadJackpot => {
                    let pos = self.players[player].position;
                    if matches!(self.board[pos].kind, TileKind::Railroad { .. }) {
                        if let Some(owner) = self.board[pos].owner() {
                            if owner != player {
                                let amount = self.rent(pos, 0) * 2;
                                self.transfer(player, owner, amount);
                            }
                        }
                        settled = true;
                    } else {
                        tracing::warn!(tile = pos, "railroad-jackpot away from a railroad");
                    }
                }
                Command::Move(delta) => {
                    let pos = self.players[player].position as i64 + delta;
                    self.players[player].position = pos.rem_euclid(BOARD_SIZE as i64) as usize;
                }
                Command::Unknown(ref verb) => {
                    tracing::warn!(%verb, card = card.message, "unknown card command ignored");
                }
            }
        }

        if relocated && !self.players[player].bankrupt {
            let pos = self.players[player].position;
            if self.board[pos].is_ownable() {
                match self.board[pos].owner() {
                    None => self.buy(player, pos),
                    Some(owner) if owner != player && !settled => {
                        let amount = self.rent(pos, roll.total() as i64);
                        self.transfer(player, owner, amount);
                        self.emit(GameEvent::Landed {
                            player,
                            tile: pos,
                            outcome: LandingOutcome::PaidRent { to: owner, amount },
                        });
                    }
                    _ => {}
                }
            }
        }
    }

    /// A player's share of the broker-valued capitalization in play.
    pub fn chance_of_winning(&self, player: usize) -> f64 {
        let mut total = 0i64;
        let mut own = 0i64;
        for (i, p) in self.players.iter().enumerate() {
            let value: i64 = p
                .assets
                .iter()
                .map(|&t| broker::value_to_client(self, i, t))
                .sum();
            total += value;
            if i == player {
                own = value;
            }
        }
        if total == 0 {
            1.0 / self.players.len() as f64
        } else {
            own as f64 / total as f64
        }
    }
}

impl std::fmt::Display for GameState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Turn {}", self.turns_played)?;
        for (i, p) in self.players.iter().enumerate() {
            let marker = if i == self.current { '>' } else { ' ' };
            let status = if p.bankrupt {
                " [bankrupt]".to_owned()
            } else {
                format!(" @ {}", self.board[p.position].name)
            };
            writeln!(f, "{} {}{}", marker, p, status)?;
        }
        Ok(())
    }
}

/// 25, 50, 100, 200 for 1..=4 railroads under one owner.
fn railroad_rent(owned: usize) -> i64 {
    match owned {
        0 => 0,
        n => 25 << (n - 1),
    }
}

/// Fee to lift a mortgage: 110% of half the face value.
fn redemption_fee(price: i64) -> i64 {
    ((price / 2) as f64 * 1.1) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn game_with(names: &[&str]) -> GameState {
        GameState::new(names, GameConfig::default()).unwrap()
    }

    fn grant(game: &mut GameState, player: usize, tile: usize) {
        game.board[tile].set_owner(Some(player));
        game.players[player].assets.push(tile);
    }

    fn assert_ownership_partition(game: &GameState) {
        for (pos, tile) in game.board.iter().enumerate() {
            let holders = game
                .players
                .iter()
                .filter(|p| p.assets.contains(&pos))
                .count();
            match tile.owner() {
                Some(owner) => {
                    assert_eq!(holders, 1, "tile {} held by {} collections", pos, holders);
                    assert!(
                        game.players[owner].assets.contains(&pos),
                        "tile {} owner mismatch",
                        pos
                    );
                }
                None => assert_eq!(holders, 0, "unowned tile {} in a collection", pos),
            }
        }
    }

    #[test]
    fn unowned_tile_is_auto_purchased() {
        let mut game = game_with(&["North", "East"]);
        game.players[0].position = 5;
        game.resolve_ownable(0, 5, 7);
        assert_eq!(game.players[0].balance, 1300);
        assert_eq!(game.board[5].owner(), Some(0));
        assert!(game.players[0].assets.contains(&5));
        assert_ownership_partition(&game);
    }

    #[test]
    fn railroad_rent_table() {
        let mut game = game_with(&["North", "East"]);
        let expected = [25, 50, 100, 200];
        for (i, &railroad) in [5usize, 15, 25, 35].iter().enumerate() {
            grant(&mut game, 1, railroad);
            assert_eq!(game.rent(5, 0), expected[i]);
        }
        // Full set: rent is 200 on any of the four.
        for railroad in [5, 15, 25, 35] {
            assert_eq!(game.rent(railroad, 0), 200);
        }
    }

    #[test]
    fn utility_rent_tracks_the_roll() {
        let mut game = game_with(&["North", "East"]);
        grant(&mut game, 1, 12);
        assert_eq!(game.rent(12, 7), 28);
        grant(&mut game, 1, 28);
        assert_eq!(game.rent(12, 7), 70);
    }

    #[test]
    fn monopoly_doubles_base_rent_and_houses_use_the_table() {
        let mut game = game_with(&["North", "East"]);
        grant(&mut game, 1, 1);
        assert_eq!(game.rent(1, 0), 2); // no monopoly: bare table entry
        grant(&mut game, 1, 3);
        assert_eq!(game.rent(1, 0), 4); // monopoly, no houses: doubled
        game.board[1].set_houses(3);
        assert_eq!(game.rent(1, 0), 90);
        game.board[1].set_houses(5);
        assert_eq!(game.rent(1, 0), 250);
    }

    #[test]
    fn mortgaged_tiles_collect_no_rent() {
        let mut game = game_with(&["North", "East"]);
        grant(&mut game, 1, 39);
        game.board[39].set_mortgaged(true);
        assert_eq!(game.rent(39, 0), 0);
    }

    #[test]
    fn mortgage_roundtrip_costs_a_tenth_of_half_face() {
        let mut game = game_with(&["North", "East"]);
        grant(&mut game, 0, 39); // Boardwalk, face 400
        game.mortgage(39);
        assert_eq!(game.players[0].balance, 1700);
        assert!(game.board[39].is_mortgaged());
        game.unmortgage(39);
        assert!(!game.board[39].is_mortgaged());
        assert_eq!(game.players[0].balance, 1480); // net -20 = 0.1 * 200
    }

    #[test]
    fn unmortgage_needs_more_than_the_fee() {
        let mut game = game_with(&["North", "East"]);
        grant(&mut game, 0, 39);
        game.mortgage(39);
        game.players[0].balance = 220; // fee is exactly 220
        game.unmortgage(39);
        assert!(game.board[39].is_mortgaged());
        game.players[0].balance = 221;
        game.unmortgage(39);
        assert!(!game.board[39].is_mortgaged());
    }

    #[test]
    fn mortgaging_a_built_monopoly_sheds_group_houses_first() {
        let mut game = game_with(&["North", "East"]);
        grant(&mut game, 0, 1);
        grant(&mut game, 0, 3);
        game.board[1].set_houses(2);
        game.board[3].set_houses(1);
        let before = game.players[0].balance;
        game.mortgage(1);
        assert_eq!(game.board[1].houses(), 0);
        assert_eq!(game.board[3].houses(), 0);
        // 3 houses at half of $50 each, plus half of face 60.
        assert_eq!(game.players[0].balance, before + 75 + 30);
    }

    #[test]
    fn build_rules() {
        let mut game = game_with(&["North", "East"]);
        grant(&mut game, 0, 1);
        // Not a monopoly yet.
        assert!(!game.allowed_to_build(1));
        grant(&mut game, 0, 3);
        assert!(game.allowed_to_build(1));
        // Mortgaged member cannot build, regardless of houses.
        game.board[1].set_mortgaged(true);
        assert!(!game.allowed_to_build(1));
        game.board[1].set_mortgaged(false);
        // Even build: a house ahead of the group blocks further building.
        assert!(game.buy_house(1));
        assert!(!game.allowed_to_build(1));
        assert!(game.allowed_to_build(3));
        // Railroads never take houses.
        grant(&mut game, 0, 5);
        assert!(!game.allowed_to_build(5));
    }

    #[test]
    fn fifth_house_is_a_hotel() {
        let mut game = game_with(&["North", "East"]);
        grant(&mut game, 0, 1);
        grant(&mut game, 0, 3);
        for _ in 0..5 {
            assert!(game.buy_house(1));
            assert!(game.buy_house(3));
        }
        assert!(game.board[1].has_hotel());
        assert!(!game.allowed_to_build(1));
        assert_eq!(game.players[0].balance, 1500 - 10 * 50);
    }

    #[test]
    fn insufficient_liquidation_bankrupts_to_the_creditor() {
        let mut game = game_with(&["North", "East"]);
        game.players[0].balance = 40;
        // Two group-7 members (of three): no monopoly, mortgage for 150 each.
        grant(&mut game, 0, 31);
        grant(&mut game, 0, 32);
        game.transfer(0, 1, 500);
        assert!(game.players[0].bankrupt);
        assert_eq!(game.players[0].balance, BANKRUPT_BALANCE);
        assert!(game.players[0].assets.is_empty());
        // Creditor got the 340 raised plus both (mortgaged) tiles.
        assert_eq!(game.players[1].balance, 1500 + 340);
        assert_eq!(game.board[31].owner(), Some(1));
        assert_eq!(game.board[32].owner(), Some(1));
        assert!(game.board[31].is_mortgaged());
        assert_ownership_partition(&game);
    }

    #[test]
    fn liquidation_spares_monopolies_until_it_cannot() {
        let mut game = game_with(&["North", "East"]);
        game.players[0].balance = 0;
        grant(&mut game, 0, 1);
        grant(&mut game, 0, 3); // completed group 1
        grant(&mut game, 0, 5); // stray railroad
        // A 100 debt is covered by mortgaging the railroad alone.
        game.transfer(0, 1, 100);
        assert!(!game.players[0].bankrupt);
        assert!(game.board[5].is_mortgaged());
        assert!(!game.board[1].is_mortgaged());
        assert!(!game.board[3].is_mortgaged());
    }

    #[test]
    fn liquidation_sells_houses_from_the_tallest_stack() {
        let mut game = game_with(&["North", "East"]);
        game.players[0].balance = 0;
        grant(&mut game, 0, 1);
        grant(&mut game, 0, 3);
        game.board[1].set_houses(3);
        game.board[3].set_houses(2);
        // A 50 debt takes two house sales at $25 each; the tallest stack
        // sells first.
        game.transfer(0, 1, 50);
        assert!(!game.players[0].bankrupt);
        assert_eq!(game.board[1].houses() + game.board[3].houses(), 3);
        assert!(game.board[1].houses() <= 2);
    }

    #[test]
    fn bankruptcy_without_creditor_returns_assets_to_the_bank() {
        let mut game = game_with(&["North", "East"]);
        game.players[0].balance = 10;
        grant(&mut game, 0, 12);
        game.board[12].set_mortgaged(true); // nothing left to liquidate
        game.deduct(0, 500, None);
        assert!(game.players[0].bankrupt);
        assert_eq!(game.board[12].owner(), None);
        assert!(!game.board[12].is_mortgaged());
        assert_ownership_partition(&game);
    }

    #[test]
    fn doubles_repeats_count_as_turns() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut game = game_with(&["North", "East"]);
        let doubles = Roll { first: 2, second: 2 };
        assert!(game.play_single_turn(0, doubles, &mut rng));
        assert_eq!(game.turns_played(), 1);
        assert!(game.play_single_turn(0, doubles, &mut rng));
        assert_eq!(game.turns_played(), 2);
        let plain = Roll { first: 2, second: 3 };
        assert!(!game.play_single_turn(0, plain, &mut rng));
        assert_eq!(game.turns_played(), 3);
    }

    #[test]
    fn jail_holds_without_doubles() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut game = game_with(&["North", "East"]);
        game.players[0].go_to_jail();
        let repeat = game.play_single_turn(0, Roll { first: 2, second: 5 }, &mut rng);
        assert!(!repeat);
        assert!(game.players[0].in_jail);
        assert_eq!(game.players[0].position, board::JAIL_POSITION);
        assert_eq!(game.players[0].turns_in_jail, 1);
    }

    #[test]
    fn jail_releases_on_doubles_and_moves() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut game = game_with(&["North", "East"]);
        game.players[0].go_to_jail();
        game.play_single_turn(0, Roll { first: 3, second: 3 }, &mut rng);
        assert!(!game.players[0].in_jail);
        assert_eq!(game.players[0].position, 16);
        assert_eq!(game.players[0].turns_in_jail, 0);
    }

    #[test]
    fn jail_releases_unconditionally_on_the_fourth_turn() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut game = game_with(&["North", "East"]);
        game.players[0].go_to_jail();
        game.players[0].turns_in_jail = 3;
        game.play_single_turn(0, Roll { first: 1, second: 4 }, &mut rng);
        assert!(!game.players[0].in_jail);
        assert_eq!(game.players[0].position, 15);
    }

    #[test]
    fn landing_on_go_to_jail() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut game = game_with(&["North", "East"]);
        game.players[0].position = 25;
        game.play_single_turn(0, Roll { first: 2, second: 3 }, &mut rng);
        assert!(game.players[0].in_jail);
        assert_eq!(game.players[0].position, board::JAIL_POSITION);
    }

    #[test]
    fn free_parking_pays_out_the_pool() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut game = game_with(&["North", "East"]);
        game.parking_pool = 300;
        game.players[0].position = 20;
        game.resolve_landing(0, Roll { first: 1, second: 1 }, &mut rng);
        assert_eq!(game.players[0].balance, 1800);
        assert_eq!(game.parking_pool(), 0);
    }

    #[test]
    fn tax_feeds_the_parking_pool() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut game = game_with(&["North", "East"]);
        game.players[0].position = 38;
        game.resolve_landing(0, Roll { first: 1, second: 1 }, &mut rng);
        assert_eq!(game.players[0].balance, 1400);
        assert_eq!(game.parking_pool(), 100);
    }

    #[test]
    fn advance_credits_go_only_when_wrapping() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut game = game_with(&["North", "East"]);
        let roll = Roll { first: 3, second: 4 };

        // Forward move: no bonus, and the unowned destination is bought.
        game.players[0].position = 3;
        let card = Card::parse("test", "advance 5;").unwrap();
        game.apply_card(0, &card, roll, &mut rng);
        assert_eq!(game.players[0].balance, 1300);
        assert_eq!(game.board[5].owner(), Some(0));

        // Wrapping advance earns the bonus; goto never does.
        game.players[0].position = 36;
        let card = Card::parse("test", "advance 1;").unwrap();
        game.apply_card(0, &card, roll, &mut rng);
        assert_eq!(game.players[0].balance, 1300 + 200 - 60);
        let balance = game.players[0].balance;
        game.players[0].position = 36;
        let card = Card::parse("test", "goto 0;").unwrap();
        game.apply_card(0, &card, roll, &mut rng);
        assert_eq!(game.players[0].balance, balance);
        assert_eq!(game.players[0].position, 0);
    }

    #[test]
    fn card_relocation_charges_rent_again() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut game = game_with(&["North", "East"]);
        grant(&mut game, 1, 39);
        game.players[0].position = 36;
        let card = Card::parse("test", "advance 39;").unwrap();
        game.apply_card(0, &card, Roll { first: 3, second: 4 }, &mut rng);
        // Boardwalk base rent without a monopoly is 50; no pass-go bonus.
        assert_eq!(game.players[0].balance, 1450);
        assert_eq!(game.players[1].balance, 1550);
    }

    #[test]
    fn advance_nearest_wraps_forward() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut game = game_with(&["North", "East"]);
        game.players[0].position = 36;
        let card = Card::parse("test", "advance nearest railroad;").unwrap();
        game.apply_card(0, &card, Roll { first: 3, second: 4 }, &mut rng);
        assert_eq!(game.players[0].position, 5);
        game.players[0].position = 13;
        let card = Card::parse("test", "advance nearest utility;").unwrap();
        game.apply_card(0, &card, Roll { first: 3, second: 4 }, &mut rng);
        assert_eq!(game.players[0].position, 28);
    }

    #[test]
    fn railroad_jackpot_is_double_rent() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut game = game_with(&["North", "East"]);
        grant(&mut game, 1, 5);
        grant(&mut game, 1, 15);
        game.players[0].position = 36;
        let card = Card::parse("test", "advance nearest railroad; railroad-jackpot;").unwrap();
        game.apply_card(0, &card, Roll { first: 3, second: 4 }, &mut rng);
        // Two railroads rent 50, doubled; the jackpot settles the landing,
        // so no ordinary rent on top.
        assert_eq!(game.players[0].balance, 1400);
        assert_eq!(game.players[1].balance, 1600);
    }

    #[test]
    fn earn_from_all_and_pay_all() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut game = game_with(&["North", "East", "South"]);
        let roll = Roll { first: 1, second: 2 };
        let card = Card::parse("test", "earn from-all 50;").unwrap();
        game.apply_card(0, &card, roll, &mut rng);
        assert_eq!(game.players[0].balance, 1600);
        assert_eq!(game.players[1].balance, 1450);
        assert_eq!(game.players[2].balance, 1450);
        let card = Card::parse("test", "pay all 100;").unwrap();
        game.apply_card(0, &card, roll, &mut rng);
        assert_eq!(game.players[0].balance, 1400);
        assert_eq!(game.players[1].balance, 1550);
        assert_eq!(game.players[2].balance, 1550);
    }

    #[test]
    fn pay_buildings_assesses_houses_and_hotels() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut game = game_with(&["North", "East"]);
        grant(&mut game, 0, 1);
        grant(&mut game, 0, 3);
        game.board[1].set_houses(5); // hotel
        game.board[3].set_houses(2);
        let card = Card::parse("test", "pay buildings 40 115;").unwrap();
        game.apply_card(0, &card, Roll { first: 1, second: 2 }, &mut rng);
        assert_eq!(game.players[0].balance, 1500 - 115 - 80);
        assert_eq!(game.parking_pool(), 195);
    }

    #[test]
    fn get_out_of_jail_cards_accumulate() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut game = game_with(&["North", "East"]);
        let card = Card::parse("test", "get-out-of-jail;").unwrap();
        game.apply_card(0, &card, Roll { first: 1, second: 2 }, &mut rng);
        game.apply_card(0, &card, Roll { first: 1, second: 2 }, &mut rng);
        assert_eq!(game.players[0].jail_cards, 2);
    }

    #[test]
    fn rotation_skips_bankrupt_players() {
        let mut game = game_with(&["North", "East", "South"]);
        game.players[1].bankrupt = true;
        assert!(game.select_next_player());
        assert_eq!(game.current_player(), 0);
        assert!(game.select_next_player());
        assert_eq!(game.current_player(), 2);
        game.players[0].bankrupt = true;
        game.players[2].bankrupt = true;
        assert!(!game.select_next_player());
    }

    #[test]
    fn stalemate_at_the_turn_limit() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let config = GameConfig {
            max_turns: 50,
            ..GameConfig::default()
        };
        let mut game = GameState::new(&["North", "East"], config).unwrap();
        while game.is_running() {
            game.advance_one_turn(&mut rng);
        }
        assert!(game.turns_played() >= 50 || game.solvent_players() <= 1);
    }

    #[test]
    fn full_game_preserves_invariants() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let config = GameConfig {
            max_turns: 2000,
            ..GameConfig::default()
        };
        let mut game = GameState::new(&["North", "East", "South", "West"], config).unwrap();
        while game.is_running() {
            game.advance_one_turn(&mut rng);
            for p in game.players() {
                if !p.bankrupt {
                    assert!(p.balance >= 0, "{} solvent but negative", p.name);
                } else {
                    assert_eq!(p.balance, BANKRUPT_BALANCE);
                    assert!(p.assets.is_empty());
                }
                assert!(p.position < BOARD_SIZE);
            }
            assert_ownership_partition(&game);
        }
        assert!(!game.is_running());
        assert!(!game.drain_events().is_empty());
    }

    #[test]
    fn chance_of_winning_sums_to_one() {
        let mut game = game_with(&["North", "East"]);
        // No assets anywhere: even odds.
        assert!((game.chance_of_winning(0) - 0.5).abs() < 1e-9);
        grant(&mut game, 0, 1);
        grant(&mut game, 1, 5);
        let total = game.chance_of_winning(0) + game.chance_of_winning(1);
        assert!((total - 1.0).abs() < 1e-9);
        assert!(game.chance_of_winning(0) > 0.0);
    }
}
