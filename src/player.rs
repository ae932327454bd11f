use serde::Serialize;

use crate::board::JAIL_POSITION;

/// Sentinel balance for a player that has gone bankrupt. Once set, the
/// balance is never again read as an economic quantity.
pub const BANKRUPT_BALANCE: i64 = -1;

#[derive(Clone, Debug, Serialize)]
pub struct Player {
    pub name: String,
    pub position: usize,
    pub balance: i64,
    pub in_jail: bool,
    pub turns_in_jail: u8,
    pub jail_cards: u32,
    /// Board indices of owned tiles. Kept consistent with each tile's owner
    /// field by the engine; an asset appears here iff this player owns it.
    pub assets: Vec<usize>,
    pub bankrupt: bool,
}

impl Player {
    pub fn new(name: &str, starting_balance: i64) -> Self {
        Player {
            name: name.to_owned(),
            position: 0,
            balance: starting_balance,
            in_jail: false,
            turns_in_jail: 0,
            jail_cards: 0,
            assets: Vec::new(),
            bankrupt: false,
        }
    }

    pub fn go_to_jail(&mut self) {
        self.in_jail = true;
        self.position = JAIL_POSITION;
    }
}

impl std::fmt::Display for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (${})", self.name, self.balance)
    }
}
