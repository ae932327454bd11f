use serde::Serialize;

/// Which deck a card came from.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum DeckKind {
    Chance,
    CommunityChest,
}

/// What landing on an ownable tile amounted to.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum LandingOutcome {
    Purchased { price: i64 },
    PaidRent { to: usize, amount: i64 },
    NoEffect,
}

/// One-way notifications emitted by the engine. Players are referred to by
/// index into the game's player list, tiles by board position. Drivers drain
/// these and decide how (or whether) to render them; the engine never blocks
/// on their consumption.
#[derive(Clone, Debug, Serialize)]
pub enum GameEvent {
    DiceRolled {
        player: usize,
        dice: (u8, u8),
    },
    PassedGo {
        player: usize,
        bonus: i64,
    },
    Moved {
        player: usize,
        from: usize,
        to: usize,
    },
    Landed {
        player: usize,
        tile: usize,
        outcome: LandingOutcome,
    },
    CardDrawn {
        player: usize,
        deck: DeckKind,
        message: &'static str,
    },
    TradeExecuted {
        proposer: usize,
        counterparty: usize,
        gave: usize,
        received: usize,
        cash: i64,
    },
    Mortgaged {
        player: usize,
        tile: usize,
    },
    Unmortgaged {
        player: usize,
        tile: usize,
    },
    HouseBuilt {
        player: usize,
        tile: usize,
        houses: u8,
    },
    HouseSold {
        player: usize,
        tile: usize,
        houses: u8,
    },
    TaxPaid {
        player: usize,
        amount: i64,
    },
    FreeParkingCollected {
        player: usize,
        amount: i64,
    },
    WentToJail {
        player: usize,
    },
    ReleasedFromJail {
        player: usize,
    },
    Bankrupted {
        player: usize,
        creditor: Option<usize>,
    },
}
