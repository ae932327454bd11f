use rand::Rng;
use serde::Serialize;
use thiserror::Error;

use crate::board::BOARD_SIZE;
use crate::events::DeckKind;

/// Raised while parsing a card's effect program at deck construction time.
/// Malformed programs are fatal at load, never during play.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CardError {
    #[error("card {card:?}: command {command:?} is missing an argument")]
    MissingArgument { card: &'static str, command: String },
    #[error("card {card:?}: bad numeric argument in {command:?}")]
    BadArgument { card: &'static str, command: String },
    #[error("card {card:?}: tile index {index} is off the board")]
    TileOutOfRange { card: &'static str, index: usize },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum NearestKind {
    Railroad,
    Utility,
}

/// One primitive command of a card's effect program.
#[derive(Clone, PartialEq, Debug, Serialize)]
pub enum Command {
    /// Advance to an absolute position, crediting the pass-go bonus when the
    /// destination lies behind the current position.
    Advance(usize),
    /// Advance forward circularly to the next railroad/utility.
    AdvanceNearest(NearestKind),
    /// Teleport, no pass-go bonus.
    Goto(usize),
    Earn(i64),
    /// Collect from every other player, funded by deducting each.
    EarnFromAll(i64),
    /// Pay into the free-parking pool.
    Pay(i64),
    /// Pay every other player individually.
    PayAll(i64),
    /// Assessed against the player's own houses and hotels; proceeds go to
    /// the free-parking pool.
    PayBuildings { per_house: i64, per_hotel: i64 },
    GetOutOfJail,
    GoToJail,
    UtilityJackpot,
    RailroadJackpot,
    /// Relative movement; never re-resolves the landing.
    Move(i64),
    /// Unrecognized verb: a diagnosed no-op, not a fatal error.
    Unknown(String),
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct Card {
    pub message: &'static str,
    pub program: Vec<Command>,
}

impl Card {
    /// Parse a `;`-separated effect script. Each command is whitespace
    /// tokenized; surrounding whitespace per command is stripped.
    pub fn parse(message: &'static str, script: &str) -> Result<Self, CardError> {
        let mut program = Vec::new();
        for raw in script.split(';') {
            let command = raw.trim();
            if command.is_empty() {
                continue;
            }
            program.push(parse_command(message, command)?);
        }
        Ok(Card { message, program })
    }
}

fn parse_amount(card: &'static str, command: &str, token: Option<&str>) -> Result<i64, CardError> {
    let token = token.ok_or_else(|| CardError::MissingArgument {
        card,
        command: command.to_owned(),
    })?;
    token.parse().map_err(|_| CardError::BadArgument {
        card,
        command: command.to_owned(),
    })
}

fn parse_tile_index(card: &'static str, command: &str, token: Option<&str>) -> Result<usize, CardError> {
    let index = parse_amount(card, command, token)?;
    let index = usize::try_from(index).map_err(|_| CardError::BadArgument {
        card,
        command: command.to_owned(),
    })?;
    if index >= BOARD_SIZE {
        return Err(CardError::TileOutOfRange { card, index });
    }
    Ok(index)
}

fn parse_command(card: &'static str, command: &str) -> Result<Command, CardError> {
    let mut words = command.split_whitespace();
    let verb = words.next().unwrap_or("");
    match verb {
        "advance" => match words.next() {
            Some("nearest") => match words.next() {
                Some("railroad") => Ok(Command::AdvanceNearest(NearestKind::Railroad)),
                Some("utility") => Ok(Command::AdvanceNearest(NearestKind::Utility)),
                _ => Err(CardError::BadArgument {
                    card,
                    command: command.to_owned(),
                }),
            },
            token => Ok(Command::Advance(parse_tile_index(card, command, token)?)),
        },
        "goto" => Ok(Command::Goto(parse_tile_index(
            card,
            command,
            words.next(),
        )?)),
        "earn" => match words.next() {
            Some("from-all") => Ok(Command::EarnFromAll(parse_amount(
                card,
                command,
                words.next(),
            )?)),
            token => Ok(Command::Earn(parse_amount(card, command, token)?)),
        },
        "pay" => match words.next() {
            Some("all") => Ok(Command::PayAll(parse_amount(card, command, words.next())?)),
            Some("buildings") => Ok(Command::PayBuildings {
                per_house: parse_amount(card, command, words.next())?,
                per_hotel: parse_amount(card, command, words.next())?,
            }),
            token => Ok(Command::Pay(parse_amount(card, command, token)?)),
        },
        "get-out-of-jail" => Ok(Command::GetOutOfJail),
        "go-to-jail" => Ok(Command::GoToJail),
        "utility-jackpot" => Ok(Command::UtilityJackpot),
        "railroad-jackpot" => Ok(Command::RailroadJackpot),
        "move" => Ok(Command::Move(parse_amount(card, command, words.next())?)),
        _ => Ok(Command::Unknown(verb.to_owned())),
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Deck {
    pub kind: DeckKind,
    cards: Vec<Card>,
}

impl Deck {
    /// Uniform pick with replacement; cards are never removed from the deck.
    pub fn draw(&self, rng: &mut impl Rng) -> &Card {
        &self.cards[rng.gen_range(0..self.cards.len())]
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn chance() -> Result<Self, CardError> {
        let cards = CHANCE_CARDS
            .iter()
            .map(|&(message, script)| Card::parse(message, script))
            .collect::<Result<_, _>>()?;
        Ok(Deck {
            kind: DeckKind::Chance,
            cards,
        })
    }

    pub fn community_chest() -> Result<Self, CardError> {
        let cards = COMMUNITY_CHEST_CARDS
            .iter()
            .map(|&(message, script)| Card::parse(message, script))
            .collect::<Result<_, _>>()?;
        Ok(Deck {
            kind: DeckKind::CommunityChest,
            cards,
        })
    }
}

const PAY_50: &str = "pay 50;";

const COMMUNITY_CHEST_CARDS: [(&str, &str); 17] = [
    ("Advance to Go. Collect $200.", "goto 0; earn 200;"),
    ("Bank error in your favor. Collect $200.", "earn 200;"),
    ("Doctor fees. Pay $50.", PAY_50),
    ("From sale of stock you get $50.", "earn 50;"),
    (
        "Get out of jail free. This card may be kept until needed or sold/traded.",
        "get-out-of-jail;",
    ),
    (
        "Go to jail. Go directly to jail. Do not pass Go, Do not collect $200.",
        "go-to-jail;",
    ),
    (
        "Grand Opera Night. Collect $50 from every player for opening night seats.",
        "earn from-all 50;",
    ),
    ("Holiday Fund matures. Collect $100.", "earn 100;"),
    ("Income tax refund. Collect $20.", "earn 20;"),
    (
        "It's your birthday. Collect $10 from every player.",
        "earn from-all 10;",
    ),
    ("Life insurance matures. Collect $100.", "earn 100;"),
    ("Hospital Fees. Pay $50.", PAY_50),
    ("School Fees. Pay $50.", PAY_50),
    ("Receive $25 consultancy fee.", "earn 25;"),
    (
        "You are assessed for street repairs: Pay $40 per house and $115 per hotel you own.",
        "pay buildings 40 115",
    ),
    (
        "You have won second prize in a beauty contest. Collect $10.",
        "earn 10",
    ),
    ("You inherit $100.", "earn 100"),
];

const CHANCE_CARDS: [(&str, &str); 16] = [
    ("Advance to Go. Collect $200.", "goto 0; earn 200;"),
    (
        "Advance to Illinois Avenue. If you pass Go, collect $200.",
        "advance 24;",
    ),
    (
        "Advance to St. Charles Place. If you pass Go, collect $200.",
        "advance 11;",
    ),
    (
        "Advance token to nearest Utility. If unowned, you may buy it from the bank. If owned, throw dice and pay owner 10 times the amount thrown.",
        "advance nearest utility; utility-jackpot;",
    ),
    (
        "Advance token to nearest Railroad and pay owner twice the rent to which he is otherwise entitled. If Railroad is unowned, you may buy it from the Bank.",
        "advance nearest railroad; railroad-jackpot;",
    ),
    ("Bank pays you dividend of $50.", "earn 50;"),
    ("Get out of Jail Free.", "get-out-of-jail;"),
    ("Go back 3 spaces.", "move -3;"),
    (
        "Go to Jail. Go directly to Jail. Do not pass GO, do not collect $200.",
        "go-to-jail;",
    ),
    (
        "Make general repairs on all your property: For each house pay $25, For each hotel pay $100.",
        "pay buildings 25 100;",
    ),
    ("Pay poor tax of $15.", "pay 15;"),
    ("Take a trip to Reading Railroad.", "advance 5;"),
    (
        "Take a walk on the Boardwalk. Advance token to Boardwalk.",
        "advance 39;",
    ),
    (
        "You have been elected Chairman of the Board. Pay each player $50.",
        "pay all 50;",
    ),
    ("Your building and loan matures. Collect $150.", "earn 150;"),
    (
        "You have won a crossword competition. Collect $100.",
        "earn 100",
    ),
];
