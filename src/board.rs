use serde::Serialize;

pub const BOARD_SIZE: usize = 40;
pub const JAIL_POSITION: usize = 10;
pub const FREE_PARKING_POSITION: usize = 20;
pub const RAILROAD_PRICE: i64 = 200;
pub const UTILITY_PRICE: i64 = 150;

/// A monopoly set: one of the 8 color groups, all 4 railroads, or both
/// utilities.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum SetId {
    Group(u8),
    Railroads,
    Utilities,
}

impl SetId {
    pub fn size(self) -> usize {
        match self {
            SetId::Group(1) | SetId::Group(8) | SetId::Utilities => 2,
            SetId::Group(_) => 3,
            SetId::Railroads => 4,
        }
    }
}

/// Closed set of tile variants. Static data (prices, rent tables, groups) is
/// fixed at board construction; ownership state (owner, mortgaged, houses)
/// lives alongside it for the three ownable kinds. Owners are player indices.
#[derive(Clone, Debug, Serialize)]
pub enum TileKind {
    Go,
    Jail,
    GoToJail,
    FreeParking,
    Chance,
    CommunityChest,
    Tax {
        amount: i64,
    },
    Property {
        price: i64,
        // rents[0] = no houses, rents[1..=4] = houses, rents[5] = hotel.
        rents: [i64; 6],
        group: u8,
        owner: Option<usize>,
        mortgaged: bool,
        // 0..=4 houses; 5 encodes a hotel.
        houses: u8,
    },
    Railroad {
        owner: Option<usize>,
        mortgaged: bool,
    },
    Utility {
        owner: Option<usize>,
        mortgaged: bool,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct Tile {
    pub name: &'static str,
    pub kind: TileKind,
}

impl Tile {
    pub fn is_ownable(&self) -> bool {
        matches!(
            self.kind,
            TileKind::Property { .. } | TileKind::Railroad { .. } | TileKind::Utility { .. }
        )
    }

    pub fn owner(&self) -> Option<usize> {
        match self.kind {
            TileKind::Property { owner, .. }
            | TileKind::Railroad { owner, .. }
            | TileKind::Utility { owner, .. } => owner,
            _ => None,
        }
    }

    pub fn set_owner(&mut self, new_owner: Option<usize>) {
        match &mut self.kind {
            TileKind::Property { owner, .. }
            | TileKind::Railroad { owner, .. }
            | TileKind::Utility { owner, .. } => *owner = new_owner,
            _ => {}
        }
    }

    pub fn is_mortgaged(&self) -> bool {
        match self.kind {
            TileKind::Property { mortgaged, .. }
            | TileKind::Railroad { mortgaged, .. }
            | TileKind::Utility { mortgaged, .. } => mortgaged,
            _ => false,
        }
    }

    pub fn set_mortgaged(&mut self, m: bool) {
        match &mut self.kind {
            TileKind::Property { mortgaged, .. }
            | TileKind::Railroad { mortgaged, .. }
            | TileKind::Utility { mortgaged, .. } => *mortgaged = m,
            _ => {}
        }
    }

    /// Face (purchase) price; 0 for tiles that cannot be owned.
    pub fn price(&self) -> i64 {
        match self.kind {
            TileKind::Property { price, .. } => price,
            TileKind::Railroad { .. } => RAILROAD_PRICE,
            TileKind::Utility { .. } => UTILITY_PRICE,
            _ => 0,
        }
    }

    pub fn houses(&self) -> u8 {
        match self.kind {
            TileKind::Property { houses, .. } => houses,
            _ => 0,
        }
    }

    pub fn set_houses(&mut self, n: u8) {
        if let TileKind::Property { houses, .. } = &mut self.kind {
            *houses = n;
        }
    }

    pub fn has_hotel(&self) -> bool {
        self.houses() == 5
    }

    pub fn group(&self) -> Option<u8> {
        match self.kind {
            TileKind::Property { group, .. } => Some(group),
            _ => None,
        }
    }

    pub fn set_id(&self) -> Option<SetId> {
        match self.kind {
            TileKind::Property { group, .. } => Some(SetId::Group(group)),
            TileKind::Railroad { .. } => Some(SetId::Railroads),
            TileKind::Utility { .. } => Some(SetId::Utilities),
            _ => None,
        }
    }

    /// Price of a house on this property, tiered by color group.
    pub fn house_price(&self) -> i64 {
        match self.group() {
            Some(1) | Some(2) => 50,
            Some(3) | Some(4) => 100,
            Some(5) | Some(6) => 150,
            Some(_) => 200,
            None => 0,
        }
    }
}

impl std::fmt::Display for Tile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)?;
        let houses = self.houses();
        if houses == 5 {
            write!(f, " (w/ hotel)")?;
        } else if houses > 0 {
            write!(f, " ({} houses)", houses)?;
        }
        if self.is_mortgaged() {
            write!(f, " (mortgaged)")?;
        }
        Ok(())
    }
}

fn property(name: &'static str, price: i64, rents: [i64; 6], group: u8) -> Tile {
    Tile {
        name,
        kind: TileKind::Property {
            price,
            rents,
            group,
            owner: None,
            mortgaged: false,
            houses: 0,
        },
    }
}

fn railroad(name: &'static str) -> Tile {
    Tile {
        name,
        kind: TileKind::Railroad {
            owner: None,
            mortgaged: false,
        },
    }
}

fn utility(name: &'static str) -> Tile {
    Tile {
        name,
        kind: TileKind::Utility {
            owner: None,
            mortgaged: false,
        },
    }
}

fn plain(name: &'static str, kind: TileKind) -> Tile {
    Tile { name, kind }
}

/// The standard 40-tile board. Indices never change after construction.
pub fn build_board() -> Vec<Tile> {
    vec![
        plain("GO", TileKind::Go),
        property("Mediterranean Avenue", 60, [2, 10, 30, 90, 160, 250], 1),
        plain("Community Chest", TileKind::CommunityChest),
        property("Baltic Avenue", 60, [4, 20, 60, 180, 320, 450], 1),
        plain("Income Tax", TileKind::Tax { amount: 200 }),
        railroad("Reading Railroad"),
        property("Oriental Avenue", 100, [6, 30, 90, 270, 400, 550], 2),
        plain("Chance", TileKind::Chance),
        property("Vermont Avenue", 100, [6, 30, 90, 270, 400, 550], 2),
        property("Connecticut Avenue", 120, [8, 40, 100, 300, 450, 600], 2),
        plain("Jail", TileKind::Jail),
        property("St. Charles Place", 140, [10, 50, 150, 450, 625, 750], 3),
        utility("Electric Company"),
        property("States Avenue", 140, [10, 50, 150, 450, 625, 750], 3),
        property("Virginia Avenue", 160, [12, 60, 180, 500, 700, 900], 3),
        railroad("Pennsylvania Railroad"),
        property("St. James Place", 180, [14, 70, 200, 550, 750, 950], 4),
        plain("Community Chest", TileKind::CommunityChest),
        property("Tennessee Avenue", 180, [14, 70, 200, 550, 750, 950], 4),
        property("New York Avenue", 200, [16, 80, 220, 600, 800, 1000], 4),
        plain("Free Parking", TileKind::FreeParking),
        property("Kentucky Avenue", 220, [18, 90, 250, 700, 875, 1050], 5),
        plain("Chance", TileKind::Chance),
        property("Indiana Avenue", 220, [18, 90, 250, 700, 875, 1050], 5),
        property("Illinois Avenue", 240, [20, 100, 300, 750, 925, 1100], 5),
        railroad("B. & O. Railroad"),
        property("Atlantic Avenue", 260, [22, 110, 330, 800, 975, 1150], 6),
        property("Ventnor Avenue", 260, [22, 110, 330, 800, 975, 1150], 6),
        utility("Waterworks"),
        property("Marvin Gardens", 280, [24, 120, 360, 850, 1025, 1200], 6),
        plain("Go to Jail", TileKind::GoToJail),
        property("Pacific Avenue", 300, [26, 130, 390, 900, 1100, 1275], 7),
        property("North Carolina Avenue", 300, [26, 130, 390, 900, 1100, 1275], 7),
        plain("Community Chest", TileKind::CommunityChest),
        property("Pennsylvania Avenue", 320, [28, 150, 450, 1000, 1200, 1400], 7),
        railroad("Short Line"),
        plain("Chance", TileKind::Chance),
        property("Park Place", 350, [35, 175, 500, 1100, 1300, 1500], 8),
        plain("Luxury Tax", TileKind::Tax { amount: 100 }),
        property("Boardwalk", 400, [50, 200, 600, 1400, 1700, 2000], 8),
    ]
}
