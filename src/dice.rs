use rand::Rng;

/// The outcome of throwing two six-sided dice. Keeping the dice separate lets
/// the engine spot doubles.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Roll {
    pub first: u8,
    pub second: u8,
}

impl Roll {
    pub fn random(rng: &mut impl Rng) -> Self {
        Roll {
            first: rng.gen_range(1..=6),
            second: rng.gen_range(1..=6),
        }
    }

    pub fn total(self) -> usize {
        usize::from(self.first) + usize::from(self.second)
    }

    pub fn is_double(self) -> bool {
        self.first == self.second
    }
}
