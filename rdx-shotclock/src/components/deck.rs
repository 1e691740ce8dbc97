//! The shot order within one pattern: a permutation and a cursor.

use crate::pattern::SeriesOrder;
use rand::seq::SliceRandom;
use rand::Rng;

/// Walks a pattern's shot list, reshuffling on every wrap when randomized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShotDeck {
    order: Vec<usize>,
    cursor: usize,
    series: SeriesOrder,
}

impl ShotDeck {
    pub fn new<R: Rng + ?Sized>(len: usize, series: SeriesOrder, rng: &mut R) -> Self {
        let mut deck = Self {
            order: (0..len).collect(),
            cursor: 0,
            series,
        };
        deck.shuffle(rng);
        deck
    }

    /// Index into the shot list of the current shot, if the list is non-empty.
    pub fn current(&self) -> Option<usize> {
        self.order.get(self.cursor).copied()
    }

    /// Moves to the next shot. Returns `true` when the deck wrapped.
    pub fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if self.order.is_empty() {
            return false;
        }
        self.cursor += 1;
        if self.cursor < self.order.len() {
            return false;
        }
        self.cursor = 0;
        self.shuffle(rng);
        true
    }

    fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.series == SeriesOrder::Randomized {
            self.order.shuffle(rng);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn in_order_deck_cycles() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut deck = ShotDeck::new(3, SeriesOrder::InOrder, &mut rng);
        let mut seen = Vec::new();
        for _ in 0..7 {
            seen.push(deck.current().unwrap());
            deck.advance(&mut rng);
        }
        assert_eq!(seen, vec![0, 1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn randomized_deck_covers_each_shot_once_per_cycle() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut deck = ShotDeck::new(5, SeriesOrder::Randomized, &mut rng);
        for _ in 0..4 {
            let mut cycle = Vec::new();
            for _ in 0..5 {
                cycle.push(deck.current().unwrap());
                deck.advance(&mut rng);
            }
            cycle.sort_unstable();
            assert_eq!(cycle, vec![0, 1, 2, 3, 4]);
        }
    }

    #[test]
    fn wrap_is_reported() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut deck = ShotDeck::new(2, SeriesOrder::InOrder, &mut rng);
        assert!(!deck.advance(&mut rng));
        assert!(deck.advance(&mut rng));
    }

    #[test]
    fn empty_deck_has_no_current_shot() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut deck = ShotDeck::new(0, SeriesOrder::Randomized, &mut rng);
        assert_eq!(deck.current(), None);
        assert!(!deck.advance(&mut rng));
    }
}
