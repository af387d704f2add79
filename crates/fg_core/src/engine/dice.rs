//! Dice sources. Every roll in the engine flows through the `DiceRoller`
//! trait so tests can script exact sequences and searches can own their
//! own seeded streams.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// The six faces of a block die, mapped from a d6:
/// 1 = attacker down, 2 = both down, 3-4 = pushed,
/// 5 = defender stumbles, 6 = defender down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockDieFace {
    AttackerDown,
    BothDown,
    Pushed,
    DefenderStumbles,
    DefenderDown,
}

pub fn block_face_from_d6(roll: i32) -> BlockDieFace {
    match roll {
        1 => BlockDieFace::AttackerDown,
        2 => BlockDieFace::BothDown,
        3 | 4 => BlockDieFace::Pushed,
        5 => BlockDieFace::DefenderStumbles,
        _ => BlockDieFace::DefenderDown,
    }
}

pub trait DiceRoller {
    fn d6(&mut self) -> i32;
    fn d8(&mut self) -> i32;

    fn d2d6(&mut self) -> i32 {
        self.d6() + self.d6()
    }

    fn block_die(&mut self) -> BlockDieFace {
        block_face_from_d6(self.d6())
    }
}

/// Production dice: a seeded ChaCha8 stream. Same seed, same match.
pub struct SeededDice {
    rng: ChaCha8Rng,
}

impl SeededDice {
    pub fn new(seed: u64) -> Self {
        SeededDice {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        SeededDice {
            rng: ChaCha8Rng::from_entropy(),
        }
    }
}

impl DiceRoller for SeededDice {
    fn d6(&mut self) -> i32 {
        self.rng.gen_range(1..=6)
    }

    fn d8(&mut self) -> i32 {
        self.rng.gen_range(1..=8)
    }
}

/// Test dice: consumes a scripted queue of values. Drawing past the end of
/// the script is a test bug and aborts immediately.
pub struct FixedDice {
    rolls: Vec<i32>,
    index: usize,
}

impl FixedDice {
    pub fn new(rolls: Vec<i32>) -> Self {
        FixedDice { rolls, index: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.rolls.len() - self.index
    }

    fn next(&mut self) -> i32 {
        assert!(
            self.index < self.rolls.len(),
            "FixedDice: script exhausted after {} rolls",
            self.rolls.len()
        );
        let roll = self.rolls[self.index];
        self.index += 1;
        roll
    }
}

impl DiceRoller for FixedDice {
    fn d6(&mut self) -> i32 {
        self.next()
    }

    fn d8(&mut self) -> i32 {
        self.next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_dice_deterministic() {
        let mut a = SeededDice::new(42);
        let mut b = SeededDice::new(42);
        for _ in 0..100 {
            assert_eq!(a.d6(), b.d6());
            assert_eq!(a.d8(), b.d8());
        }
    }

    #[test]
    fn test_seeded_dice_in_range() {
        let mut dice = SeededDice::new(7);
        for _ in 0..1000 {
            let d6 = dice.d6();
            assert!((1..=6).contains(&d6), "d6 out of range: {}", d6);
            let d8 = dice.d8();
            assert!((1..=8).contains(&d8), "d8 out of range: {}", d8);
            let two = dice.d2d6();
            assert!((2..=12).contains(&two), "2d6 out of range: {}", two);
        }
    }

    #[test]
    fn test_block_die_mapping() {
        assert_eq!(block_face_from_d6(1), BlockDieFace::AttackerDown);
        assert_eq!(block_face_from_d6(2), BlockDieFace::BothDown);
        assert_eq!(block_face_from_d6(3), BlockDieFace::Pushed);
        assert_eq!(block_face_from_d6(4), BlockDieFace::Pushed);
        assert_eq!(block_face_from_d6(5), BlockDieFace::DefenderStumbles);
        assert_eq!(block_face_from_d6(6), BlockDieFace::DefenderDown);
    }

    #[test]
    fn test_fixed_dice_consumes_in_order() {
        let mut dice = FixedDice::new(vec![3, 5, 1]);
        assert_eq!(dice.d6(), 3);
        assert_eq!(dice.d8(), 5);
        assert_eq!(dice.d6(), 1);
        assert_eq!(dice.remaining(), 0);
    }

    #[test]
    #[should_panic(expected = "script exhausted")]
    fn test_fixed_dice_panics_when_empty() {
        let mut dice = FixedDice::new(vec![6]);
        dice.d6();
        dice.d6();
    }
}
