//! Prize selection glue
//!
//! The winning prize is chosen before the drop by an outside collaborator.
//! This module only sanity-checks that choice and, in classic mode, rearranges
//! the prize table so the winner is shown at the slot the ball actually hit.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrizeError {
    #[error("prize table is empty")]
    NoPrizes,
    #[error("winning index {index} is out of range ({count} prizes)")]
    IndexOutOfRange { index: usize, count: usize },
}

/// A prize shown in one slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prize {
    pub id: String,
    pub title: String,
}

impl Prize {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

/// Result of the prize draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizeSelection {
    pub winning_index: usize,
    pub seed: u64,
    pub prize_count: usize,
}

impl PrizeSelection {
    pub fn new(winning_index: usize, seed: u64, prize_count: usize) -> Self {
        Self {
            winning_index,
            seed,
            prize_count,
        }
    }

    pub fn validate(&self) -> Result<(), PrizeError> {
        if self.prize_count == 0 {
            return Err(PrizeError::NoPrizes);
        }
        if self.winning_index >= self.prize_count {
            return Err(PrizeError::IndexOutOfRange {
                index: self.winning_index,
                count: self.prize_count,
            });
        }
        Ok(())
    }
}

/// Swap prizes so the winner sits at `landed_slot`
///
/// Used in classic mode, where physics picks the slot and the display follows.
pub fn swap_to_slot<T>(slots: &mut [T], winning_index: usize, landed_slot: usize) -> Result<(), PrizeError> {
    let count = slots.len();
    if count == 0 {
        return Err(PrizeError::NoPrizes);
    }
    for index in [winning_index, landed_slot] {
        if index >= count {
            return Err(PrizeError::IndexOutOfRange { index, count });
        }
    }
    slots.swap(winning_index, landed_slot);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_validation() {
        assert!(PrizeSelection::new(2, 1, 7).validate().is_ok());
        assert_eq!(PrizeSelection::new(0, 1, 0).validate(), Err(PrizeError::NoPrizes));
        assert_eq!(
            PrizeSelection::new(7, 1, 7).validate(),
            Err(PrizeError::IndexOutOfRange { index: 7, count: 7 })
        );
    }

    #[test]
    fn test_swap_moves_winner_to_landed_slot() {
        let mut slots: Vec<Prize> = (0..5).map(|i| Prize::new(format!("p{i}"), format!("Prize {i}"))).collect();
        swap_to_slot(&mut slots, 1, 4).unwrap();
        assert_eq!(slots[4].id, "p1");
        assert_eq!(slots[1].id, "p4");

        // Same slot is a no-op
        swap_to_slot(&mut slots, 2, 2).unwrap();
        assert_eq!(slots[2].id, "p2");

        assert!(swap_to_slot(&mut slots, 0, 5).is_err());
    }
}
