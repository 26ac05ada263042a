//! The three power bowls.

use tmledger_foundation::{Error, Resource, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Power tokens split across bowls I, II and III.
///
/// Gaining power moves tokens I → II first, then II → III. Spending moves
/// tokens from III back to I. Burning destroys one token in II for each
/// token moved to III.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PowerBowls {
    /// Bowl I (inactive).
    pub bowl1: i32,
    /// Bowl II.
    pub bowl2: i32,
    /// Bowl III (spendable).
    pub bowl3: i32,
}

impl PowerBowls {
    /// Creates bowls with the given contents.
    #[must_use]
    pub const fn new(bowl1: i32, bowl2: i32, bowl3: i32) -> Self {
        Self {
            bowl1,
            bowl2,
            bowl3,
        }
    }

    /// Total tokens across all bowls.
    #[must_use]
    pub const fn total(&self) -> i32 {
        self.bowl1 + self.bowl2 + self.bowl3
    }

    /// The most power a gain could still move: every token in I counts
    /// twice, every token in II once.
    #[must_use]
    pub const fn capacity(&self) -> i32 {
        self.bowl1 * 2 + self.bowl2
    }

    /// Gains power and returns how much was actually applied.
    pub fn gain(&mut self, amount: i32) -> i32 {
        if amount <= 0 {
            return 0;
        }
        let first = amount.min(self.bowl1);
        self.bowl1 -= first;
        self.bowl2 += first;
        let second = (amount - first).min(self.bowl2);
        self.bowl2 -= second;
        self.bowl3 += second;
        first + second
    }

    /// Spends power from bowl III.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientResources` if bowl III holds less than `amount`.
    pub fn spend(&mut self, amount: i32) -> Result<()> {
        if amount > self.bowl3 {
            return Err(Error::insufficient(Resource::Power, amount, self.bowl3));
        }
        self.bowl3 -= amount;
        self.bowl1 += amount;
        Ok(())
    }

    /// Burns `amount` tokens: bowl II loses twice that, bowl III gains it.
    ///
    /// # Errors
    ///
    /// Returns `IllegalAction` if bowl II is too small.
    pub fn burn(&mut self, amount: i32) -> Result<()> {
        if amount < 0 || self.bowl2 < amount * 2 {
            return Err(Error::illegal(format!(
                "cannot burn {amount}: bowl II holds {}",
                self.bowl2
            )));
        }
        self.bowl2 -= amount * 2;
        self.bowl3 += amount;
        Ok(())
    }
}
