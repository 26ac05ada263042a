//! Resources and resource bundles.
//!
//! Conversion tokens spell bundles as `<n><code>` runs, e.g. `3PW` or `2W1C`.
//! A missing count means one.

use std::fmt;

use crate::error::{Error, Result};

/// A spendable resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Resource {
    /// Coins (`C`).
    Coins,
    /// Workers (`W`).
    Workers,
    /// Priests (`P`).
    Priests,
    /// Power tokens in bowl III (`PW`).
    Power,
    /// Victory points (`VP`).
    VictoryPoints,
}

impl Resource {
    /// All resources in canonical emission order.
    pub const ALL: [Self; 5] = [
        Self::Power,
        Self::Priests,
        Self::Workers,
        Self::Coins,
        Self::VictoryPoints,
    ];

    /// Returns the notation code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Coins => "C",
            Self::Workers => "W",
            Self::Priests => "P",
            Self::Power => "PW",
            Self::VictoryPoints => "VP",
        }
    }

    /// Parses a notation code (case-insensitive).
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_ascii_uppercase().as_str() {
            "C" => Some(Self::Coins),
            "W" => Some(Self::Workers),
            "P" => Some(Self::Priests),
            "PW" => Some(Self::Power),
            "VP" => Some(Self::VictoryPoints),
            _ => None,
        }
    }

    /// Parses a narrative word such as "coins", "Priests" or "power".
    #[must_use]
    pub fn from_word(word: &str) -> Option<Self> {
        let lower = word.to_ascii_lowercase();
        match lower.trim_end_matches('s') {
            "coin" => Some(Self::Coins),
            "worker" => Some(Self::Workers),
            "priest" => Some(Self::Priests),
            "power" => Some(Self::Power),
            "vp" => Some(Self::VictoryPoints),
            _ => None,
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A bundle of resource amounts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Resources {
    /// Coins.
    pub coins: i32,
    /// Workers.
    pub workers: i32,
    /// Priests.
    pub priests: i32,
    /// Power.
    pub power: i32,
    /// Victory points.
    pub vp: i32,
}

impl Resources {
    /// Creates an empty bundle.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            coins: 0,
            workers: 0,
            priests: 0,
            power: 0,
            vp: 0,
        }
    }

    /// Builder for coins.
    #[must_use]
    pub const fn with_coins(mut self, n: i32) -> Self {
        self.coins = n;
        self
    }

    /// Builder for workers.
    #[must_use]
    pub const fn with_workers(mut self, n: i32) -> Self {
        self.workers = n;
        self
    }

    /// Builder for priests.
    #[must_use]
    pub const fn with_priests(mut self, n: i32) -> Self {
        self.priests = n;
        self
    }

    /// Builder for power.
    #[must_use]
    pub const fn with_power(mut self, n: i32) -> Self {
        self.power = n;
        self
    }

    /// Builder for victory points.
    #[must_use]
    pub const fn with_vp(mut self, n: i32) -> Self {
        self.vp = n;
        self
    }

    /// Returns the amount of one resource.
    #[must_use]
    pub const fn get(&self, resource: Resource) -> i32 {
        match resource {
            Resource::Coins => self.coins,
            Resource::Workers => self.workers,
            Resource::Priests => self.priests,
            Resource::Power => self.power,
            Resource::VictoryPoints => self.vp,
        }
    }

    /// Returns a mutable reference to one resource.
    pub fn get_mut(&mut self, resource: Resource) -> &mut i32 {
        match resource {
            Resource::Coins => &mut self.coins,
            Resource::Workers => &mut self.workers,
            Resource::Priests => &mut self.priests,
            Resource::Power => &mut self.power,
            Resource::VictoryPoints => &mut self.vp,
        }
    }

    /// Adds an amount of one resource.
    pub fn add(&mut self, resource: Resource, amount: i32) {
        *self.get_mut(resource) += amount;
    }

    /// Returns true if every amount is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        Resource::ALL.iter().all(|r| self.get(*r) == 0)
    }

    /// Iterates over the non-zero amounts in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Resource, i32)> + '_ {
        Resource::ALL
            .iter()
            .map(|r| (*r, self.get(*r)))
            .filter(|(_, n)| *n != 0)
    }

    /// Cancels resources that appear on both sides of an exchange.
    ///
    /// Spending 2 workers to collect 3 workers is the same as collecting 1.
    #[must_use]
    pub fn net(cost: Self, reward: Self) -> (Self, Self) {
        let mut cost = cost;
        let mut reward = reward;
        for resource in Resource::ALL {
            let common = cost.get(resource).min(reward.get(resource));
            if common > 0 {
                *cost.get_mut(resource) -= common;
                *reward.get_mut(resource) -= common;
            }
        }
        (cost, reward)
    }

    /// Parses a bundle such as `3PW`, `W`, or `2W1C`.
    ///
    /// # Errors
    ///
    /// Returns an error if the text contains an unknown resource code.
    pub fn parse(text: &str) -> Result<Self> {
        let upper = text.trim().to_ascii_uppercase();
        if upper.is_empty() {
            return Err(Error::unknown_token(text, "empty resource bundle"));
        }
        let mut bundle = Self::new();
        let bytes = upper.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            let count = if i > start {
                upper[start..i]
                    .parse::<i32>()
                    .map_err(|_| Error::unknown_token(text, "bad resource count"))?
            } else {
                1
            };
            let code_start = i;
            while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
                i += 1;
            }
            let code = &upper[code_start..i];
            let resource = Resource::from_code(code)
                .ok_or_else(|| Error::unknown_token(text, "unknown resource code"))?;
            bundle.add(resource, count);
        }
        Ok(bundle)
    }
}

impl fmt::Display for Resources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (resource, amount) in self.iter() {
            write!(f, "{amount}{resource}")?;
        }
        Ok(())
    }
}
