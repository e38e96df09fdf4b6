//! In-memory currency balances.

use std::collections::BTreeMap;

use crystal_defence_core::{Cost, Currency, GameError};
use serde::{Deserialize, Serialize};

/// Currency balances and the derived score multiplier.
///
/// Spending is atomic: every listed currency is checked before any balance is
/// touched, so a rejected purchase leaves the ledger unchanged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EconomyLedger {
    crystals: f64,
    score: f64,
    multiplier: f64,
    tech_points: f64,
    essences: f64,
    fragments: f64,
    cores: f64,
}

impl EconomyLedger {
    /// Creates a ledger holding the provided crystals, a multiplier of one
    /// and nothing else.
    #[must_use]
    pub fn new(starting_crystals: f64) -> Self {
        Self {
            crystals: starting_crystals,
            score: 0.0,
            multiplier: 1.0,
            tech_points: 0.0,
            essences: 0.0,
            fragments: 0.0,
            cores: 0.0,
        }
    }

    /// Current balance of a currency.
    #[must_use]
    pub fn balance(&self, currency: Currency) -> f64 {
        match currency {
            Currency::Crystals => self.crystals,
            Currency::Score => self.score,
            Currency::Multiplier => self.multiplier,
            Currency::TechPoints => self.tech_points,
            Currency::Essences => self.essences,
            Currency::Fragments => self.fragments,
            Currency::Cores => self.cores,
        }
    }

    /// Score multiplier applied to kill rewards.
    #[must_use]
    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Reports whether every listed balance covers the requested amount.
    #[must_use]
    pub fn can_afford(&self, cost: &Cost) -> bool {
        self.shortfall(cost).is_none()
    }

    /// Deducts every listed currency, or nothing at all.
    pub fn spend(&mut self, cost: &Cost) -> Result<(), GameError> {
        if let Some(error) = self.shortfall(cost) {
            return Err(error);
        }

        for (currency, amount) in cost.iter() {
            *self.slot_mut(currency) -= amount;
        }
        Ok(())
    }

    /// Every balance keyed by currency, in ledger order.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<Currency, f64> {
        Currency::ALL
            .into_iter()
            .map(|currency| (currency, self.balance(currency)))
            .collect()
    }

    /// Adds the amount to a currency balance exactly as given.
    pub fn earn(&mut self, currency: Currency, amount: f64) {
        *self.slot_mut(currency) += amount;
    }

    fn shortfall(&self, cost: &Cost) -> Option<GameError> {
        cost.iter().find_map(|(currency, required)| {
            let available = self.balance(currency);
            (available < required).then_some(GameError::InsufficientFunds {
                currency,
                required,
                available,
            })
        })
    }

    fn slot_mut(&mut self, currency: Currency) -> &mut f64 {
        match currency {
            Currency::Crystals => &mut self.crystals,
            Currency::Score => &mut self.score,
            Currency::Multiplier => &mut self.multiplier,
            Currency::TechPoints => &mut self.tech_points,
            Currency::Essences => &mut self.essences,
            Currency::Fragments => &mut self.fragments,
            Currency::Cores => &mut self.cores,
        }
    }
}

impl Default for EconomyLedger {
    fn default() -> Self {
        Self::new(0.0)
    }
}
