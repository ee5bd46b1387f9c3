use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("ledger shortfall for {asset}: disposing {requested} but only {available} held")]
    Shortfall {
        asset: String,
        requested: Decimal,
        available: Decimal,
    },
}

/// An open acquisition lot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lot {
    pub quantity: Decimal,
    pub acquired_at: NaiveDateTime,
    pub cost_basis: Decimal,
    /// Fixed at creation, carried unchanged through splits
    pub unit_price: Decimal,
    pub venue: Option<String>,
    /// Zero-cost lot assumed to cover disposals of untracked holdings
    pub synthetic: bool,
}

impl Lot {
    fn new(
        quantity: Decimal,
        acquired_at: NaiveDateTime,
        cost_basis: Decimal,
        venue: Option<String>,
        synthetic: bool,
    ) -> Self {
        Lot {
            quantity,
            acquired_at,
            cost_basis,
            unit_price: cost_basis / quantity,
            venue,
            synthetic,
        }
    }
}

/// The part of a lot consumed by a disposal
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub quantity: Decimal,
    pub acquired_at: NaiveDateTime,
    pub cost_basis: Decimal,
    pub venue: Option<String>,
    pub synthetic: bool,
}

/// Open lots of one asset with their running total
#[derive(Debug, Default)]
struct Holding {
    lots: VecDeque<Lot>,
    quantity: Decimal,
}

/// FIFO sequence of open lots per asset
#[derive(Debug, Default)]
pub struct LotLedger {
    holdings: HashMap<String, Holding>,
}

impl LotLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an acquisition to the tail of the asset's sequence
    pub fn add(
        &mut self,
        asset: &str,
        quantity: Decimal,
        acquired_at: NaiveDateTime,
        cost_basis: Decimal,
        venue: Option<String>,
    ) {
        self.push(asset, Lot::new(quantity, acquired_at, cost_basis, venue, false));
    }

    /// Append a zero-cost lot standing in for holdings acquired before the
    /// recorded history
    pub fn add_synthetic(&mut self, asset: &str, quantity: Decimal, acquired_at: NaiveDateTime) {
        self.push(
            asset,
            Lot::new(quantity, acquired_at, Decimal::ZERO, None, true),
        );
    }

    fn push(&mut self, asset: &str, lot: Lot) {
        log::debug!(
            "Ledger {} ADD: qty={}, cost={}, acquired={}",
            asset,
            lot.quantity,
            lot.cost_basis,
            lot.acquired_at
        );
        let holding = self.holdings.entry(asset.to_string()).or_default();
        holding.quantity += lot.quantity;
        holding.lots.push_back(lot);
    }

    /// Consume `quantity` from the oldest lots first.
    ///
    /// Fragments are returned in the order the lots were drawn. A partially
    /// consumed lot keeps its remainder at the head of the sequence. The
    /// ledger is left untouched when it holds less than `quantity`.
    pub fn remove(&mut self, asset: &str, quantity: Decimal) -> Result<Vec<Fragment>, LedgerError> {
        let available = self.available(asset);
        if quantity > available {
            return Err(LedgerError::Shortfall {
                asset: asset.to_string(),
                requested: quantity,
                available,
            });
        }

        let mut fragments = Vec::new();
        let Some(holding) = self.holdings.get_mut(asset) else {
            return Ok(fragments);
        };
        holding.quantity -= quantity;
        let lots = &mut holding.lots;

        let mut remaining = quantity;
        while remaining > Decimal::ZERO {
            let Some(lot) = lots.front_mut() else {
                break;
            };

            if lot.quantity <= remaining {
                remaining -= lot.quantity;
                if let Some(lot) = lots.pop_front() {
                    log::debug!(
                        "Ledger {} REMOVE LOT: qty={}, cost={}, acquired={}",
                        asset,
                        lot.quantity,
                        lot.cost_basis,
                        lot.acquired_at
                    );
                    fragments.push(Fragment {
                        quantity: lot.quantity,
                        acquired_at: lot.acquired_at,
                        cost_basis: lot.cost_basis,
                        venue: lot.venue,
                        synthetic: lot.synthetic,
                    });
                }
            } else {
                // Split: cost of the retained part is the complement so the
                // two halves add up to the original cost exactly
                let consumed_cost = remaining * lot.unit_price;
                lot.quantity -= remaining;
                lot.cost_basis -= consumed_cost;
                log::debug!(
                    "Ledger {} REMOVE PART: qty={}, cost={}. Remaining in lot: qty={}, cost={}",
                    asset,
                    remaining,
                    consumed_cost,
                    lot.quantity,
                    lot.cost_basis
                );
                fragments.push(Fragment {
                    quantity: remaining,
                    acquired_at: lot.acquired_at,
                    cost_basis: consumed_cost,
                    venue: lot.venue.clone(),
                    synthetic: lot.synthetic,
                });
                remaining = Decimal::ZERO;
            }
        }

        Ok(fragments)
    }

    /// Total open quantity for an asset
    pub fn available(&self, asset: &str) -> Decimal {
        self.holdings
            .get(asset)
            .map(|h| h.quantity)
            .unwrap_or(Decimal::ZERO)
    }

    /// Open lots for an asset, oldest first
    pub fn lots(&self, asset: &str) -> impl Iterator<Item = &Lot> {
        self.holdings
            .get(asset)
            .into_iter()
            .flat_map(|h| h.lots.iter())
    }

    /// Assets with at least one open lot, sorted by name
    pub fn assets(&self) -> Vec<&str> {
        let mut assets: Vec<&str> = self
            .holdings
            .iter()
            .filter(|(_, h)| !h.lots.is_empty())
            .map(|(asset, _)| asset.as_str())
            .collect();
        assets.sort_unstable();
        assets
    }
}
