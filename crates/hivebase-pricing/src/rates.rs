use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use hivebase_types::prelude::Timestamp;

use crate::errors::PricingError;
use crate::money::round8;
use crate::usage::{Usage, UsageKind, UsageMoney};

/// One dated table of pollen-per-unit rates. A service keeps several cards
/// so rates can change over time; the active card is the newest one whose
/// effective date is strictly before "now".
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RateCard {
    pub effective_date: Timestamp,
    pub rates: BTreeMap<UsageKind, f64>,
}

impl RateCard {
    pub fn new(effective_date: Timestamp) -> Self {
        Self {
            effective_date,
            rates: BTreeMap::new(),
        }
    }

    pub fn rate(mut self, kind: UsageKind, pollen_per_unit: f64) -> Self {
        self.rates.insert(kind, pollen_per_unit);
        self
    }

    /// Zero-rate card over every usage kind, used for free price tables.
    pub fn free(effective_date: Timestamp) -> Self {
        Self {
            effective_date,
            rates: UsageKind::ALL.iter().map(|kind| (*kind, 0.0)).collect(),
        }
    }

    /// Rate for a kind. Reasoning tokens bill as completion text when no
    /// explicit reasoning rate is configured.
    pub fn lookup(&self, kind: UsageKind) -> Option<f64> {
        match self.rates.get(&kind) {
            Some(rate) => Some(*rate),
            None if kind == UsageKind::CompletionReasoningTokens => self
                .rates
                .get(&UsageKind::CompletionTextTokens)
                .copied(),
            None => None,
        }
    }

    pub fn is_all_zero(&self) -> bool {
        self.rates.values().all(|rate| *rate == 0.0)
    }

    pub fn scaled(&self, factor: f64) -> RateCard {
        RateCard {
            effective_date: self.effective_date,
            rates: self
                .rates
                .iter()
                .map(|(kind, rate)| (*kind, round8(rate * factor)))
                .collect(),
        }
    }
}

/// Newest card strictly before `now`. `cards` must be sorted by effective
/// date descending (the registry sorts at construction).
pub fn active_card(cards: &[RateCard], now: Timestamp) -> Option<&RateCard> {
    cards.iter().find(|card| card.effective_date < now)
}

/// Convert a sparse usage record with one card. Every populated kind must
/// have a rate (or the reasoning→text fallback); a missing rate is a hard
/// error so a new usage dimension can never be billed as zero silently.
pub fn convert(card: &RateCard, usage: &Usage, service: &str) -> Result<UsageMoney, PricingError> {
    let mut lines = BTreeMap::new();
    let mut total = 0.0;
    for (kind, amount) in usage.iter() {
        let rate = card
            .lookup(kind)
            .ok_or_else(|| PricingError::unknown_usage_kind(kind.as_str(), service))?;
        let line = round8(amount * rate);
        total += line;
        lines.insert(kind, line);
    }
    Ok(UsageMoney {
        lines,
        total: round8(total),
    })
}
