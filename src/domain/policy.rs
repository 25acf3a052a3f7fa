//! Risk policy: maps an SME's credit score to the terms it is offered.
//!
//! The policy is a versioned value injected into the decision engine. A request
//! records the fee rate and policy version in force when it was created, so
//! editing the policy never rewrites historical requests.

use super::money::Rate;
use crate::error::{FinanceError, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Terms offered to an SME for a given risk tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskTerms {
    /// Fee charged on the financed amount.
    pub fee_rate: Rate,
    /// Share of the invoice amount that may be financed.
    pub eligibility: Rate,
}

/// A score band `[min_score, next tier's min_score)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskTier {
    pub min_score: Decimal,
    pub fee_rate: Rate,
    pub eligibility: Rate,
}

impl RiskTier {
    pub fn terms(&self) -> RiskTerms {
        RiskTerms {
            fee_rate: self.fee_rate,
            eligibility: self.eligibility,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskPolicy {
    pub version: u32,
    /// Terms for an SME with no score on record.
    pub unknown: RiskTerms,
    /// Tiers ordered by strictly ascending `min_score`, the first starting at 0.
    pub tiers: Vec<RiskTier>,
}

fn rate(value: Decimal) -> Rate {
    Rate::new_unchecked(value)
}

fn tier(min_score: Decimal, fee_rate: Decimal, eligibility: Decimal) -> RiskTier {
    RiskTier {
        min_score,
        fee_rate: rate(fee_rate),
        eligibility: rate(eligibility),
    }
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self {
            version: 1,
            unknown: RiskTerms {
                fee_rate: rate(dec!(0.08)),
                eligibility: rate(dec!(0.60)),
            },
            tiers: vec![
                tier(dec!(0), dec!(0.08), dec!(0.60)),
                tier(dec!(40), dec!(0.05), dec!(0.70)),
                tier(dec!(60), dec!(0.03), dec!(0.80)),
                tier(dec!(80), dec!(0.015), dec!(0.90)),
            ],
        }
    }
}

impl RiskPolicy {
    /// Builds a policy, rejecting tables with gaps, overlaps or unusable terms.
    pub fn new(version: u32, unknown: RiskTerms, tiers: Vec<RiskTier>) -> Result<Self> {
        let policy = Self {
            version,
            unknown,
            tiers,
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let policy: Self = serde_json::from_str(json)
            .map_err(|e| FinanceError::Config(format!("invalid risk policy: {e}")))?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            FinanceError::Config(format!("cannot read risk policy {}: {e}", path.display()))
        })?;
        Self::from_json_str(&json)
    }

    fn validate(&self) -> Result<()> {
        let Some(first) = self.tiers.first() else {
            return Err(FinanceError::Config(
                "risk policy needs at least one tier".to_string(),
            ));
        };
        if first.min_score != Decimal::ZERO {
            return Err(FinanceError::Config(format!(
                "first risk tier must start at 0, starts at {}",
                first.min_score
            )));
        }
        for pair in self.tiers.windows(2) {
            if pair[1].min_score <= pair[0].min_score {
                return Err(FinanceError::Config(format!(
                    "risk tiers must be strictly ascending: {} follows {}",
                    pair[1].min_score, pair[0].min_score
                )));
            }
        }
        let all_terms = std::iter::once(self.unknown).chain(self.tiers.iter().map(RiskTier::terms));
        for terms in all_terms {
            if terms.eligibility.value() == Decimal::ZERO {
                return Err(FinanceError::Config(
                    "eligibility fraction must be greater than 0".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Terms for a score, or for "no score on record" when `score` is `None`.
    ///
    /// Tier bounds are inclusive below and exclusive above, so a score exactly
    /// on a boundary gets the higher tier.
    pub fn terms(&self, score: Option<Decimal>) -> RiskTerms {
        let Some(score) = score else {
            return self.unknown;
        };
        self.tiers
            .iter()
            .rev()
            .find(|tier| tier.min_score <= score)
            .map(RiskTier::terms)
            .unwrap_or(self.unknown)
    }
}
