use crate::domain::finance_request::NewFinanceRequest;
use crate::domain::ids::{InvoiceId, ScoreId, SmeId};
use crate::domain::money::{Amount, Rate};
use crate::domain::party::CreditScore;
use crate::domain::policy::RiskPolicy;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Outcome of pricing a financing request against the risk policy.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub fee_rate: Rate,
    pub eligibility: Rate,
    /// Advisory maximum to finance; never stored on the request.
    pub eligible_amount: Decimal,
    pub policy_version: u32,
    pub score_ref: Option<ScoreId>,
}

/// Applies the injected risk policy to an invoice amount.
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    policy: Arc<RiskPolicy>,
}

impl DecisionEngine {
    pub fn new(policy: RiskPolicy) -> Self {
        Self {
            policy: Arc::new(policy),
        }
    }

    pub fn policy(&self) -> &RiskPolicy {
        &self.policy
    }

    /// Prices `amount` for an SME whose latest score is `score` (`None` when unknown).
    pub fn assess(&self, amount: Amount, score: Option<&CreditScore>) -> Assessment {
        let terms = self.policy.terms(score.map(|s| s.value));
        tracing::debug!(
            score = ?score.map(|s| s.value),
            fee_rate = %terms.fee_rate,
            eligibility = %terms.eligibility,
            policy_version = self.policy.version,
            "Risk terms resolved"
        );
        Assessment {
            fee_rate: terms.fee_rate,
            eligibility: terms.eligibility,
            eligible_amount: terms.eligibility.of(amount).normalize(),
            policy_version: self.policy.version,
            score_ref: score.map(|s| s.id),
        }
    }

    /// The pending request to persist for an assessed application.
    pub fn draft(
        &self,
        sme_id: SmeId,
        invoice_id: InvoiceId,
        amount: Amount,
        assessment: &Assessment,
        now: DateTime<Utc>,
    ) -> NewFinanceRequest {
        NewFinanceRequest {
            sme_id,
            invoice_id,
            amount_requested: amount,
            fee_rate: assessment.fee_rate,
            policy_version: assessment.policy_version,
            credit_score_ref: assessment.score_ref,
            created_at: now,
        }
    }
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self::new(RiskPolicy::default())
    }
}
