use super::ids::{InvoiceId, LenderId, RequestId, ScoreId, SmeId};
use super::money::{Amount, Rate};
use crate::error::FinanceError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Paid,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Paid => "paid",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle position of a finance request, with the data each stage owns.
///
/// A pending request has no lender, amount or decision time. An approval always
/// carries all three, and payment keeps them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RequestState {
    Pending,
    Approved {
        lender: LenderId,
        amount: Amount,
        at: DateTime<Utc>,
    },
    Rejected {
        lender: LenderId,
        at: DateTime<Utc>,
    },
    Paid {
        lender: LenderId,
        amount: Amount,
        approved_at: DateTime<Utc>,
    },
}

impl RequestState {
    pub fn status(&self) -> RequestStatus {
        match self {
            RequestState::Pending => RequestStatus::Pending,
            RequestState::Approved { .. } => RequestStatus::Approved,
            RequestState::Rejected { .. } => RequestStatus::Rejected,
            RequestState::Paid { .. } => RequestStatus::Paid,
        }
    }
}

/// Everything needed to persist a new request; the store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFinanceRequest {
    pub sme_id: SmeId,
    pub invoice_id: InvoiceId,
    pub amount_requested: Amount,
    pub fee_rate: Rate,
    pub policy_version: u32,
    pub credit_score_ref: Option<ScoreId>,
    pub created_at: DateTime<Utc>,
}

impl NewFinanceRequest {
    pub fn with_id(self, id: RequestId) -> FinanceRequest {
        FinanceRequest {
            id,
            sme_id: self.sme_id,
            invoice_id: self.invoice_id,
            amount_requested: self.amount_requested,
            fee_rate: self.fee_rate,
            policy_version: self.policy_version,
            credit_score_ref: self.credit_score_ref,
            created_at: self.created_at,
            state: RequestState::Pending,
        }
    }
}

/// A request by an SME to finance one of its invoices.
///
/// Identity, ownership, the requested amount and the fee rate are fixed at
/// creation. Only `state` moves, and only through the transition methods below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinanceRequest {
    pub id: RequestId,
    pub sme_id: SmeId,
    pub invoice_id: InvoiceId,
    pub amount_requested: Amount,
    pub fee_rate: Rate,
    /// Version of the risk policy that produced `fee_rate`.
    pub policy_version: u32,
    pub credit_score_ref: Option<ScoreId>,
    pub created_at: DateTime<Utc>,
    state: RequestState,
}

impl FinanceRequest {
    pub fn status(&self) -> RequestStatus {
        self.state.status()
    }

    pub fn approved_amount(&self) -> Option<Amount> {
        match self.state {
            RequestState::Approved { amount, .. } | RequestState::Paid { amount, .. } => {
                Some(amount)
            }
            RequestState::Pending | RequestState::Rejected { .. } => None,
        }
    }

    pub fn lender_id(&self) -> Option<LenderId> {
        match self.state {
            RequestState::Pending => None,
            RequestState::Approved { lender, .. }
            | RequestState::Rejected { lender, .. }
            | RequestState::Paid { lender, .. } => Some(lender),
        }
    }

    /// Time of the approve/reject decision.
    pub fn approved_at(&self) -> Option<DateTime<Utc>> {
        match self.state {
            RequestState::Pending => None,
            RequestState::Approved { at, .. } | RequestState::Rejected { at, .. } => Some(at),
            RequestState::Paid { approved_at, .. } => Some(approved_at),
        }
    }

    fn ensure_status(&self, expected: RequestStatus, action: &'static str) -> Result<(), FinanceError> {
        if self.status() == expected {
            Ok(())
        } else {
            Err(FinanceError::InvalidTransition {
                action,
                status: self.status(),
            })
        }
    }

    /// Checks that `amount` could be approved for this request.
    pub fn validate_approval(&self, amount: Decimal) -> Result<Amount, FinanceError> {
        let amount = Amount::new(amount)?;
        if amount > self.amount_requested {
            return Err(FinanceError::AmountExceedsRequest {
                approved: amount.value(),
                requested: self.amount_requested.value(),
            });
        }
        Ok(amount)
    }

    /// Pending -> Approved.
    ///
    /// Guards run in order: status, amount, lender. Nothing changes on failure.
    /// `lender_known` is whether the lender store resolved `lender`.
    pub fn approve(
        &mut self,
        lender: LenderId,
        lender_known: bool,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> Result<(), FinanceError> {
        self.ensure_status(RequestStatus::Pending, "approve")?;
        let amount = self.validate_approval(amount)?;
        if !lender_known {
            return Err(FinanceError::LenderNotFound(lender));
        }
        self.state = RequestState::Approved {
            lender,
            amount,
            at: now,
        };
        Ok(())
    }

    /// Pending -> Rejected. The decision time is recorded, no amount is.
    pub fn reject(
        &mut self,
        lender: LenderId,
        lender_known: bool,
        now: DateTime<Utc>,
    ) -> Result<(), FinanceError> {
        self.ensure_status(RequestStatus::Pending, "reject")?;
        if !lender_known {
            return Err(FinanceError::LenderNotFound(lender));
        }
        self.state = RequestState::Rejected { lender, at: now };
        Ok(())
    }

    /// Approved -> Paid, keeping the lender, amount and decision time.
    pub fn mark_paid(&mut self) -> Result<(), FinanceError> {
        match self.state {
            RequestState::Approved { lender, amount, at } => {
                self.state = RequestState::Paid {
                    lender,
                    amount,
                    approved_at: at,
                };
                Ok(())
            }
            _ => Err(FinanceError::InvalidTransition {
                action: "mark paid",
                status: self.status(),
            }),
        }
    }
}
