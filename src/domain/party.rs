use super::ids::{InvoiceId, LenderId, ScoreId, SmeId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A small/medium enterprise that borrows against its invoices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sme {
    pub id: SmeId,
    pub name: String,
    pub industry: String,
    pub revenue: Decimal,
    pub years_active: u32,
}

impl Sme {
    pub fn new(id: SmeId, name: impl Into<String>, industry: impl Into<String>, revenue: Decimal) -> Self {
        Self {
            id,
            name: name.into(),
            industry: industry.into(),
            revenue,
            years_active: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    #[default]
    Pending,
    Paid,
    Overdue,
}

impl InvoiceStatus {
    /// A settled invoice cannot back new financing.
    pub fn is_settled(&self) -> bool {
        matches!(self, InvoiceStatus::Paid)
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Overdue => "overdue",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub sme_id: SmeId,
    pub client_name: String,
    pub amount: Decimal,
    pub status: InvoiceStatus,
}

impl Invoice {
    pub fn new(id: InvoiceId, sme_id: SmeId, client_name: impl Into<String>, amount: Decimal) -> Self {
        Self {
            id,
            sme_id,
            client_name: client_name.into(),
            amount,
            status: InvoiceStatus::Pending,
        }
    }

    /// Applies the whitelisted fields of a patch. Ownership and identity never change.
    pub fn apply(&mut self, patch: InvoicePatch) {
        if let Some(client_name) = patch.client_name {
            self.client_name = client_name;
        }
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
    }
}

/// The invoice fields an update is allowed to touch.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct InvoicePatch {
    pub client_name: Option<String>,
    pub amount: Option<Decimal>,
    pub status: Option<InvoiceStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lender {
    pub id: LenderId,
    pub organization_name: String,
    pub max_lending_amount: Decimal,
    pub min_credit_score: u32,
}

impl Lender {
    pub fn new(id: LenderId, organization_name: impl Into<String>) -> Self {
        Self {
            id,
            organization_name: organization_name.into(),
            max_lending_amount: Decimal::from(1_000_000),
            min_credit_score: 40,
        }
    }
}

/// A credit score recorded for an SME at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditScore {
    pub id: ScoreId,
    pub sme_id: SmeId,
    pub value: Decimal,
    pub created_at: DateTime<Utc>,
}
