use super::finance_request::{FinanceRequest, NewFinanceRequest, RequestStatus};
use super::ids::{InvoiceId, LenderId, RequestId, SmeId};
use super::party::{CreditScore, Invoice, InvoicePatch, Lender, Sme};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Durable store of finance requests.
#[async_trait]
pub trait FinanceRequestStore: Send + Sync {
    /// Persists a new pending request under the next id.
    async fn insert(&self, request: NewFinanceRequest) -> Result<FinanceRequest>;

    async fn get(&self, id: RequestId) -> Result<Option<FinanceRequest>>;

    /// Overwrites the stored request only if its current status is `expected`.
    ///
    /// The read-compare-write is atomic with respect to every other call on the
    /// same store. Fails with `ConcurrencyConflict` when the status differs and
    /// `RequestNotFound` when there is nothing to replace.
    async fn replace(&self, request: FinanceRequest, expected: RequestStatus) -> Result<()>;

    /// Every request in id (insertion) order.
    async fn get_all(&self) -> Result<Vec<FinanceRequest>>;

    async fn list_by_sme(&self, sme: SmeId) -> Result<Vec<FinanceRequest>> {
        Ok(self
            .get_all()
            .await?
            .into_iter()
            .filter(|r| r.sme_id == sme)
            .collect())
    }

    async fn list_by_status(&self, status: RequestStatus) -> Result<Vec<FinanceRequest>> {
        Ok(self
            .get_all()
            .await?
            .into_iter()
            .filter(|r| r.status() == status)
            .collect())
    }

    async fn list_by_invoice(&self, invoice: InvoiceId) -> Result<Vec<FinanceRequest>> {
        Ok(self
            .get_all()
            .await?
            .into_iter()
            .filter(|r| r.invoice_id == invoice)
            .collect())
    }
}

/// SME and invoice records.
#[async_trait]
pub trait SmeDirectory: Send + Sync {
    async fn store_sme(&self, sme: Sme) -> Result<()>;
    async fn find_sme(&self, id: SmeId) -> Result<Option<Sme>>;
    /// All SMEs ordered by id.
    async fn all_smes(&self) -> Result<Vec<Sme>>;

    async fn store_invoice(&self, invoice: Invoice) -> Result<()>;
    async fn find_invoice(&self, id: InvoiceId) -> Result<Option<Invoice>>;
    async fn invoices_for(&self, sme: SmeId) -> Result<Vec<Invoice>>;
    /// Applies a whitelisted patch, failing with `InvoiceNotFound` if absent.
    async fn update_invoice(&self, id: InvoiceId, patch: InvoicePatch) -> Result<Invoice>;
}

/// Credit score snapshots per SME.
#[async_trait]
pub trait CreditScoreStore: Send + Sync {
    async fn record(&self, sme: SmeId, value: Decimal, at: DateTime<Utc>) -> Result<CreditScore>;
    /// Most recent snapshot by `created_at`, ties going to the latest recorded.
    async fn latest(&self, sme: SmeId) -> Result<Option<CreditScore>>;
    async fn history(&self, sme: SmeId) -> Result<Vec<CreditScore>>;
}

#[async_trait]
pub trait LenderStore: Send + Sync {
    async fn store_lender(&self, lender: Lender) -> Result<()>;
    async fn find_lender(&self, id: LenderId) -> Result<Option<Lender>>;
}

pub type FinanceRequestStoreBox = Box<dyn FinanceRequestStore>;
pub type SmeDirectoryBox = Box<dyn SmeDirectory>;
pub type CreditScoreStoreBox = Box<dyn CreditScoreStore>;
pub type LenderStoreBox = Box<dyn LenderStore>;
