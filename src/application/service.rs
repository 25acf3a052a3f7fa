use super::decision::DecisionEngine;
use crate::config::Config;
use crate::domain::finance_request::{FinanceRequest, RequestStatus};
use crate::domain::ids::{InvoiceId, LenderId, RequestId, SmeId};
use crate::domain::money::Amount;
use crate::domain::party::{CreditScore, Invoice, InvoicePatch, InvoiceStatus, Lender, Sme};
use crate::domain::ports::{
    CreditScoreStoreBox, FinanceRequestStoreBox, LenderStoreBox, SmeDirectoryBox,
};
use crate::domain::scoring::rule_based_score;
use crate::error::{FinanceError, Result};
use crate::infrastructure::in_memory::{
    InMemoryCreditScoreStore, InMemoryFinanceRequestStore, InMemoryLenderStore,
    InMemorySmeDirectory,
};
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tokio::sync::RwLock;

/// The storage backends the service depends on.
pub struct Stores {
    pub requests: FinanceRequestStoreBox,
    pub directory: SmeDirectoryBox,
    pub scores: CreditScoreStoreBox,
    pub lenders: LenderStoreBox,
}

impl Stores {
    /// Every port backed by its in-memory adapter.
    pub fn in_memory() -> Self {
        Self {
            requests: Box::new(InMemoryFinanceRequestStore::new()),
            directory: Box::new(InMemorySmeDirectory::new()),
            scores: Box::new(InMemoryCreditScoreStore::new()),
            lenders: Box::new(InMemoryLenderStore::new()),
        }
    }
}

/// Result of a successful application.
#[derive(Debug, Clone, PartialEq)]
pub struct Application {
    pub request: FinanceRequest,
    /// Advisory financing ceiling for the invoice amount.
    pub eligible_amount: Decimal,
}

/// Result of settling an invoice.
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    pub invoice: Invoice,
    /// Requests moved from approved to paid by this settlement.
    pub paid_requests: Vec<RequestId>,
}

/// What a lender sees when browsing SMEs.
#[derive(Debug, Clone, PartialEq)]
pub struct SmeSummary {
    pub sme_id: SmeId,
    pub name: String,
    pub industry: String,
    pub revenue: Decimal,
    pub latest_score: Option<Decimal>,
    pub pending_requests: usize,
}

/// Service-layer entry point for SMEs, lenders and the settlement trigger.
///
/// Every state change is a read, a guard check on the domain entity, and a
/// compare-and-swap against the request store conditioned on the status that
/// was read. Losing the swap re-reads and re-checks, so two concurrent
/// decisions on one request can never both succeed.
///
/// `apply` and `approve` hold `settlement` shared from their invoice check to
/// their write; `settle_invoice` holds it exclusively. A request is therefore
/// never created or approved against an invoice that a settlement has paid.
pub struct FinanceService {
    stores: Stores,
    engine: DecisionEngine,
    settlement: RwLock<()>,
    store_timeout: Duration,
    max_conflict_retries: u32,
}

impl FinanceService {
    /// Creates a new `FinanceService` with default timeout and retry settings.
    pub fn new(stores: Stores, engine: DecisionEngine) -> Self {
        let defaults = Config::default();
        Self {
            stores,
            engine,
            settlement: RwLock::new(()),
            store_timeout: defaults.store_timeout,
            max_conflict_retries: defaults.max_conflict_retries,
        }
    }

    pub fn with_config(mut self, config: &Config) -> Self {
        self.store_timeout = config.store_timeout;
        self.max_conflict_retries = config.max_conflict_retries;
        self
    }

    /// Runs one store call under the configured timeout.
    async fn bounded<T, F>(&self, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::time::timeout(self.store_timeout, call)
            .await
            .map_err(|_| FinanceError::StoreTimeout(self.store_timeout.as_millis()))?
    }

    // ---- reference data -------------------------------------------------

    pub async fn register_sme(&self, sme: Sme) -> Result<()> {
        self.bounded(self.stores.directory.store_sme(sme)).await
    }

    pub async fn register_invoice(&self, invoice: Invoice) -> Result<()> {
        if self
            .bounded(self.stores.directory.find_sme(invoice.sme_id))
            .await?
            .is_none()
        {
            return Err(FinanceError::SmeNotFound(invoice.sme_id));
        }
        self.bounded(self.stores.directory.store_invoice(invoice))
            .await
    }

    pub async fn update_invoice(&self, id: InvoiceId, patch: InvoicePatch) -> Result<Invoice> {
        self.bounded(self.stores.directory.update_invoice(id, patch))
            .await
    }

    pub async fn register_lender(&self, lender: Lender) -> Result<()> {
        self.bounded(self.stores.lenders.store_lender(lender)).await
    }

    async fn require_sme(&self, id: SmeId) -> Result<Sme> {
        self.bounded(self.stores.directory.find_sme(id))
            .await?
            .ok_or(FinanceError::SmeNotFound(id))
    }

    // ---- credit scores --------------------------------------------------

    /// Records an externally computed score snapshot on the 0-100 scale.
    pub async fn record_score(&self, sme_id: SmeId, value: Decimal) -> Result<CreditScore> {
        if !(Decimal::ZERO..=Decimal::ONE_HUNDRED).contains(&value) {
            return Err(FinanceError::ValidationError(format!(
                "credit score must be within [0, 100], got {value}"
            )));
        }
        self.require_sme(sme_id).await?;
        self.bounded(self.stores.scores.record(sme_id, value, Utc::now()))
            .await
    }

    /// Computes a rule-based score from the SME profile and unpaid invoices, and records it.
    pub async fn calculate_credit_score(&self, sme_id: SmeId) -> Result<CreditScore> {
        let sme = self.require_sme(sme_id).await?;
        let unpaid = self
            .bounded(self.stores.directory.invoices_for(sme_id))
            .await?
            .iter()
            .filter(|i| !i.status.is_settled())
            .count();
        let value = rule_based_score(&sme, unpaid);
        let score = self
            .bounded(self.stores.scores.record(sme_id, value, Utc::now()))
            .await?;
        tracing::info!(sme = %sme_id, score = %score.value, unpaid, "Credit score calculated");
        Ok(score)
    }

    pub async fn score_history(&self, sme_id: SmeId) -> Result<Vec<CreditScore>> {
        self.bounded(self.stores.scores.history(sme_id)).await
    }

    // ---- finance requests -----------------------------------------------

    /// Creates a pending finance request priced from the SME's latest score.
    ///
    /// Fails without persisting anything if the SME or invoice is missing, the
    /// invoice belongs to another SME, or it is already paid.
    pub async fn apply(
        &self,
        sme_id: SmeId,
        invoice_id: InvoiceId,
        amount: Decimal,
    ) -> Result<Application> {
        let amount = Amount::new(amount)?;
        let _settlement = self.settlement.read().await;
        self.require_sme(sme_id).await?;
        let score = self.bounded(self.stores.scores.latest(sme_id)).await?;

        let invoice = self
            .bounded(self.stores.directory.find_invoice(invoice_id))
            .await?
            .ok_or(FinanceError::InvoiceNotFound(invoice_id))?;
        if invoice.sme_id != sme_id {
            return Err(FinanceError::InvalidInvoice {
                invoice: invoice_id,
                reason: format!("it does not belong to SME {sme_id}"),
            });
        }
        if invoice.status.is_settled() {
            return Err(FinanceError::InvalidInvoice {
                invoice: invoice_id,
                reason: "it is already paid".to_string(),
            });
        }

        let assessment = self.engine.assess(amount, score.as_ref());
        let draft = self
            .engine
            .draft(sme_id, invoice_id, amount, &assessment, Utc::now());
        let request = self.bounded(self.stores.requests.insert(draft)).await?;

        tracing::info!(
            request = %request.id,
            sme = %sme_id,
            invoice = %invoice_id,
            amount = %amount,
            fee_rate = %request.fee_rate,
            eligible_amount = %assessment.eligible_amount,
            "Finance request created"
        );

        Ok(Application {
            request,
            eligible_amount: assessment.eligible_amount,
        })
    }

    pub async fn get_request(&self, id: RequestId) -> Result<FinanceRequest> {
        self.bounded(self.stores.requests.get(id))
            .await?
            .ok_or(FinanceError::RequestNotFound(id))
    }

    /// All requests of an SME, every status, in insertion order.
    pub async fn list_by_sme(&self, sme_id: SmeId) -> Result<Vec<FinanceRequest>> {
        self.bounded(self.stores.requests.list_by_sme(sme_id)).await
    }

    /// Pending requests, optionally restricted to those assigned to `lender`.
    ///
    /// A lender is only assigned when a request is decided, so filtering by
    /// lender always yields an empty list.
    pub async fn list_pending(&self, lender: Option<LenderId>) -> Result<Vec<FinanceRequest>> {
        let pending = self
            .bounded(self.stores.requests.list_by_status(RequestStatus::Pending))
            .await?;
        Ok(match lender {
            Some(lender) => pending
                .into_iter()
                .filter(|r| r.lender_id() == Some(lender))
                .collect(),
            None => pending,
        })
    }

    /// Every request in id order.
    pub async fn all_requests(&self) -> Result<Vec<FinanceRequest>> {
        self.bounded(self.stores.requests.get_all()).await
    }

    /// Pending -> approved. After the request's own guards, fails with
    /// `InvalidInvoice` if the financed invoice has been settled.
    pub async fn approve(
        &self,
        request_id: RequestId,
        lender_id: LenderId,
        approved_amount: Decimal,
    ) -> Result<FinanceRequest> {
        let _settlement = self.settlement.read().await;
        let invoice_id = self.get_request(request_id).await?.invoice_id;
        let invoice_settled = self
            .bounded(self.stores.directory.find_invoice(invoice_id))
            .await?
            .is_some_and(|invoice| invoice.status.is_settled());
        let lender_known = self
            .bounded(self.stores.lenders.find_lender(lender_id))
            .await?
            .is_some();
        let now = Utc::now();
        let request = self
            .transition(request_id, |req| {
                req.approve(lender_id, lender_known, approved_amount, now)?;
                if invoice_settled {
                    return Err(FinanceError::InvalidInvoice {
                        invoice: invoice_id,
                        reason: "it is already paid".to_string(),
                    });
                }
                Ok(())
            })
            .await?;
        tracing::info!(
            request = %request_id,
            lender = %lender_id,
            amount = %approved_amount,
            "Finance request approved"
        );
        Ok(request)
    }

    pub async fn reject(&self, request_id: RequestId, lender_id: LenderId) -> Result<FinanceRequest> {
        let lender_known = self
            .bounded(self.stores.lenders.find_lender(lender_id))
            .await?
            .is_some();
        let now = Utc::now();
        let request = self
            .transition(request_id, |req| req.reject(lender_id, lender_known, now))
            .await?;
        tracing::info!(request = %request_id, lender = %lender_id, "Finance request rejected");
        Ok(request)
    }

    pub async fn mark_paid(&self, request_id: RequestId) -> Result<FinanceRequest> {
        let request = self
            .transition(request_id, FinanceRequest::mark_paid)
            .await?;
        tracing::info!(request = %request_id, "Finance request paid");
        Ok(request)
    }

    /// Marks an invoice paid and moves every approved request financing it to paid.
    ///
    /// Waits for in-flight applications and approvals on any invoice, and
    /// blocks new ones until it is done.
    pub async fn settle_invoice(&self, invoice_id: InvoiceId) -> Result<Settlement> {
        let _settlement = self.settlement.write().await;
        self.bounded(self.stores.directory.find_invoice(invoice_id))
            .await?
            .ok_or(FinanceError::InvoiceNotFound(invoice_id))?;

        let invoice = self
            .update_invoice(
                invoice_id,
                InvoicePatch {
                    status: Some(InvoiceStatus::Paid),
                    ..Default::default()
                },
            )
            .await?;

        let financed = self
            .bounded(self.stores.requests.list_by_invoice(invoice_id))
            .await?;
        let mut paid_requests = Vec::new();
        for request in financed {
            if request.status() != RequestStatus::Approved {
                continue;
            }
            match self.mark_paid(request.id).await {
                Ok(_) => paid_requests.push(request.id),
                // Decided differently since it was listed.
                Err(FinanceError::InvalidTransition { status, .. }) => {
                    tracing::warn!(request = %request.id, %status, "Skipping request during settlement");
                }
                Err(e) => return Err(e),
            }
        }
        tracing::info!(invoice = %invoice_id, paid = paid_requests.len(), "Invoice settled");

        Ok(Settlement {
            invoice,
            paid_requests,
        })
    }

    /// One summary per SME with its latest score and number of pending requests.
    pub async fn available_smes(&self) -> Result<Vec<SmeSummary>> {
        let smes = self.bounded(self.stores.directory.all_smes()).await?;
        let mut pending: HashMap<SmeId, usize> = HashMap::new();
        for request in self.list_pending(None).await? {
            *pending.entry(request.sme_id).or_default() += 1;
        }

        let mut summaries = Vec::with_capacity(smes.len());
        for sme in smes {
            let latest_score = self
                .bounded(self.stores.scores.latest(sme.id))
                .await?
                .map(|s| s.value);
            summaries.push(SmeSummary {
                sme_id: sme.id,
                pending_requests: pending.get(&sme.id).copied().unwrap_or(0),
                name: sme.name,
                industry: sme.industry,
                revenue: sme.revenue,
                latest_score,
            });
        }
        Ok(summaries)
    }

    /// Read, guard, compare-and-swap; re-read and re-guard after a lost race.
    async fn transition<F>(&self, id: RequestId, mut apply: F) -> Result<FinanceRequest>
    where
        F: FnMut(&mut FinanceRequest) -> Result<()>,
    {
        let mut attempt = 0;
        loop {
            let mut request = self.get_request(id).await?;
            let expected = request.status();
            apply(&mut request)?;

            match self
                .bounded(self.stores.requests.replace(request.clone(), expected))
                .await
            {
                Ok(()) => return Ok(request),
                Err(FinanceError::ConcurrencyConflict(_)) if attempt < self.max_conflict_retries => {
                    attempt += 1;
                    tracing::warn!(request = %id, attempt, "Concurrent update detected, retrying");
                }
                Err(FinanceError::ConcurrencyConflict(_)) => {
                    return Err(FinanceError::StoreContention(id));
                }
                Err(e) => return Err(e),
            }
        }
    }
}
