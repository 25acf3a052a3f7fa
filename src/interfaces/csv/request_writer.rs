use crate::domain::finance_request::{FinanceRequest, RequestStatus};
use crate::domain::ids::{InvoiceId, LenderId, RequestId, ScoreId, SmeId};
use crate::error::Result;
use chrono::SecondsFormat;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct RequestRow {
    id: RequestId,
    sme: SmeId,
    invoice: InvoiceId,
    status: RequestStatus,
    amount_requested: Decimal,
    fee_rate: Decimal,
    approved_amount: Option<Decimal>,
    lender: Option<LenderId>,
    credit_score_ref: Option<ScoreId>,
    decided_at: Option<String>,
}

impl From<&FinanceRequest> for RequestRow {
    fn from(request: &FinanceRequest) -> Self {
        Self {
            id: request.id,
            sme: request.sme_id,
            invoice: request.invoice_id,
            status: request.status(),
            amount_requested: request.amount_requested.value().normalize(),
            fee_rate: request.fee_rate.value().normalize(),
            approved_amount: request.approved_amount().map(|a| a.value().normalize()),
            lender: request.lender_id(),
            credit_score_ref: request.credit_score_ref,
            decided_at: request
                .approved_at()
                .map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true)),
        }
    }
}

/// Writes finance requests as CSV, one row per request with a header line.
pub struct RequestWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> RequestWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_requests(&mut self, requests: &[FinanceRequest]) -> Result<()> {
        if requests.is_empty() {
            self.writer.write_record([
                "id",
                "sme",
                "invoice",
                "status",
                "amount_requested",
                "fee_rate",
                "approved_amount",
                "lender",
                "credit_score_ref",
                "decided_at",
            ])?;
        }
        for request in requests {
            self.writer.serialize(RequestRow::from(request))?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
