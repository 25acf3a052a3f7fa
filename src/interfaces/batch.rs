use super::csv::command_reader::Command;
use crate::application::service::FinanceService;
use crate::domain::party::{Invoice, Lender, Sme};
use crate::error::Result;

/// Executes one batch command against the service.
pub async fn execute(service: &FinanceService, command: Command) -> Result<()> {
    match command {
        Command::RegisterSme { sme, revenue } => {
            service
                .register_sme(Sme::new(sme, format!("SME {sme}"), "unspecified", revenue))
                .await
        }
        Command::RegisterInvoice {
            invoice,
            sme,
            amount,
        } => {
            service
                .register_invoice(Invoice::new(invoice, sme, "unspecified", amount))
                .await
        }
        Command::RegisterLender { lender } => {
            service
                .register_lender(Lender::new(lender, format!("Lender {lender}")))
                .await
        }
        Command::RecordScore { sme, value } => service.record_score(sme, value).await.map(drop),
        Command::CalculateScore { sme } => service.calculate_credit_score(sme).await.map(drop),
        Command::Apply {
            sme,
            invoice,
            amount,
        } => service.apply(sme, invoice, amount).await.map(drop),
        Command::Approve {
            request,
            lender,
            amount,
        } => service.approve(request, lender, amount).await.map(drop),
        Command::Reject { request, lender } => service.reject(request, lender).await.map(drop),
        Command::MarkPaid { request } => service.mark_paid(request).await.map(drop),
        Command::Settle { invoice } => service.settle_invoice(invoice).await.map(drop),
    }
}
