#![allow(dead_code)]

use invoice_finance::application::decision::DecisionEngine;
use invoice_finance::application::service::{FinanceService, Stores};
use invoice_finance::domain::ids::{InvoiceId, LenderId, SmeId};
use invoice_finance::domain::party::{Invoice, Lender, Sme};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use std::fs::File;
use std::io::Error;
use std::path::Path;

pub const SME: SmeId = SmeId(1);
pub const INVOICE: InvoiceId = InvoiceId(10);
pub const LENDER: LenderId = LenderId(7);

pub const HEADER: [&str; 6] = ["op", "sme", "invoice", "lender", "request", "amount"];

/// A service holding SME 1, its unpaid invoice 10 for `invoice_amount`, and lender 7.
pub async fn seeded_service(invoice_amount: Decimal) -> FinanceService {
    let service = FinanceService::new(Stores::in_memory(), DecisionEngine::default());
    service
        .register_sme(Sme::new(SME, "Acme Textiles", "manufacturing", Decimal::from(250_000)))
        .await
        .unwrap();
    service
        .register_invoice(Invoice::new(INVOICE, SME, "Globex", invoice_amount))
        .await
        .unwrap();
    service
        .register_lender(Lender::new(LENDER, "Northwind Capital"))
        .await
        .unwrap();
    service
}

/// Writes a commands CSV with one lender and, per SME, a registration, an
/// invoice, a random score, an application and a random decision on it.
///
/// Request ids follow SME ids, so SME `n` owns request `n`.
pub fn generate_commands_csv(path: &Path, smes: u32, seed: u64) -> Result<(), Error> {
    let mut rng = StdRng::seed_from_u64(seed);
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);

    wtr.write_record(HEADER)?;
    wtr.write_record(["lender", "", "", "1", "", ""])?;

    for sme in 1..=smes {
        let id = sme.to_string();
        let revenue: u32 = rng.gen_range(10_000..2_000_000);
        let amount: u32 = rng.gen_range(1_000..50_000);
        let score: u32 = rng.gen_range(0..=100);

        wtr.write_record(["sme", &id, "", "", "", &revenue.to_string()])?;
        wtr.write_record(["invoice", &id, &id, "", "", &amount.to_string()])?;
        wtr.write_record(["score", &id, "", "", "", &score.to_string()])?;
        wtr.write_record(["apply", &id, &id, "", "", &amount.to_string()])?;
        if rng.gen_bool(0.5) {
            let approved = (amount / 2).max(1);
            wtr.write_record(["approve", "", "", "1", &id, &approved.to_string()])?;
        } else {
            wtr.write_record(["reject", "", "", "1", &id, ""])?;
        }
    }

    wtr.flush()?;
    Ok(())
}

/// Writes `rows` under the commands header into a temporary CSV file.
pub fn commands_file(rows: &[[&str; 6]]) -> tempfile::NamedTempFile {
    let file = tempfile::NamedTempFile::new().unwrap();
    let mut wtr = csv::Writer::from_path(file.path()).unwrap();
    wtr.write_record(HEADER).unwrap();
    for row in rows {
        wtr.write_record(row).unwrap();
    }
    wtr.flush().unwrap();
    file
}
