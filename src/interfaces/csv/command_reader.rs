use crate::domain::ids::{InvoiceId, LenderId, RequestId, SmeId};
use crate::error::{FinanceError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum Op {
    Sme,
    Invoice,
    Lender,
    Score,
    Calculate,
    Apply,
    Approve,
    Reject,
    Paid,
    Settle,
}

/// One raw CSV row; which columns are required depends on `op`.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct CommandRecord {
    pub op: Op,
    pub sme: Option<SmeId>,
    pub invoice: Option<InvoiceId>,
    pub lender: Option<LenderId>,
    pub request: Option<RequestId>,
    pub amount: Option<Decimal>,
}

/// A validated batch command.
#[derive(Debug, PartialEq, Clone)]
pub enum Command {
    RegisterSme { sme: SmeId, revenue: Decimal },
    RegisterInvoice { invoice: InvoiceId, sme: SmeId, amount: Decimal },
    RegisterLender { lender: LenderId },
    RecordScore { sme: SmeId, value: Decimal },
    CalculateScore { sme: SmeId },
    Apply { sme: SmeId, invoice: InvoiceId, amount: Decimal },
    Approve { request: RequestId, lender: LenderId, amount: Decimal },
    Reject { request: RequestId, lender: LenderId },
    MarkPaid { request: RequestId },
    Settle { invoice: InvoiceId },
}

impl Op {
    pub fn as_str(&self) -> &'static str {
        match self {
            Op::Sme => "sme",
            Op::Invoice => "invoice",
            Op::Lender => "lender",
            Op::Score => "score",
            Op::Calculate => "calculate",
            Op::Apply => "apply",
            Op::Approve => "approve",
            Op::Reject => "reject",
            Op::Paid => "paid",
            Op::Settle => "settle",
        }
    }
}

fn required<T>(value: Option<T>, op: Op, column: &str) -> Result<T> {
    value.ok_or_else(|| {
        FinanceError::MalformedCommand(format!("{} requires the '{column}' column", op.as_str()))
    })
}

impl TryFrom<CommandRecord> for Command {
    type Error = FinanceError;

    fn try_from(record: CommandRecord) -> Result<Self> {
        let op = record.op;
        let command = match op {
            Op::Sme => Command::RegisterSme {
                sme: required(record.sme, op, "sme")?,
                revenue: record.amount.unwrap_or(Decimal::ZERO),
            },
            Op::Invoice => Command::RegisterInvoice {
                invoice: required(record.invoice, op, "invoice")?,
                sme: required(record.sme, op, "sme")?,
                amount: required(record.amount, op, "amount")?,
            },
            Op::Lender => Command::RegisterLender {
                lender: required(record.lender, op, "lender")?,
            },
            Op::Score => Command::RecordScore {
                sme: required(record.sme, op, "sme")?,
                value: required(record.amount, op, "amount")?,
            },
            Op::Calculate => Command::CalculateScore {
                sme: required(record.sme, op, "sme")?,
            },
            Op::Apply => Command::Apply {
                sme: required(record.sme, op, "sme")?,
                invoice: required(record.invoice, op, "invoice")?,
                amount: required(record.amount, op, "amount")?,
            },
            Op::Approve => Command::Approve {
                request: required(record.request, op, "request")?,
                lender: required(record.lender, op, "lender")?,
                amount: required(record.amount, op, "amount")?,
            },
            Op::Reject => Command::Reject {
                request: required(record.request, op, "request")?,
                lender: required(record.lender, op, "lender")?,
            },
            Op::Paid => Command::MarkPaid {
                request: required(record.request, op, "request")?,
            },
            Op::Settle => Command::Settle {
                invoice: required(record.invoice, op, "invoice")?,
            },
        };
        Ok(command)
    }
}

/// Reads batch commands from a CSV source.
///
/// Expects the header `op, sme, invoice, lender, request, amount`. Whitespace
/// is trimmed and short rows are accepted, missing trailing columns reading as empty.
pub struct CommandReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CommandReader<R> {
    /// Creates a new `CommandReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily reads, deserializes and validates commands.
    pub fn commands(self) -> impl Iterator<Item = Result<Command>> {
        self.reader.into_deserialize().map(|result| {
            let record: CommandRecord = result.map_err(FinanceError::from)?;
            Command::try_from(record)
        })
    }
}
