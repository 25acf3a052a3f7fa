use super::party::Sme;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const BASE_SCORE: Decimal = dec!(50);
const REVENUE_UNIT: Decimal = dec!(100000);
const MAX_REVENUE_BOOST: Decimal = dec!(30);
const MAX_STABILITY_BOOST: Decimal = dec!(10);
const UNPAID_INVOICE_PENALTY: Decimal = dec!(2);
const MAX_SCORE: Decimal = dec!(100);

/// Deterministic rule-based credit score on a 0-100 scale.
///
/// Revenue adds one point per 100k (capped at 30), each year in business adds
/// two points (capped at 10) and every unpaid invoice costs two points.
pub fn rule_based_score(sme: &Sme, unpaid_invoices: usize) -> Decimal {
    let revenue_boost = (sme.revenue / REVENUE_UNIT).min(MAX_REVENUE_BOOST);
    let stability_boost = (Decimal::from(sme.years_active) * dec!(2)).min(MAX_STABILITY_BOOST);
    let penalty = Decimal::from(unpaid_invoices) * UNPAID_INVOICE_PENALTY;

    (BASE_SCORE + revenue_boost + stability_boost - penalty)
        .clamp(Decimal::ZERO, MAX_SCORE)
        .normalize()
}
