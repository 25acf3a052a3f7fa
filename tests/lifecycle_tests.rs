mod common;

use common::{INVOICE, LENDER, SME, seeded_service};
use invoice_finance::domain::finance_request::RequestStatus;
use invoice_finance::domain::ids::{InvoiceId, LenderId, RequestId, SmeId};
use invoice_finance::domain::party::{Invoice, InvoicePatch, InvoiceStatus, Sme};
use invoice_finance::error::FinanceError;
use rust_decimal_macros::dec;

#[tokio::test]
async fn test_unknown_score_gets_default_terms() {
    let service = seeded_service(dec!(12000)).await;

    let application = service.apply(SME, INVOICE, dec!(10000)).await.unwrap();

    let request = application.request;
    assert_eq!(request.status(), RequestStatus::Pending);
    assert_eq!(request.fee_rate.value(), dec!(0.08));
    assert_eq!(request.credit_score_ref, None);
    assert_eq!(request.policy_version, 1);
    assert_eq!(application.eligible_amount, dec!(6000));
}

#[tokio::test]
async fn test_full_lifecycle() {
    let service = seeded_service(dec!(12000)).await;
    let score = service.record_score(SME, dec!(75)).await.unwrap();

    let application = service.apply(SME, INVOICE, dec!(10000)).await.unwrap();
    let id = application.request.id;
    assert_eq!(application.request.fee_rate.value(), dec!(0.03));
    assert_eq!(application.request.credit_score_ref, Some(score.id));
    assert_eq!(application.eligible_amount, dec!(8000));

    let approved = service.approve(id, LENDER, dec!(8000)).await.unwrap();
    assert_eq!(approved.status(), RequestStatus::Approved);
    assert_eq!(approved.approved_amount().unwrap().value(), dec!(8000));
    assert_eq!(approved.lender_id(), Some(LENDER));
    assert!(approved.approved_at().is_some());

    let err = service.approve(id, LENDER, dec!(8000)).await.unwrap_err();
    assert!(matches!(
        err,
        FinanceError::InvalidTransition {
            status: RequestStatus::Approved,
            ..
        }
    ));

    let paid = service.mark_paid(id).await.unwrap();
    assert_eq!(paid.status(), RequestStatus::Paid);
    assert_eq!(paid.approved_amount(), approved.approved_amount());
    assert_eq!(paid.approved_at(), approved.approved_at());

    let err = service.mark_paid(id).await.unwrap_err();
    assert!(matches!(
        err,
        FinanceError::InvalidTransition {
            status: RequestStatus::Paid,
            ..
        }
    ));
}

#[tokio::test]
async fn test_mark_paid_requires_approval() {
    let service = seeded_service(dec!(5000)).await;
    let id = service.apply(SME, INVOICE, dec!(5000)).await.unwrap().request.id;

    let err = service.mark_paid(id).await.unwrap_err();
    assert!(matches!(
        err,
        FinanceError::InvalidTransition {
            status: RequestStatus::Pending,
            ..
        }
    ));

    service.reject(id, LENDER).await.unwrap();
    let err = service.mark_paid(id).await.unwrap_err();
    assert!(matches!(
        err,
        FinanceError::InvalidTransition {
            status: RequestStatus::Rejected,
            ..
        }
    ));
}

#[tokio::test]
async fn test_rejected_request_is_terminal() {
    let service = seeded_service(dec!(5000)).await;
    let id = service.apply(SME, INVOICE, dec!(5000)).await.unwrap().request.id;

    let rejected = service.reject(id, LENDER).await.unwrap();
    assert_eq!(rejected.status(), RequestStatus::Rejected);
    assert_eq!(rejected.approved_amount(), None);
    assert_eq!(rejected.lender_id(), Some(LENDER));
    assert!(rejected.approved_at().is_some());

    let err = service.approve(id, LENDER, dec!(100)).await.unwrap_err();
    assert!(matches!(
        err,
        FinanceError::InvalidTransition {
            status: RequestStatus::Rejected,
            ..
        }
    ));
}

#[tokio::test]
async fn test_failed_approval_leaves_request_pending() {
    let service = seeded_service(dec!(10000)).await;
    let id = service.apply(SME, INVOICE, dec!(10000)).await.unwrap().request.id;

    let err = service.approve(id, LENDER, dec!(10000.01)).await.unwrap_err();
    assert!(matches!(err, FinanceError::AmountExceedsRequest { .. }));

    let err = service.approve(id, LENDER, dec!(0)).await.unwrap_err();
    assert!(matches!(err, FinanceError::InvalidAmount(_)));

    let err = service.approve(id, LenderId(99), dec!(500)).await.unwrap_err();
    assert!(matches!(err, FinanceError::LenderNotFound(LenderId(99))));

    let request = service.get_request(id).await.unwrap();
    assert_eq!(request.status(), RequestStatus::Pending);
    assert_eq!(request.approved_amount(), None);

    // The full requested amount is an acceptable approval.
    let approved = service.approve(id, LENDER, dec!(10000)).await.unwrap();
    assert_eq!(approved.approved_amount().unwrap().value(), dec!(10000));
}

#[tokio::test]
async fn test_status_guard_reported_before_amount() {
    let service = seeded_service(dec!(10000)).await;
    let id = service.apply(SME, INVOICE, dec!(10000)).await.unwrap().request.id;
    service.approve(id, LENDER, dec!(9000)).await.unwrap();

    let err = service.approve(id, LenderId(99), dec!(0)).await.unwrap_err();
    assert!(matches!(err, FinanceError::InvalidTransition { .. }));
}

#[tokio::test]
async fn test_failed_applications_persist_nothing() {
    let service = seeded_service(dec!(10000)).await;
    service
        .register_sme(Sme::new(SmeId(2), "Other", "retail", dec!(1000)))
        .await
        .unwrap();
    service
        .register_invoice(Invoice::new(InvoiceId(20), SmeId(2), "Initech", dec!(900)))
        .await
        .unwrap();

    let err = service.apply(SmeId(404), INVOICE, dec!(100)).await.unwrap_err();
    assert!(matches!(err, FinanceError::SmeNotFound(SmeId(404))));

    let err = service.apply(SME, InvoiceId(404), dec!(100)).await.unwrap_err();
    assert!(matches!(err, FinanceError::InvoiceNotFound(InvoiceId(404))));

    let err = service.apply(SME, InvoiceId(20), dec!(100)).await.unwrap_err();
    assert!(matches!(err, FinanceError::InvalidInvoice { .. }));

    let err = service.apply(SME, INVOICE, dec!(0)).await.unwrap_err();
    assert!(matches!(err, FinanceError::InvalidAmount(_)));

    let err = service.apply(SME, INVOICE, dec!(-10)).await.unwrap_err();
    assert!(matches!(err, FinanceError::InvalidAmount(_)));

    service
        .update_invoice(
            INVOICE,
            InvoicePatch {
                status: Some(InvoiceStatus::Paid),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let err = service.apply(SME, INVOICE, dec!(100)).await.unwrap_err();
    assert!(matches!(err, FinanceError::InvalidInvoice { .. }));

    assert!(service.all_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_overdue_invoice_can_be_financed() {
    let service = seeded_service(dec!(10000)).await;
    service
        .update_invoice(
            INVOICE,
            InvoicePatch {
                status: Some(InvoiceStatus::Overdue),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(service.apply(SME, INVOICE, dec!(100)).await.is_ok());
}

#[tokio::test]
async fn test_unknown_request() {
    let service = seeded_service(dec!(10000)).await;

    let err = service.approve(RequestId(9), LENDER, dec!(1)).await.unwrap_err();
    assert!(matches!(err, FinanceError::RequestNotFound(RequestId(9))));
    let err = service.get_request(RequestId(9)).await.unwrap_err();
    assert!(matches!(err, FinanceError::RequestNotFound(RequestId(9))));
}

#[tokio::test]
async fn test_listing_requests() {
    let service = seeded_service(dec!(10000)).await;
    let first = service.apply(SME, INVOICE, dec!(4000)).await.unwrap().request.id;
    let second = service.apply(SME, INVOICE, dec!(3000)).await.unwrap().request.id;
    service.approve(first, LENDER, dec!(4000)).await.unwrap();

    let ids: Vec<_> = service
        .list_by_sme(SME)
        .await
        .unwrap()
        .iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec![first, second]);

    let pending = service.list_pending(None).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, second);

    // Lenders are only attached on decision, so nothing pending is theirs yet.
    assert!(service.list_pending(Some(LENDER)).await.unwrap().is_empty());

    assert!(service.list_by_sme(SmeId(2)).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_settle_invoice_pays_approved_requests() {
    let service = seeded_service(dec!(10000)).await;
    let approved = service.apply(SME, INVOICE, dec!(6000)).await.unwrap().request.id;
    let pending = service.apply(SME, INVOICE, dec!(2000)).await.unwrap().request.id;
    service.approve(approved, LENDER, dec!(5000)).await.unwrap();

    let settlement = service.settle_invoice(INVOICE).await.unwrap();
    assert_eq!(settlement.paid_requests, vec![approved]);
    assert_eq!(settlement.invoice.status, InvoiceStatus::Paid);

    assert_eq!(
        service.get_request(approved).await.unwrap().status(),
        RequestStatus::Paid
    );
    assert_eq!(
        service.get_request(pending).await.unwrap().status(),
        RequestStatus::Pending
    );

    let err = service.apply(SME, INVOICE, dec!(100)).await.unwrap_err();
    assert!(matches!(err, FinanceError::InvalidInvoice { .. }));

    let err = service.settle_invoice(InvoiceId(404)).await.unwrap_err();
    assert!(matches!(err, FinanceError::InvoiceNotFound(InvoiceId(404))));
}

#[tokio::test]
async fn test_paid_invoice_blocks_approval() {
    let service = seeded_service(dec!(10000)).await;
    let id = service.apply(SME, INVOICE, dec!(4000)).await.unwrap().request.id;
    service.settle_invoice(INVOICE).await.unwrap();

    let err = service.approve(id, LENDER, dec!(3000)).await.unwrap_err();
    assert!(matches!(err, FinanceError::InvalidInvoice { invoice, .. } if invoice == INVOICE));
    assert_eq!(
        service.get_request(id).await.unwrap().status(),
        RequestStatus::Pending
    );

    // Request guards still come first.
    let err = service.approve(id, LENDER, dec!(5000)).await.unwrap_err();
    assert!(!matches!(err, FinanceError::InvalidInvoice { .. }));

    let rejected = service.reject(id, LENDER).await.unwrap();
    assert_eq!(rejected.status(), RequestStatus::Rejected);
}

#[tokio::test]
async fn test_calculated_score_prices_application() {
    let service = seeded_service(dec!(10000)).await;

    // 50 + 2.5 from revenue - 2 for the one unpaid invoice
    let score = service.calculate_credit_score(SME).await.unwrap();
    assert_eq!(score.value, dec!(50.5));

    let application = service.apply(SME, INVOICE, dec!(10000)).await.unwrap();
    assert_eq!(application.request.fee_rate.value(), dec!(0.05));
    assert_eq!(application.request.credit_score_ref, Some(score.id));

    let history = service.score_history(SME).await.unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn test_latest_score_wins() {
    let service = seeded_service(dec!(10000)).await;
    service.record_score(SME, dec!(30)).await.unwrap();
    let latest = service.record_score(SME, dec!(85)).await.unwrap();

    let application = service.apply(SME, INVOICE, dec!(10000)).await.unwrap();
    assert_eq!(application.request.fee_rate.value(), dec!(0.015));
    assert_eq!(application.request.credit_score_ref, Some(latest.id));
    assert_eq!(application.eligible_amount, dec!(9000));
}

#[tokio::test]
async fn test_score_validation() {
    let service = seeded_service(dec!(10000)).await;

    let err = service.record_score(SME, dec!(100.5)).await.unwrap_err();
    assert!(matches!(err, FinanceError::ValidationError(_)));
    let err = service.record_score(SME, dec!(-1)).await.unwrap_err();
    assert!(matches!(err, FinanceError::ValidationError(_)));
    let err = service.record_score(SmeId(404), dec!(50)).await.unwrap_err();
    assert!(matches!(err, FinanceError::SmeNotFound(SmeId(404))));

    assert!(service.score_history(SME).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_available_smes_for_lenders() {
    let service = seeded_service(dec!(10000)).await;
    service
        .register_sme(Sme::new(SmeId(2), "Quiet Co", "services", dec!(40000)))
        .await
        .unwrap();
    service.record_score(SME, dec!(64)).await.unwrap();
    service.apply(SME, INVOICE, dec!(1000)).await.unwrap();
    service.apply(SME, INVOICE, dec!(2000)).await.unwrap();

    let mut summaries = service.available_smes().await.unwrap();
    summaries.sort_by_key(|s| s.sme_id);

    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].latest_score, Some(dec!(64)));
    assert_eq!(summaries[0].pending_requests, 2);
    assert_eq!(summaries[1].name, "Quiet Co");
    assert_eq!(summaries[1].latest_score, None);
    assert_eq!(summaries[1].pending_requests, 0);
}
