//! Integration tests for jewellery-ledger-core

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use jewellery_ledger_core::{
    utils::{EnhancedCustomerValidator, EnhancedVoucherValidator, MemoryStorage},
    BillingLedger, BillingSettings, Customer, GstDefaults, InvoiceType, LabourChargePolicy,
    LedgerBalances, LedgerError, LineItemInput, MetalRates, MetalType, PaymentType,
    RawVoucherForm, TaxType, VoucherDraft,
};
use std::str::FromStr;

fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).unwrap()
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 4, d).unwrap()
}

fn rates() -> MetalRates {
    MetalRates::new(dec("6000"), dec("80"))
}

fn settings() -> BillingSettings {
    BillingSettings::new(
        LabourChargePolicy::Flat,
        GstDefaults::new(dec("3"), Some("33".to_string())),
    )
}

fn ledger() -> BillingLedger<MemoryStorage> {
    BillingLedger::new(MemoryStorage::new(), settings())
}

#[tokio::test]
async fn test_credit_bill_builds_on_cash_and_credit() {
    let mut ledger = ledger();
    let opening = LedgerBalances::from_split(Some(dec("500")), Some(dec("1000")), None, None);
    ledger
        .create_customer(Customer::with_opening_balances(
            "kavya".to_string(),
            "Kavya Jewellers".to_string(),
            opening,
        ))
        .await
        .unwrap();

    // 1500 of gold + 700 stone − 200 received = 2000 net
    let draft = VoucherDraft::credit_bill("kavya", day(1), MetalRates::new(dec("1500"), dec("80")))
        .item(LineItemInput::new(MetalType::Gold, dec("1"), dec("100")))
        .stone_amount(dec("700"))
        .cash_received(dec("200"));

    let voucher = ledger.record_voucher(draft).await.unwrap();

    assert_eq!(voucher.net_bill_value, dec("2000"));
    assert_eq!(voucher.balance_snapshot.old_balance.amount, dec("1500"));
    assert_eq!(voucher.balance_snapshot.current_balance.amount, dec("3500"));
    assert_eq!(voucher.balance_snapshot.current_balance.gold_fine_weight, dec("1"));

    let balances = ledger.get_balances("kavya").await.unwrap();
    assert_eq!(balances.cash, dec("500"));
    assert_eq!(balances.credit, dec("3000"));
    assert_eq!(balances.gold_fine, dec("1"));
}

#[tokio::test]
async fn test_cash_bill_totals_two_gold_items() {
    let mut ledger = ledger();
    ledger
        .create_customer(Customer::new("walkin".to_string(), "Walk-in".to_string()))
        .await
        .unwrap();

    let draft = VoucherDraft::cash_bill("walkin", day(2), rates())
        .item(LineItemInput::new(MetalType::Gold, dec("5"), dec("100")).labour_rate(dec("200")))
        .item(LineItemInput::new(MetalType::Gold, dec("3"), dec("100")).labour_rate(dec("200")));

    let voucher = ledger.record_voucher(draft).await.unwrap();

    assert_eq!(voucher.totals.amount_total, dec("48400"));
    assert_eq!(voucher.totals.fine_weight, dec("8"));
    assert_eq!(voucher.totals.labour_total, dec("400"));
    assert_eq!(voucher.bill_total, dec("48400"));
    assert_eq!(voucher.balance_snapshot.old_balance.amount, BigDecimal::from(0));
    assert_eq!(voucher.balance_snapshot.current_balance.amount, dec("48400"));
    // Cash bills leave metal balances alone
    assert_eq!(
        voucher.balance_snapshot.current_balance.gold_fine_weight,
        BigDecimal::from(0)
    );
}

#[tokio::test]
async fn test_money_to_gold_settlement_converts_at_rate() {
    let mut ledger = ledger();
    let opening = LedgerBalances::new(dec("1000"), dec("0"), dec("2.5"), dec("0"));
    ledger
        .create_customer(Customer::with_opening_balances(
            "ravi".to_string(),
            "Ravi".to_string(),
            opening,
        ))
        .await
        .unwrap();

    let draft =
        VoucherDraft::settlement("ravi", day(3), PaymentType::MoneyToGold, dec("6000"), rates());
    let voucher = ledger.record_voucher(draft).await.unwrap();

    assert_eq!(voucher.balance_effect.gold_fine, dec("-1"));
    assert_eq!(voucher.balance_snapshot.old_balance.gold_fine_weight, dec("2.5"));
    assert_eq!(voucher.balance_snapshot.current_balance.gold_fine_weight, dec("1.5"));
    assert_eq!(voucher.balance_snapshot.current_balance.amount, dec("1000"));

    let balances = ledger.get_balances("ravi").await.unwrap();
    assert_eq!(balances.cash, dec("1000"));
    assert_eq!(balances.gold_fine, dec("1.5"));
}

#[tokio::test]
async fn test_zero_rate_conversion_is_rejected() {
    let mut ledger = ledger();
    ledger
        .create_customer(Customer::new("ravi".to_string(), "Ravi".to_string()))
        .await
        .unwrap();

    let draft = VoucherDraft::settlement(
        "ravi",
        day(3),
        PaymentType::MoneyToSilver,
        dec("500"),
        MetalRates::new(dec("6000"), dec("0")),
    );
    let result = ledger.record_voucher(draft).await;

    assert!(matches!(result, Err(LedgerError::Snapshot(_))));
    assert!(ledger
        .get_customer_vouchers("ravi", None, None)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_unknown_customer_aborts() {
    let mut ledger = ledger();
    let draft = VoucherDraft::cash_bill("ghost", day(1), rates())
        .item(LineItemInput::new(MetalType::Gold, dec("1"), dec("91.6")));

    let result = ledger.record_voucher(draft).await;
    assert!(matches!(result, Err(LedgerError::CustomerNotFound(id)) if id == "ghost"));

    let balances = ledger.get_balances("ghost").await;
    assert!(matches!(balances, Err(LedgerError::CustomerNotFound(_))));
}

#[tokio::test]
async fn test_gst_invoice_inter_and_intra_state() {
    let mut ledger = ledger();
    ledger
        .create_customer(
            Customer::new("blr".to_string(), "Bengaluru Gold".to_string())
                .with_gstin("29abcde1234f1z5")
                .unwrap(),
        )
        .await
        .unwrap();
    ledger
        .create_customer(Customer::new("chn".to_string(), "Chennai Retail".to_string()))
        .await
        .unwrap();

    let item = || LineItemInput::new(MetalType::Gold, dec("1"), dec("100"));
    let gst_rates = MetalRates::new(dec("10000"), dec("80"));

    let inter = ledger
        .record_voucher(
            VoucherDraft::credit_bill("blr", day(5), gst_rates.clone())
                .item(item())
                .gst(),
        )
        .await
        .unwrap();
    let breakdown = inter.gst_details.clone().unwrap();
    assert_eq!(breakdown.tax_type, TaxType::Igst);
    assert_eq!(breakdown.igst, dec("300"));
    assert_eq!(inter.bill_total, dec("10300"));
    assert_eq!(inter.net_bill_value, dec("10300"));

    let intra = ledger
        .record_voucher(
            VoucherDraft::cash_bill("chn", day(5), gst_rates.clone())
                .item(item())
                .gst()
                .customer_state_code("33"),
        )
        .await
        .unwrap();
    let breakdown = intra.gst_details.clone().unwrap();
    assert_eq!(breakdown.tax_type, TaxType::CgstSgst);
    assert_eq!(breakdown.cgst, dec("150"));
    assert_eq!(breakdown.sgst, dec("150"));
    assert_eq!(breakdown.total, dec("10300"));

    // No state code on the customer or the voucher
    let missing = ledger
        .record_voucher(
            VoucherDraft::cash_bill("chn", day(6), gst_rates)
                .item(item())
                .gst(),
        )
        .await;
    assert!(matches!(missing, Err(LedgerError::InvalidVoucher(_))));
}

#[tokio::test]
async fn test_preview_does_not_persist() {
    let mut ledger = ledger();
    ledger
        .create_customer(Customer::new("c1".to_string(), "Meena".to_string()))
        .await
        .unwrap();

    let draft = VoucherDraft::credit_bill("c1", day(1), rates())
        .item(LineItemInput::new(MetalType::Gold, dec("2"), dec("100")));
    let preview = ledger.preview_voucher(draft.clone()).await.unwrap();

    assert_eq!(preview.balance_snapshot.current_balance.amount, dec("12000"));
    assert!(ledger.get_voucher(&preview.id).await.unwrap().is_none());
    assert_eq!(ledger.get_balances("c1").await.unwrap(), LedgerBalances::zero());

    let recorded = ledger.record_voucher(draft).await.unwrap();
    assert_eq!(recorded.balance_snapshot, preview.balance_snapshot);
}

#[tokio::test]
async fn test_delete_voucher_reverts_balances_and_audit_reports_drift() {
    let mut ledger = ledger();
    ledger
        .create_customer(Customer::new("c1".to_string(), "Meena".to_string()))
        .await
        .unwrap();

    let bill = ledger
        .record_voucher(
            VoucherDraft::credit_bill("c1", day(1), rates())
                .item(LineItemInput::new(MetalType::Gold, dec("3"), dec("100"))),
        )
        .await
        .unwrap();
    let receipt = ledger
        .record_voucher(VoucherDraft::settlement(
            "c1",
            day(2),
            PaymentType::AddCash,
            dec("5000"),
            rates(),
        ))
        .await
        .unwrap();
    assert_eq!(receipt.balance_snapshot.old_balance.amount, dec("18000"));
    assert_eq!(receipt.balance_snapshot.current_balance.amount, dec("13000"));

    let as_of_first = ledger.get_balances_as_of("c1", day(1)).await.unwrap();
    assert_eq!(as_of_first.credit, dec("18000"));
    assert_eq!(as_of_first.cash, BigDecimal::from(0));

    assert!(ledger.audit_snapshots("c1").await.unwrap().is_consistent);

    ledger.delete_voucher(&bill.id).await.unwrap();

    let balances = ledger.get_balances("c1").await.unwrap();
    assert_eq!(balances.credit, BigDecimal::from(0));
    assert_eq!(balances.cash, dec("-5000"));
    assert_eq!(balances.gold_fine, BigDecimal::from(0));

    // The receipt keeps the snapshot it was saved with
    let kept = ledger.get_voucher(&receipt.id).await.unwrap().unwrap();
    assert_eq!(kept.balance_snapshot, receipt.balance_snapshot);

    let report = ledger.audit_snapshots("c1").await.unwrap();
    assert_eq!(report.vouchers_checked, 1);
    assert_eq!(report.stale_snapshots.len(), 1);
    assert_eq!(report.stale_snapshots[0].voucher_id, receipt.id);
    assert!(report.live_balances_match);
    assert!(!report.is_consistent);

    let missing = ledger.delete_voucher(&bill.id).await;
    assert!(matches!(missing, Err(LedgerError::VoucherNotFound(_))));
}

#[tokio::test]
async fn test_customer_with_vouchers_cannot_be_deleted() {
    let mut ledger = ledger();
    ledger
        .create_customer(Customer::new("c1".to_string(), "Meena".to_string()))
        .await
        .unwrap();
    ledger
        .create_customer(Customer::new("c2".to_string(), "Lakshmi".to_string()))
        .await
        .unwrap();
    ledger
        .record_voucher(VoucherDraft::settlement(
            "c1",
            day(1),
            PaymentType::AddGold,
            dec("1.25"),
            rates(),
        ))
        .await
        .unwrap();

    assert!(ledger.delete_customer("c1").await.is_err());
    ledger.delete_customer("c2").await.unwrap();

    let remaining = ledger.list_customers().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, "c1");
    assert_eq!(remaining[0].balances.gold_fine, dec("-1.25"));
}

#[tokio::test]
async fn test_update_customer_keeps_balances() {
    let mut ledger = ledger();
    ledger
        .create_customer(Customer::new("c1".to_string(), "Meena".to_string()))
        .await
        .unwrap();
    ledger
        .record_voucher(
            VoucherDraft::credit_bill("c1", day(1), rates())
                .item(LineItemInput::new(MetalType::Silver, dec("100"), dec("92.5"))),
        )
        .await
        .unwrap();

    let mut edited = ledger.get_customer("c1").await.unwrap().unwrap();
    edited.name = "Meena R".to_string();
    edited.balances = LedgerBalances::zero();
    ledger.update_customer(&edited).await.unwrap();

    let stored = ledger.get_customer("c1").await.unwrap().unwrap();
    assert_eq!(stored.name, "Meena R");
    assert_eq!(stored.balances.silver_fine, dec("92.5"));
    assert_eq!(stored.balances.credit, dec("7400"));
}

#[tokio::test]
async fn test_raw_form_with_malformed_numbers() {
    let mut ledger = ledger();
    ledger
        .create_customer(Customer::new("c1".to_string(), "Meena".to_string()))
        .await
        .unwrap();

    let form: RawVoucherForm = serde_json::from_value(serde_json::json!({
        "customer_id": " c1 ",
        "date": "2024-04-09",
        "payment_type": "Credit",
        "gold_rate": "6000",
        "silver_rate": "eighty",
        "stone_amount": "",
        "items": [
            { "metal_type": "Gold", "gross_weight": "10", "less_weight": "0.5",
              "melting_percent": "91.6", "wastage_grams": "0.2", "labour_rate": "abc" }
        ]
    }))
    .unwrap();

    let draft = VoucherDraft::from_form(form, day(30));
    assert_eq!(draft.date, day(9));
    assert_eq!(draft.rates.silver, BigDecimal::from(0));

    let voucher = ledger.record_voucher(draft).await.unwrap();
    assert_eq!(voucher.items[0].net_weight, dec("9.5"));
    assert_eq!(voucher.items[0].fine_weight, dec("8.902"));
    assert_eq!(voucher.items[0].labour_charge, BigDecimal::from(0));
    assert_eq!(voucher.net_bill_value, dec("53412"));
    assert_eq!(voucher.invoice_type, InvoiceType::Normal);
}

#[tokio::test]
async fn test_per_gram_policy_from_settings() {
    let mut ledger = ledger();
    ledger.set_settings(BillingSettings::new(
        LabourChargePolicy::PerGram,
        GstDefaults::default(),
    ));
    ledger
        .create_customer(Customer::new("c1".to_string(), "Meena".to_string()))
        .await
        .unwrap();

    let voucher = ledger
        .record_voucher(
            VoucherDraft::cash_bill("c1", day(1), rates()).item(
                LineItemInput::new(MetalType::Gold, dec("4"), dec("100")).labour_rate(dec("50")),
            ),
        )
        .await
        .unwrap();

    assert_eq!(voucher.items[0].labour_charge, dec("200"));
    assert_eq!(voucher.totals.labour_total, dec("200"));
    assert_eq!(voucher.bill_total, dec("24200"));
}

#[tokio::test]
async fn test_enhanced_validators() {
    let mut ledger = BillingLedger::with_validators(
        MemoryStorage::new(),
        settings(),
        Box::new(EnhancedCustomerValidator),
        Box::new(EnhancedVoucherValidator),
    );

    let bad_id = ledger
        .create_customer(Customer::new("bad id".to_string(), "Meena".to_string()))
        .await;
    assert!(matches!(bad_id, Err(LedgerError::Validation(_))));

    ledger
        .create_customer(Customer::new("c1".to_string(), "Meena".to_string()))
        .await
        .unwrap();

    let over_less = VoucherDraft::cash_bill("c1", day(1), rates())
        .item(LineItemInput::new(MetalType::Gold, dec("1"), dec("91.6")).less_weight(dec("3")));
    assert!(matches!(
        ledger.record_voucher(over_less).await,
        Err(LedgerError::Validation(_))
    ));

    let empty_bill = VoucherDraft::cash_bill("c1", day(1), rates());
    assert!(matches!(
        ledger.record_voucher(empty_bill).await,
        Err(LedgerError::InvalidVoucher(_))
    ));

    assert!(ledger.get_vouchers(None, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_vouchers_listed_in_date_order() {
    let mut ledger = ledger();
    ledger
        .create_customer(Customer::new("c1".to_string(), "Meena".to_string()))
        .await
        .unwrap();

    for (d, grams) in [(7, "1"), (2, "2"), (5, "3")] {
        ledger
            .record_voucher(VoucherDraft::settlement(
                "c1",
                day(d),
                PaymentType::AddSilver,
                dec(grams),
                rates(),
            ))
            .await
            .unwrap();
    }

    let all = ledger.get_customer_vouchers("c1", None, None).await.unwrap();
    let dates: Vec<NaiveDate> = all.iter().map(|v| v.date).collect();
    assert_eq!(dates, vec![day(2), day(5), day(7)]);

    let window = ledger.get_vouchers(Some(day(3)), Some(day(6))).await.unwrap();
    assert_eq!(window.len(), 1);
    assert_eq!(window[0].settlement.as_ref().unwrap().value(), &dec("3"));
}

#[tokio::test]
async fn test_back_dated_entry_keeps_audit_clean() {
    let mut ledger = ledger();
    ledger
        .create_customer(Customer::new("c1".to_string(), "Meena".to_string()))
        .await
        .unwrap();

    ledger
        .record_voucher(VoucherDraft::settlement(
            "c1",
            day(7),
            PaymentType::AddCash,
            dec("100"),
            rates(),
        ))
        .await
        .unwrap();
    let back_dated = ledger
        .record_voucher(VoucherDraft::settlement(
            "c1",
            day(2),
            PaymentType::AddCash,
            dec("250"),
            rates(),
        ))
        .await
        .unwrap();

    // Frozen against the balance as it stood when it was entered
    assert_eq!(back_dated.balance_snapshot.old_balance.amount, dec("-100"));

    let report = ledger.audit_snapshots("c1").await.unwrap();
    assert_eq!(report.vouchers_checked, 2);
    assert!(report.stale_snapshots.is_empty());
    assert!(report.is_consistent);
}
