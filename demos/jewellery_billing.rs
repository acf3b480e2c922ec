//! Jewellery billing walkthrough: a credit bill, a GST bill and two settlements

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use jewellery_ledger_core::utils::{format_money, format_weight, MemoryStorage};
use jewellery_ledger_core::{
    BillingLedger, BillingSettings, Customer, GstDefaults, LabourChargePolicy, LedgerBalances,
    LineItemInput, MetalRates, MetalType, PaymentType, Voucher, VoucherDraft,
};
use std::str::FromStr;

fn print_snapshot(voucher: &Voucher) {
    let snap = &voucher.balance_snapshot;
    println!(
        "  Old balance:     ₹{}  gold {}g  silver {}g",
        format_money(&snap.old_balance.amount),
        format_weight(&snap.old_balance.gold_fine_weight),
        format_weight(&snap.old_balance.silver_fine_weight)
    );
    println!(
        "  Current balance: ₹{}  gold {}g  silver {}g",
        format_money(&snap.current_balance.amount),
        format_weight(&snap.current_balance.gold_fine_weight),
        format_weight(&snap.current_balance.silver_fine_weight)
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("💍 Jewellery Ledger Core - Billing Example\n");

    let settings = BillingSettings::new(
        LabourChargePolicy::Flat,
        GstDefaults::new(GstDefaults::jewellery_rate(), Some("33".to_string())),
    );
    let mut ledger = BillingLedger::new(MemoryStorage::new(), settings);

    let opening = LedgerBalances::from_split(
        Some(BigDecimal::from(500)),
        Some(BigDecimal::from(1000)),
        Some(BigDecimal::from_str("1.250")?),
        None,
    );
    let customer = ledger
        .create_customer(
            Customer::with_opening_balances(
                "anand".to_string(),
                "Anand & Sons".to_string(),
                opening,
            )
            .with_gstin("33ABCDE1234F1Z5")?,
        )
        .await?;
    println!("👤 Opened ledger for {} (state {:?})\n", customer.name, customer.state_code);

    let rates = MetalRates::new(BigDecimal::from(6000), BigDecimal::from(80));
    let day = |d| NaiveDate::from_ymd_opt(2024, 6, d).ok_or("invalid date");

    // 1. Credit bill with two gold items and a silver item
    println!("🧾 Credit bill:");
    let draft = VoucherDraft::credit_bill(&customer.id, day(1)?, rates.clone())
        .item(
            LineItemInput::new(
                MetalType::Gold,
                BigDecimal::from(10),
                BigDecimal::from_str("91.6")?,
            )
            .description("Necklace")
            .less_weight(BigDecimal::from_str("0.5")?)
            .wastage(BigDecimal::from_str("0.2")?)
            .labour_rate(BigDecimal::from(1500)),
        )
        .item(
            LineItemInput::new(MetalType::Silver, BigDecimal::from(50), BigDecimal::from(92))
                .description("Anklet pair")
                .pieces(2)
                .labour_rate(BigDecimal::from(300)),
        )
        .stone_amount(BigDecimal::from(2500))
        .cash_received(BigDecimal::from(10000));
    let bill = ledger.record_voucher(draft).await?;

    for item in &bill.items {
        println!(
            "  {:<12} net {}g  fine {}g  labour ₹{}  amount ₹{}",
            item.description.as_deref().unwrap_or("-"),
            format_weight(&item.net_weight),
            format_weight(&item.fine_weight),
            format_money(&item.labour_charge),
            format_money(&item.amount)
        );
    }
    println!("  Bill total:      ₹{}", format_money(&bill.bill_total));
    println!("  Net bill value:  ₹{}", format_money(&bill.net_bill_value));
    print_snapshot(&bill);
    println!();

    // 2. GST cash bill, intra-state so CGST + SGST
    println!("🏢 GST cash bill:");
    let gst_bill = ledger
        .record_voucher(
            VoucherDraft::cash_bill(&customer.id, day(3)?, rates.clone())
                .item(LineItemInput::new(
                    MetalType::Gold,
                    BigDecimal::from(2),
                    BigDecimal::from_str("91.6")?,
                ))
                .gst()
                .round_off(BigDecimal::from_str("0.04")?),
        )
        .await?;
    if let Some(gst) = &gst_bill.gst_details {
        println!("  Taxable: ₹{}", format_money(&gst.taxable_amount));
        println!("  CGST:    ₹{}", format_money(&gst.cgst));
        println!("  SGST:    ₹{}", format_money(&gst.sgst));
        println!("  IGST:    ₹{}", format_money(&gst.igst));
        println!("  Total:   ₹{}", format_money(&gst.total));
    }
    print_snapshot(&gst_bill);
    println!();

    // 3. Settlements
    println!("💰 Cash paid towards gold:");
    let to_gold = ledger
        .record_voucher(VoucherDraft::settlement(
            &customer.id,
            day(5)?,
            PaymentType::MoneyToGold,
            BigDecimal::from(12000),
            rates.clone(),
        ))
        .await?;
    print_snapshot(&to_gold);
    println!();

    println!("🥈 Old silver received:");
    let silver = ledger
        .record_voucher(VoucherDraft::settlement(
            &customer.id,
            day(6)?,
            PaymentType::AddSilver,
            BigDecimal::from(20),
            rates,
        ))
        .await?;
    print_snapshot(&silver);
    println!();

    // 4. Audit
    let report = ledger.audit_snapshots(&customer.id).await?;
    println!(
        "🔍 Audit: {} vouchers checked, {} stale, consistent: {}",
        report.vouchers_checked,
        report.stale_snapshots.len(),
        report.is_consistent
    );

    ledger.delete_voucher(&bill.id).await?;
    let report = ledger.audit_snapshots(&customer.id).await?;
    println!(
        "🗑  After deleting the credit bill: {} stale snapshots, live balances match: {}",
        report.stale_snapshots.len(),
        report.live_balances_match
    );

    let balances = ledger.get_balances(&customer.id).await?;
    println!(
        "\n📒 Live balances: cash ₹{}  credit ₹{}  gold {}g  silver {}g",
        format_money(&balances.cash),
        format_money(&balances.credit),
        format_weight(&balances.gold_fine),
        format_weight(&balances.silver_fine)
    );

    Ok(())
}
