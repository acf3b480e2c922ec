//! Snapshot audit for customer ledgers
//!
//! Snapshots are frozen when a voucher is saved, against the balances left by every
//! voucher recorded before it. The replay therefore follows recording order, not
//! voucher date: a back-dated voucher that was never edited audits clean. When a
//! voucher is deleted, the frozen figures of the vouchers recorded after it no
//! longer match the replay; this module reports them and never rewrites them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::ledger::snapshot::compute_snapshot;
use crate::types::*;

/// A voucher whose frozen snapshot disagrees with the replayed history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaleSnapshot {
    pub voucher_id: String,
    pub date: NaiveDate,
    /// Snapshot stored on the voucher
    pub frozen: BalanceSnapshot,
    /// Snapshot the voucher would get if the history were replayed today
    pub replayed: BalanceSnapshot,
}

/// Result of replaying a customer's vouchers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotAuditReport {
    pub customer_id: String,
    pub vouchers_checked: usize,
    pub stale_snapshots: Vec<StaleSnapshot>,
    /// Opening balances with every voucher's effect applied in order
    pub replayed_balances: LedgerBalances,
    /// Live balances held by the store
    pub stored_balances: LedgerBalances,
    pub live_balances_match: bool,
    /// No stale snapshots and live balances match the replay
    pub is_consistent: bool,
}

fn in_recording_order(vouchers: &[Voucher]) -> Vec<&Voucher> {
    let mut ordered: Vec<&Voucher> = vouchers.iter().collect();
    ordered.sort_by_key(|v| v.created_at);
    ordered
}

/// Replay a customer's vouchers from the opening balances, in the order they were
/// recorded, and compare snapshots
pub fn audit_snapshots(
    customer: &Customer,
    vouchers: &[Voucher],
) -> LedgerResult<SnapshotAuditReport> {
    let mut running = customer.opening_balances.clone();
    let mut stale_snapshots = Vec::new();
    let mut vouchers_checked = 0;

    for voucher in in_recording_order(vouchers) {
        if voucher.customer_id != customer.id {
            continue;
        }
        vouchers_checked += 1;

        let entry = voucher.ledger_entry()?;
        let replayed = compute_snapshot(Some(&running), &entry)?;
        if replayed != voucher.balance_snapshot {
            stale_snapshots.push(StaleSnapshot {
                voucher_id: voucher.id.clone(),
                date: voucher.date,
                frozen: voucher.balance_snapshot.clone(),
                replayed,
            });
        }

        running = running.apply(&voucher.balance_effect);
    }

    let live_balances_match = running == customer.balances;
    let is_consistent = stale_snapshots.is_empty() && live_balances_match;

    if is_consistent {
        debug!(customer_id = %customer.id, vouchers_checked, "Snapshot audit clean");
    } else {
        warn!(
            customer_id = %customer.id,
            stale = stale_snapshots.len(),
            live_balances_match,
            "Snapshot audit found drift"
        );
    }

    Ok(SnapshotAuditReport {
        customer_id: customer.id.clone(),
        vouchers_checked,
        stale_snapshots,
        replayed_balances: running,
        stored_balances: customer.balances.clone(),
        live_balances_match,
        is_consistent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::LineItemInput;
    use crate::config::BillingSettings;
    use crate::ledger::voucher::{price_voucher, VoucherDraft};
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    /// Record a voucher `minute` minutes into the shop day
    fn post(customer: &mut Customer, minute: i64, draft: VoucherDraft) -> Voucher {
        let priced = price_voucher(draft, &BillingSettings::default(), None);
        let mut voucher = priced.finalize(Some(&customer.balances)).unwrap();
        voucher.created_at = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
            + chrono::Duration::minutes(minute);
        let after = customer.balances.apply(&voucher.balance_effect);
        customer.set_balances(after);
        voucher
    }

    fn history() -> (Customer, Vec<Voucher>) {
        let mut customer = Customer::new("c1".to_string(), "Ravi".to_string());
        let rates = MetalRates::new(dec("6000"), dec("80"));
        let day = |d| NaiveDate::from_ymd_opt(2024, 5, d).unwrap();

        let first = post(
            &mut customer,
            0,
            VoucherDraft::credit_bill("c1", day(1), rates.clone())
                .item(LineItemInput::new(MetalType::Gold, dec("3"), dec("100"))),
        );
        let second = post(
            &mut customer,
            1,
            VoucherDraft::settlement(
                "c1",
                day(2),
                PaymentType::AddCash,
                dec("5000"),
                rates.clone(),
            ),
        );
        let third = post(
            &mut customer,
            2,
            VoucherDraft::settlement("c1", day(3), PaymentType::MoneyToGold, dec("6000"), rates),
        );
        (customer, vec![third, first, second])
    }

    #[test]
    fn test_untouched_history_is_consistent() {
        let (customer, vouchers) = history();
        let report = audit_snapshots(&customer, &vouchers).unwrap();

        assert_eq!(report.vouchers_checked, 3);
        assert!(report.stale_snapshots.is_empty());
        assert!(report.live_balances_match);
        assert!(report.is_consistent);
        assert_eq!(report.replayed_balances.gold_fine, dec("2"));
    }

    #[test]
    fn test_deleted_voucher_leaves_later_snapshots_stale() {
        let (mut customer, vouchers) = history();
        let first = vouchers
            .iter()
            .find(|v| v.payment_type == PaymentType::Credit)
            .unwrap()
            .clone();
        let remaining: Vec<Voucher> = vouchers
            .into_iter()
            .filter(|v| v.id != first.id)
            .collect();
        let reverted = customer.balances.revert(&first.balance_effect);
        customer.set_balances(reverted);

        let report = audit_snapshots(&customer, &remaining).unwrap();

        assert_eq!(report.vouchers_checked, 2);
        assert_eq!(report.stale_snapshots.len(), 2);
        assert!(report.live_balances_match);
        assert!(!report.is_consistent);
        // Frozen snapshots keep the deleted bill's 18000 in their old balance
        assert_eq!(report.stale_snapshots[0].frozen.old_balance.amount, dec("18000"));
        assert_eq!(report.stale_snapshots[0].replayed.old_balance.amount, BigDecimal::from(0));
    }

    #[test]
    fn test_back_dated_voucher_audits_clean() {
        let mut customer = Customer::new("c2".to_string(), "Suresh".to_string());
        let rates = MetalRates::new(dec("6000"), dec("80"));
        let day = |d| NaiveDate::from_ymd_opt(2024, 4, d).unwrap();

        let later_dated = post(
            &mut customer,
            0,
            VoucherDraft::settlement("c2", day(7), PaymentType::AddCash, dec("100"), rates.clone()),
        );
        let back_dated = post(
            &mut customer,
            1,
            VoucherDraft::settlement("c2", day(2), PaymentType::AddCash, dec("250"), rates),
        );
        assert_eq!(back_dated.balance_snapshot.old_balance.amount, dec("-100"));

        let report = audit_snapshots(&customer, &[back_dated, later_dated]).unwrap();

        assert_eq!(report.vouchers_checked, 2);
        assert!(report.stale_snapshots.is_empty());
        assert!(report.is_consistent);
        assert_eq!(report.replayed_balances.cash, dec("-350"));
    }

    #[test]
    fn test_tampered_live_balances_are_reported() {
        let (mut customer, vouchers) = history();
        customer.balances.cash += dec("1");
        let report = audit_snapshots(&customer, &vouchers).unwrap();
        assert!(report.stale_snapshots.is_empty());
        assert!(!report.live_balances_match);
        assert!(!report.is_consistent);
    }
}
