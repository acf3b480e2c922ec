//! Balance snapshot engine
//!
//! Given a customer's balances immediately before a voucher, computes the
//! before/after figures frozen into the voucher and the change the store has
//! to apply to the live balances.
//!
//! Snapshots are point-in-time records. Editing or deleting an earlier voucher
//! afterwards does not touch them, so a later voucher's `old_balance` can stop
//! matching a replayed running balance; `reconciliation::audit_snapshots`
//! reports such drift without rewriting anything.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::types::{
    BalanceEffect, BalanceFigures, BalanceSnapshot, LedgerBalances, MetalRates, MetalType,
    SettlementDelta,
};
use crate::utils::numeric::round_weight;

/// Which running balance a bill posts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BillKind {
    Cash,
    Credit,
}

/// The part of a voucher the snapshot engine needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LedgerEntry {
    /// A cash or credit bill.
    ///
    /// `net_bill_value` has the same make-up for both kinds: round-off is part of
    /// what the customer owes on a cash bill as much as on a credit bill.
    Bill {
        kind: BillKind,
        /// Items + stone + GST + round-off − cash received
        net_bill_value: BigDecimal,
        gold_fine_weight: BigDecimal,
        silver_fine_weight: BigDecimal,
    },
    Settlement {
        delta: SettlementDelta,
        rates: MetalRates,
    },
}

/// Reasons a snapshot cannot be produced
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("Prior balances are unavailable; refusing to assume zero")]
    BalancesUnavailable,
    #[error("Cannot convert cash into fine {0} at a zero rate")]
    ZeroMetalRate(MetalType),
}

/// Fine grams bought by a cash amount at the given rate
pub fn convert_cash_to_fine(
    cash_amount: &BigDecimal,
    metal_rate: &BigDecimal,
    metal: MetalType,
) -> Result<BigDecimal, SnapshotError> {
    if *metal_rate == BigDecimal::from(0) {
        return Err(SnapshotError::ZeroMetalRate(metal));
    }
    Ok(round_weight(&(cash_amount / metal_rate)))
}

/// Signed change the entry makes to each balance track.
///
/// Bills add to what the customer owes. Settlements are receipts and reduce it.
pub fn balance_effect(entry: &LedgerEntry) -> Result<BalanceEffect, SnapshotError> {
    let mut effect = BalanceEffect::none();

    match entry {
        LedgerEntry::Bill {
            kind: BillKind::Cash,
            net_bill_value,
            ..
        } => {
            effect.cash = net_bill_value.clone();
        }
        LedgerEntry::Bill {
            kind: BillKind::Credit,
            net_bill_value,
            gold_fine_weight,
            silver_fine_weight,
        } => {
            effect.credit = net_bill_value.clone();
            effect.gold_fine = gold_fine_weight.clone();
            effect.silver_fine = silver_fine_weight.clone();
        }
        LedgerEntry::Settlement { delta, rates } => match delta {
            SettlementDelta::AddCash(amount) => effect.cash = -amount,
            SettlementDelta::AddGold(grams) => effect.gold_fine = -round_weight(grams),
            SettlementDelta::AddSilver(grams) => effect.silver_fine = -round_weight(grams),
            SettlementDelta::ConvertToGold(cash) => {
                effect.gold_fine = -convert_cash_to_fine(cash, &rates.gold, MetalType::Gold)?;
            }
            SettlementDelta::ConvertToSilver(cash) => {
                effect.silver_fine =
                    -convert_cash_to_fine(cash, &rates.silver, MetalType::Silver)?;
            }
        },
    }

    Ok(effect)
}

/// Money figure the snapshot reports for an entry.
///
/// Cash bills only look at the cash track; everything else reports cash + credit.
fn amount_view(balances: &LedgerBalances, entry: &LedgerEntry) -> BigDecimal {
    match entry {
        LedgerEntry::Bill {
            kind: BillKind::Cash,
            ..
        } => balances.cash.clone(),
        _ => balances.total_amount(),
    }
}

fn figures(balances: &LedgerBalances, entry: &LedgerEntry) -> BalanceFigures {
    BalanceFigures {
        amount: amount_view(balances, entry),
        gold_fine_weight: balances.gold_fine.clone(),
        silver_fine_weight: balances.silver_fine.clone(),
    }
}

/// Compute the before/after snapshot for an entry.
///
/// `old_balances` must be the customer's balances as they stand immediately before
/// this voucher. `None` (customer not found) is an error; zero is never assumed.
pub fn compute_snapshot(
    old_balances: Option<&LedgerBalances>,
    entry: &LedgerEntry,
) -> Result<BalanceSnapshot, SnapshotError> {
    let old = old_balances.ok_or(SnapshotError::BalancesUnavailable)?;
    let effect = balance_effect(entry)?;
    let new = old.apply(&effect);

    Ok(BalanceSnapshot {
        old_balance: figures(old, entry),
        current_balance: figures(&new, entry),
    })
}
