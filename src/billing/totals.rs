//! Invoice totals across priced line items

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::billing::amount::compute_labour_charge;
use crate::billing::item::LineItem;
use crate::types::{LabourChargePolicy, MetalType};
use crate::utils::numeric::{round_money, round_weight};

/// Summed figures for an invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub pieces: u64,
    pub gross_weight: BigDecimal,
    pub less_weight: BigDecimal,
    pub net_weight: BigDecimal,
    /// Sum of raw wastage grams
    pub wastage: BigDecimal,
    pub fine_weight: BigDecimal,
    /// Sum of policy-applied labour charges
    pub labour_total: BigDecimal,
    pub amount_total: BigDecimal,
    /// Fine weight of gold items only
    pub gold_fine_weight: BigDecimal,
    /// Fine weight of silver items only
    pub silver_fine_weight: BigDecimal,
}

impl Totals {
    /// All-zero totals
    pub fn zero() -> Self {
        Self {
            pieces: 0,
            gross_weight: BigDecimal::from(0),
            less_weight: BigDecimal::from(0),
            net_weight: BigDecimal::from(0),
            wastage: BigDecimal::from(0),
            fine_weight: BigDecimal::from(0),
            labour_total: BigDecimal::from(0),
            amount_total: BigDecimal::from(0),
            gold_fine_weight: BigDecimal::from(0),
            silver_fine_weight: BigDecimal::from(0),
        }
    }

    /// Fine weight for one metal
    pub fn fine_weight_of(&self, metal: MetalType) -> &BigDecimal {
        match metal {
            MetalType::Gold => &self.gold_fine_weight,
            MetalType::Silver => &self.silver_fine_weight,
        }
    }
}

impl Default for Totals {
    fn default() -> Self {
        Self::zero()
    }
}

/// Reduce priced items into invoice totals.
///
/// Labour is recomputed per item under `policy` rather than summing raw labour rates,
/// which would be wrong for per-gram labour. `amount_total` sums the item amounts as
/// they were priced, so `policy` must be the one the items were priced under;
/// otherwise `labour_total` and `amount_total` disagree.
pub fn aggregate(items: &[LineItem], policy: LabourChargePolicy) -> Totals {
    let mut totals = Totals::zero();

    for item in items {
        totals.pieces += u64::from(item.pieces);
        totals.gross_weight += &item.gross_weight;
        totals.less_weight += &item.less_weight;
        totals.net_weight += &item.net_weight;
        totals.wastage += &item.wastage_grams;
        totals.fine_weight += &item.fine_weight;
        totals.labour_total += compute_labour_charge(&item.labour_rate, &item.gross_weight, policy);
        totals.amount_total += &item.amount;
        match item.metal_type {
            MetalType::Gold => totals.gold_fine_weight += &item.fine_weight,
            MetalType::Silver => totals.silver_fine_weight += &item.fine_weight,
        }
    }

    totals.gross_weight = round_weight(&totals.gross_weight);
    totals.less_weight = round_weight(&totals.less_weight);
    totals.net_weight = round_weight(&totals.net_weight);
    totals.wastage = round_weight(&totals.wastage);
    totals.fine_weight = round_weight(&totals.fine_weight);
    totals.gold_fine_weight = round_weight(&totals.gold_fine_weight);
    totals.silver_fine_weight = round_weight(&totals.silver_fine_weight);
    totals.labour_total = round_money(&totals.labour_total);
    totals.amount_total = round_money(&totals.amount_total);

    totals
}
