//! Item amount calculation: metal value plus labour charge

use bigdecimal::BigDecimal;

use crate::types::LabourChargePolicy;
use crate::utils::numeric::round_money;

/// Labour charge for one item under the given policy, rounded to paise
pub fn compute_labour_charge(
    labour_rate: &BigDecimal,
    gross_weight: &BigDecimal,
    policy: LabourChargePolicy,
) -> BigDecimal {
    let charge = match policy {
        LabourChargePolicy::Flat => labour_rate.clone(),
        LabourChargePolicy::PerGram => labour_rate * gross_weight,
    };
    round_money(&charge)
}

/// Billed amount for one item: fine weight at the metal rate plus labour.
///
/// Zero and negative metal rates are accepted as given.
pub fn compute_item_amount(
    fine_weight: &BigDecimal,
    metal_rate: &BigDecimal,
    labour_charge: &BigDecimal,
) -> BigDecimal {
    round_money(&(fine_weight * metal_rate + labour_charge))
}
