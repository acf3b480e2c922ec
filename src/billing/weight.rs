//! Metal weight calculation: gross/less weight, melting and wastage into net and fine weight

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::utils::numeric::{parse_optional_lenient, round_weight};

/// Net and fine weight of one line item, both at milligram precision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightBreakdown {
    /// Gross minus less weight. Negative when less weight exceeds gross.
    pub net_weight: BigDecimal,
    /// Pure-metal equivalent: net × melting% + wastage
    pub fine_weight: BigDecimal,
}

/// Compute net and fine weight for one item.
///
/// A negative net weight is passed through untouched; it is a data-entry problem
/// for the form to flag, not something to correct here.
pub fn compute_weights(
    gross_weight: &BigDecimal,
    less_weight: &BigDecimal,
    melting_percent: &BigDecimal,
    wastage_grams: &BigDecimal,
) -> WeightBreakdown {
    let net_weight = round_weight(&(gross_weight - less_weight));
    let fine_weight =
        round_weight(&(&net_weight * melting_percent / BigDecimal::from(100) + wastage_grams));

    WeightBreakdown {
        net_weight,
        fine_weight,
    }
}

/// Same as [`compute_weights`] for raw form fields; missing or malformed values count as zero
pub fn compute_weights_lenient(
    gross_weight: Option<&str>,
    less_weight: Option<&str>,
    melting_percent: Option<&str>,
    wastage_grams: Option<&str>,
) -> WeightBreakdown {
    compute_weights(
        &parse_optional_lenient(gross_weight),
        &parse_optional_lenient(less_weight),
        &parse_optional_lenient(melting_percent),
        &parse_optional_lenient(wastage_grams),
    )
}
