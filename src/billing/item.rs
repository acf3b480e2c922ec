//! Line item input parsing and pricing

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::billing::amount::{compute_item_amount, compute_labour_charge};
use crate::billing::weight::compute_weights;
use crate::types::{LabourChargePolicy, MetalRates, MetalType};
use crate::utils::numeric::{parse_count_lenient, parse_optional_lenient};

/// Line item exactly as typed into a billing form.
///
/// Every numeric field is optional text so half-filled forms can still be priced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawLineItem {
    pub metal_type: Option<MetalType>,
    pub description: Option<String>,
    pub pieces: Option<String>,
    pub gross_weight: Option<String>,
    pub less_weight: Option<String>,
    pub melting_percent: Option<String>,
    pub wastage_grams: Option<String>,
    pub labour_rate: Option<String>,
}

/// Typed line item measurements, before pricing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemInput {
    pub metal_type: MetalType,
    pub description: Option<String>,
    pub pieces: u32,
    pub gross_weight: BigDecimal,
    pub less_weight: BigDecimal,
    pub melting_percent: BigDecimal,
    pub wastage_grams: BigDecimal,
    pub labour_rate: BigDecimal,
}

impl LineItemInput {
    /// Create an input with no less weight, wastage or labour
    pub fn new(
        metal_type: MetalType,
        gross_weight: BigDecimal,
        melting_percent: BigDecimal,
    ) -> Self {
        Self {
            metal_type,
            description: None,
            pieces: 1,
            gross_weight,
            less_weight: BigDecimal::from(0),
            melting_percent,
            wastage_grams: BigDecimal::from(0),
            labour_rate: BigDecimal::from(0),
        }
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn pieces(mut self, pieces: u32) -> Self {
        self.pieces = pieces;
        self
    }

    pub fn less_weight(mut self, less_weight: BigDecimal) -> Self {
        self.less_weight = less_weight;
        self
    }

    pub fn wastage(mut self, wastage_grams: BigDecimal) -> Self {
        self.wastage_grams = wastage_grams;
        self
    }

    pub fn labour_rate(mut self, labour_rate: BigDecimal) -> Self {
        self.labour_rate = labour_rate;
        self
    }

    /// Parse a raw form row. Missing metal defaults to gold; bad numbers become zero.
    pub fn from_raw(raw: &RawLineItem) -> Self {
        Self {
            metal_type: raw.metal_type.unwrap_or(MetalType::Gold),
            description: raw
                .description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            pieces: parse_count_lenient(raw.pieces.as_deref()),
            gross_weight: parse_optional_lenient(raw.gross_weight.as_deref()),
            less_weight: parse_optional_lenient(raw.less_weight.as_deref()),
            melting_percent: parse_optional_lenient(raw.melting_percent.as_deref()),
            wastage_grams: parse_optional_lenient(raw.wastage_grams.as_deref()),
            labour_rate: parse_optional_lenient(raw.labour_rate.as_deref()),
        }
    }
}

/// A priced line item; immutable once attached to a saved voucher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub metal_type: MetalType,
    pub description: Option<String>,
    pub pieces: u32,
    pub gross_weight: BigDecimal,
    pub less_weight: BigDecimal,
    pub melting_percent: BigDecimal,
    pub wastage_grams: BigDecimal,
    /// Raw labour rate as entered; see `labour_charge` for the applied figure
    pub labour_rate: BigDecimal,
    pub net_weight: BigDecimal,
    pub fine_weight: BigDecimal,
    /// Labour after the policy was applied
    pub labour_charge: BigDecimal,
    pub amount: BigDecimal,
}

impl LineItem {
    /// Price an item at the given rates and labour policy
    pub fn price(input: LineItemInput, rates: &MetalRates, policy: LabourChargePolicy) -> Self {
        let weights = compute_weights(
            &input.gross_weight,
            &input.less_weight,
            &input.melting_percent,
            &input.wastage_grams,
        );
        let labour_charge = compute_labour_charge(&input.labour_rate, &input.gross_weight, policy);
        let amount = compute_item_amount(
            &weights.fine_weight,
            rates.rate_for(input.metal_type),
            &labour_charge,
        );

        Self {
            metal_type: input.metal_type,
            description: input.description,
            pieces: input.pieces,
            gross_weight: input.gross_weight,
            less_weight: input.less_weight,
            melting_percent: input.melting_percent,
            wastage_grams: input.wastage_grams,
            labour_rate: input.labour_rate,
            net_weight: weights.net_weight,
            fine_weight: weights.fine_weight,
            labour_charge,
            amount,
        }
    }

    /// Price a batch of items
    pub fn price_all(
        inputs: Vec<LineItemInput>,
        rates: &MetalRates,
        policy: LabourChargePolicy,
    ) -> Vec<Self> {
        inputs
            .into_iter()
            .map(|input| Self::price(input, rates, policy))
            .collect()
    }
}
