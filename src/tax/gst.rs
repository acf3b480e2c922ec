//! GST (Goods and Services Tax) engine for jewellery invoices
//!
//! Intra-state supplies split the rate into CGST and SGST; inter-state supplies
//! carry the whole rate as IGST. The tax type follows from the seller's and the
//! customer's two-digit state codes.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::utils::numeric::round_money;

/// Length of a GST registration number
pub const GSTIN_LENGTH: usize = 15;

/// Which GST components apply to a supply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaxType {
    /// Inter-state: Integrated GST
    Igst,
    /// Intra-state: Central GST + State GST
    CgstSgst,
}

/// GST rate structure split into its components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GstRate {
    /// Total GST rate percentage (e.g., 3.0 for 3%)
    pub total_rate: BigDecimal,
    /// CGST rate percentage (Central GST)
    pub cgst_rate: BigDecimal,
    /// SGST rate percentage (State GST)
    pub sgst_rate: BigDecimal,
    /// IGST rate percentage (Integrated GST)
    pub igst_rate: BigDecimal,
}

impl GstRate {
    /// Create a new GST rate with intra-state rates (CGST + SGST)
    pub fn intra_state(total_rate: BigDecimal) -> Self {
        let half_rate = &total_rate / BigDecimal::from(2);
        Self {
            total_rate,
            cgst_rate: half_rate.clone(),
            sgst_rate: half_rate,
            igst_rate: BigDecimal::from(0),
        }
    }

    /// Create a new GST rate with inter-state rates (IGST)
    pub fn inter_state(total_rate: BigDecimal) -> Self {
        Self {
            total_rate: total_rate.clone(),
            cgst_rate: BigDecimal::from(0),
            sgst_rate: BigDecimal::from(0),
            igst_rate: total_rate,
        }
    }

    /// Rate structure for a tax type
    pub fn for_tax_type(total_rate: BigDecimal, tax_type: TaxType) -> Self {
        match tax_type {
            TaxType::CgstSgst => Self::intra_state(total_rate),
            TaxType::Igst => Self::inter_state(total_rate),
        }
    }

    /// Validate that the GST rate structure is correct
    pub fn validate(&self) -> Result<(), GstError> {
        if self.total_rate < BigDecimal::from(0) {
            return Err(GstError::InvalidRate(format!(
                "GST rate cannot be negative: {}",
                self.total_rate
            )));
        }

        let calculated_total = &self.cgst_rate + &self.sgst_rate + &self.igst_rate;
        if calculated_total != self.total_rate {
            return Err(GstError::InvalidRate(format!(
                "GST components don't add up to total rate: {} != {}",
                calculated_total, self.total_rate
            )));
        }

        if self.igst_rate == BigDecimal::from(0) && self.cgst_rate != self.sgst_rate {
            return Err(GstError::InvalidRate(
                "CGST and SGST rates must be equal for intra-state transactions".to_string(),
            ));
        }

        if self.igst_rate > BigDecimal::from(0)
            && (self.cgst_rate > BigDecimal::from(0) || self.sgst_rate > BigDecimal::from(0))
        {
            return Err(GstError::InvalidRate(
                "Only IGST should be applicable for inter-state transactions".to_string(),
            ));
        }

        Ok(())
    }
}

/// Tax breakdown for one invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GstBreakdown {
    pub tax_type: TaxType,
    /// Total rate percentage applied
    pub rate: BigDecimal,
    /// Amount the tax was computed on
    pub taxable_amount: BigDecimal,
    pub igst: BigDecimal,
    pub cgst: BigDecimal,
    pub sgst: BigDecimal,
    /// IGST, or CGST + SGST
    pub total_gst: BigDecimal,
    /// Taxable amount plus total GST
    pub total: BigDecimal,
}

impl GstBreakdown {
    /// Work back from a tax-inclusive amount to its taxable base
    pub fn from_inclusive_total(
        inclusive_total: &BigDecimal,
        rate_percent: &BigDecimal,
        tax_type: TaxType,
    ) -> Result<Self, GstError> {
        let divisor = BigDecimal::from(100) + rate_percent;
        if divisor <= BigDecimal::from(0) {
            return Err(GstError::InvalidRate(format!(
                "Cannot reverse a GST rate of {}%",
                rate_percent
            )));
        }
        let taxable_amount = round_money(&(inclusive_total * BigDecimal::from(100) / divisor));
        Ok(compute_gst(&taxable_amount, rate_percent, tax_type))
    }
}

/// Decide the tax type from the two state codes.
///
/// Returns `None` when either code is missing or blank; no breakdown should be
/// computed or shown until both are known.
pub fn determine_tax_type(
    seller_state_code: Option<&str>,
    customer_state_code: Option<&str>,
) -> Option<TaxType> {
    let seller = seller_state_code.map(str::trim).filter(|s| !s.is_empty())?;
    let customer = customer_state_code.map(str::trim).filter(|s| !s.is_empty())?;

    if seller == customer {
        Some(TaxType::CgstSgst)
    } else {
        Some(TaxType::Igst)
    }
}

/// Compute the GST breakdown for a taxable amount.
///
/// The total tax is rounded to paise once. For CGST+SGST, CGST is half of it rounded
/// half-up and SGST takes the remainder, so both tax types always agree on `total_gst`.
/// When the total is an odd number of paise the halves differ by one paisa, CGST
/// carrying the extra one (0.01 total gives CGST 0.01, SGST 0.00).
pub fn compute_gst(
    taxable_amount: &BigDecimal,
    rate_percent: &BigDecimal,
    tax_type: TaxType,
) -> GstBreakdown {
    let zero = BigDecimal::from(0);
    let total_gst = round_money(&(taxable_amount * rate_percent / BigDecimal::from(100)));

    let (igst, cgst, sgst) = match tax_type {
        TaxType::Igst => (total_gst.clone(), zero.clone(), zero.clone()),
        TaxType::CgstSgst => {
            let cgst = round_money(&(&total_gst / BigDecimal::from(2)));
            let sgst = &total_gst - &cgst;
            (zero.clone(), cgst, sgst)
        }
    };

    GstBreakdown {
        tax_type,
        rate: rate_percent.clone(),
        taxable_amount: taxable_amount.clone(),
        igst,
        cgst,
        sgst,
        total: taxable_amount + &total_gst,
        total_gst,
    }
}

/// Check a GST registration number: 2 digits, 5 letters, 4 digits, 4 alphanumerics.
pub fn is_valid_gstin(gstin: &str) -> bool {
    let bytes = gstin.as_bytes();
    if bytes.len() != GSTIN_LENGTH {
        return false;
    }

    bytes[..2].iter().all(u8::is_ascii_digit)
        && bytes[2..7].iter().all(u8::is_ascii_alphabetic)
        && bytes[7..11].iter().all(u8::is_ascii_digit)
        && bytes[11..].iter().all(u8::is_ascii_alphanumeric)
}

/// State code of a valid GSTIN (its first two characters)
pub fn state_code_from_gstin(gstin: &str) -> Option<&str> {
    if is_valid_gstin(gstin) {
        Some(&gstin[..2])
    } else {
        None
    }
}

/// Account-level GST settings, passed explicitly into every GST computation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GstDefaults {
    /// Rate percentage applied to GST invoices
    pub rate_percent: BigDecimal,
    /// The shop's own state code
    pub seller_state_code: Option<String>,
}

impl GstDefaults {
    /// Standard rate for gold and silver jewellery
    pub fn jewellery_rate() -> BigDecimal {
        BigDecimal::from(3)
    }

    pub fn new(rate_percent: BigDecimal, seller_state_code: Option<String>) -> Self {
        Self {
            rate_percent,
            seller_state_code,
        }
    }
}

impl Default for GstDefaults {
    fn default() -> Self {
        Self::new(Self::jewellery_rate(), None)
    }
}

/// GST engine bound to a shop's defaults
#[derive(Debug, Clone)]
pub struct GstEngine {
    defaults: GstDefaults,
}

impl GstEngine {
    /// Create a new GST engine
    pub fn new(defaults: GstDefaults) -> Self {
        Self { defaults }
    }

    pub fn defaults(&self) -> &GstDefaults {
        &self.defaults
    }

    /// Tax type for a customer in the given state
    pub fn tax_type_for(&self, customer_state_code: Option<&str>) -> Option<TaxType> {
        determine_tax_type(self.defaults.seller_state_code.as_deref(), customer_state_code)
    }

    /// Breakdown at the default rate, or `None` while the tax type is undetermined
    pub fn calculate(
        &self,
        taxable_amount: &BigDecimal,
        customer_state_code: Option<&str>,
    ) -> Option<GstBreakdown> {
        self.calculate_with_rate(taxable_amount, &self.defaults.rate_percent, customer_state_code)
    }

    /// Breakdown at an explicit rate, or `None` while the tax type is undetermined
    pub fn calculate_with_rate(
        &self,
        taxable_amount: &BigDecimal,
        rate_percent: &BigDecimal,
        customer_state_code: Option<&str>,
    ) -> Option<GstBreakdown> {
        let tax_type = self.tax_type_for(customer_state_code)?;
        Some(compute_gst(taxable_amount, rate_percent, tax_type))
    }

    /// Component rates for a customer, validated
    pub fn rate_for(&self, customer_state_code: Option<&str>) -> Result<GstRate, GstError> {
        let tax_type = self
            .tax_type_for(customer_state_code)
            .ok_or(GstError::UndeterminedTaxType)?;
        let rate = GstRate::for_tax_type(self.defaults.rate_percent.clone(), tax_type);
        rate.validate()?;
        Ok(rate)
    }
}

/// GST-related errors
#[derive(Debug, thiserror::Error)]
pub enum GstError {
    #[error("Invalid GST rate: {0}")]
    InvalidRate(String),
    #[error("GST tax type cannot be determined without both state codes")]
    UndeterminedTaxType,
    #[error("Invalid GSTIN: {0}")]
    InvalidGstin(String),
}
