//! Core types and data structures for the jewellery ledger

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::billing::{LineItem, Totals};
use crate::tax::gst::{state_code_from_gstin, GstBreakdown, GstError};

/// Precious metal a line item or balance is measured in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetalType {
    Gold,
    Silver,
}

impl std::fmt::Display for MetalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetalType::Gold => write!(f, "gold"),
            MetalType::Silver => write!(f, "silver"),
        }
    }
}

/// How an item's labour rate is turned into a charge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LabourChargePolicy {
    /// Labour rate is charged once per item
    #[default]
    Flat,
    /// Labour rate is multiplied by the item's gross weight
    PerGram,
}

/// Metal rates (₹ per gram of fine metal) in force for a voucher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetalRates {
    pub gold: BigDecimal,
    pub silver: BigDecimal,
}

impl MetalRates {
    pub fn new(gold: BigDecimal, silver: BigDecimal) -> Self {
        Self { gold, silver }
    }

    /// Rate applicable to the given metal
    pub fn rate_for(&self, metal: MetalType) -> &BigDecimal {
        match metal {
            MetalType::Gold => &self.gold,
            MetalType::Silver => &self.silver,
        }
    }
}

impl Default for MetalRates {
    fn default() -> Self {
        Self::new(BigDecimal::from(0), BigDecimal::from(0))
    }
}

/// Kind of voucher as captured by the billing form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentType {
    /// Sale settled against the customer's cash balance
    Cash,
    /// Sale on credit; accrues money and metal balances
    Credit,
    /// Cash received from the customer
    AddCash,
    /// Fine gold received from the customer (grams)
    AddGold,
    /// Fine silver received from the customer (grams)
    AddSilver,
    /// Cash received and converted into fine gold at the voucher's gold rate
    MoneyToGold,
    /// Cash received and converted into fine silver at the voucher's silver rate
    MoneyToSilver,
}

impl PaymentType {
    /// Cash and credit vouchers are bills and carry line items
    pub fn is_bill(&self) -> bool {
        matches!(self, PaymentType::Cash | PaymentType::Credit)
    }

    /// Every other payment type is a settlement with no items
    pub fn is_settlement(&self) -> bool {
        !self.is_bill()
    }
}

/// Whether the invoice carries GST
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum InvoiceType {
    #[default]
    Normal,
    Gst,
}

/// Settlement amount, resolved from the overloaded `cash_received` form field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SettlementDelta {
    /// Rupees received
    AddCash(BigDecimal),
    /// Fine gold received, grams
    AddGold(BigDecimal),
    /// Fine silver received, grams
    AddSilver(BigDecimal),
    /// Rupees received to be converted into fine gold
    ConvertToGold(BigDecimal),
    /// Rupees received to be converted into fine silver
    ConvertToSilver(BigDecimal),
}

impl SettlementDelta {
    /// Interpret a `cash_received` value according to the payment type.
    ///
    /// Returns `None` for bills, whose `cash_received` really is cash tendered.
    pub fn from_payment(payment_type: PaymentType, value: BigDecimal) -> Option<Self> {
        match payment_type {
            PaymentType::Cash | PaymentType::Credit => None,
            PaymentType::AddCash => Some(SettlementDelta::AddCash(value)),
            PaymentType::AddGold => Some(SettlementDelta::AddGold(value)),
            PaymentType::AddSilver => Some(SettlementDelta::AddSilver(value)),
            PaymentType::MoneyToGold => Some(SettlementDelta::ConvertToGold(value)),
            PaymentType::MoneyToSilver => Some(SettlementDelta::ConvertToSilver(value)),
        }
    }

    /// Payment type this delta was resolved from
    pub fn payment_type(&self) -> PaymentType {
        match self {
            SettlementDelta::AddCash(_) => PaymentType::AddCash,
            SettlementDelta::AddGold(_) => PaymentType::AddGold,
            SettlementDelta::AddSilver(_) => PaymentType::AddSilver,
            SettlementDelta::ConvertToGold(_) => PaymentType::MoneyToGold,
            SettlementDelta::ConvertToSilver(_) => PaymentType::MoneyToSilver,
        }
    }

    /// The raw scalar carried by the delta (rupees or grams)
    pub fn value(&self) -> &BigDecimal {
        match self {
            SettlementDelta::AddCash(v)
            | SettlementDelta::AddGold(v)
            | SettlementDelta::AddSilver(v)
            | SettlementDelta::ConvertToGold(v)
            | SettlementDelta::ConvertToSilver(v) => v,
        }
    }
}

/// A customer's live running balances, owned by the ledger store.
///
/// Positive figures mean the customer owes the shop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerBalances {
    /// Money balance accumulated through cash bills and cash receipts
    pub cash: BigDecimal,
    /// Money balance accumulated through credit bills
    pub credit: BigDecimal,
    /// Outstanding fine gold, grams
    pub gold_fine: BigDecimal,
    /// Outstanding fine silver, grams
    pub silver_fine: BigDecimal,
}

impl LedgerBalances {
    pub fn new(
        cash: BigDecimal,
        credit: BigDecimal,
        gold_fine: BigDecimal,
        silver_fine: BigDecimal,
    ) -> Self {
        Self {
            cash,
            credit,
            gold_fine,
            silver_fine,
        }
    }

    /// All-zero balances for a freshly opened ledger
    pub fn zero() -> Self {
        Self::new(
            BigDecimal::from(0),
            BigDecimal::from(0),
            BigDecimal::from(0),
            BigDecimal::from(0),
        )
    }

    /// Normalize a record that keeps cash and credit on separate tracks
    pub fn from_split(
        cash_balance: Option<BigDecimal>,
        credit_balance: Option<BigDecimal>,
        gold_fine: Option<BigDecimal>,
        silver_fine: Option<BigDecimal>,
    ) -> Self {
        let zero = || BigDecimal::from(0);
        Self::new(
            cash_balance.unwrap_or_else(zero),
            credit_balance.unwrap_or_else(zero),
            gold_fine.unwrap_or_else(zero),
            silver_fine.unwrap_or_else(zero),
        )
    }

    /// Normalize a record that only keeps a single money amount; it lands on the cash track
    pub fn from_single_amount(
        amount: BigDecimal,
        gold_fine: Option<BigDecimal>,
        silver_fine: Option<BigDecimal>,
    ) -> Self {
        Self::from_split(Some(amount), None, gold_fine, silver_fine)
    }

    /// Cash plus credit
    pub fn total_amount(&self) -> BigDecimal {
        &self.cash + &self.credit
    }

    /// Balances after applying a voucher's effect
    pub fn apply(&self, effect: &BalanceEffect) -> Self {
        Self {
            cash: &self.cash + &effect.cash,
            credit: &self.credit + &effect.credit,
            gold_fine: &self.gold_fine + &effect.gold_fine,
            silver_fine: &self.silver_fine + &effect.silver_fine,
        }
    }

    /// Balances with a voucher's effect taken back out
    pub fn revert(&self, effect: &BalanceEffect) -> Self {
        self.apply(&effect.reversed())
    }
}

impl Default for LedgerBalances {
    fn default() -> Self {
        Self::zero()
    }
}

/// Signed change a voucher makes to each balance track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceEffect {
    pub cash: BigDecimal,
    pub credit: BigDecimal,
    pub gold_fine: BigDecimal,
    pub silver_fine: BigDecimal,
}

impl BalanceEffect {
    pub fn none() -> Self {
        Self {
            cash: BigDecimal::from(0),
            credit: BigDecimal::from(0),
            gold_fine: BigDecimal::from(0),
            silver_fine: BigDecimal::from(0),
        }
    }

    /// The effect that undoes this one
    pub fn reversed(&self) -> Self {
        Self {
            cash: -&self.cash,
            credit: -&self.credit,
            gold_fine: -&self.gold_fine,
            silver_fine: -&self.silver_fine,
        }
    }
}

/// One side (before or after) of a balance snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceFigures {
    /// Money figure; which tracks it covers depends on the voucher kind
    pub amount: BigDecimal,
    pub gold_fine_weight: BigDecimal,
    pub silver_fine_weight: BigDecimal,
}

/// Point-in-time record of the customer's balances around one voucher.
///
/// Frozen into the voucher when it is saved and never recomputed afterwards,
/// even if earlier vouchers are edited or deleted later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub old_balance: BalanceFigures,
    pub current_balance: BalanceFigures,
}

/// Customer account that owns a running ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    /// Unique identifier for the customer
    pub id: String,
    /// Display name
    pub name: String,
    /// GST registration number, if the customer is registered
    pub gstin: Option<String>,
    /// Two-digit state code used for GST tax type selection
    pub state_code: Option<String>,
    /// Balances the ledger was opened with
    pub opening_balances: LedgerBalances,
    /// Live running balances
    pub balances: LedgerBalances,
    /// Additional metadata
    pub metadata: HashMap<String, String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Customer {
    /// Create a new customer ledger with zero balances
    pub fn new(id: String, name: String) -> Self {
        Self::with_opening_balances(id, name, LedgerBalances::zero())
    }

    /// Create a new customer ledger carrying balances brought forward
    pub fn with_opening_balances(id: String, name: String, opening: LedgerBalances) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id,
            name,
            gstin: None,
            state_code: None,
            balances: opening.clone(),
            opening_balances: opening,
            metadata: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Attach a GST registration; the state code is taken from its first two characters
    pub fn with_gstin(mut self, gstin: &str) -> Result<Self, GstError> {
        let normalized = gstin.trim().to_ascii_uppercase();
        let state_code = state_code_from_gstin(&normalized)
            .ok_or_else(|| GstError::InvalidGstin(gstin.to_string()))?
            .to_string();
        self.state_code = Some(state_code);
        self.gstin = Some(normalized);
        Ok(self)
    }

    /// Set the state code for an unregistered customer
    pub fn with_state_code(mut self, state_code: &str) -> Self {
        self.state_code = Some(state_code.trim().to_string());
        self
    }

    /// Replace the live balances
    pub fn set_balances(&mut self, balances: LedgerBalances) {
        self.balances = balances;
        self.updated_at = chrono::Utc::now().naive_utc();
    }
}

/// A persisted bill or settlement with its frozen snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voucher {
    /// Unique identifier for the voucher
    pub id: String,
    /// Customer whose ledger the voucher posts to
    pub customer_id: String,
    /// Business date of the voucher
    pub date: NaiveDate,
    pub payment_type: PaymentType,
    pub invoice_type: InvoiceType,
    /// Priced line items; empty for settlements
    pub items: Vec<LineItem>,
    pub stone_amount: BigDecimal,
    pub round_off: BigDecimal,
    /// Cash tendered on a bill, or the raw settlement figure
    pub cash_received: BigDecimal,
    pub gold_rate: BigDecimal,
    pub silver_rate: BigDecimal,
    /// Resolved settlement, present only for settlement vouchers
    pub settlement: Option<SettlementDelta>,
    pub totals: Totals,
    pub gst_details: Option<GstBreakdown>,
    /// Items + stone + GST + round-off
    pub bill_total: BigDecimal,
    /// Bill total less cash received
    pub net_bill_value: BigDecimal,
    /// Change applied to the live balances when the voucher was saved
    pub balance_effect: BalanceEffect,
    pub balance_snapshot: BalanceSnapshot,
    /// Item-mode sale that moves stock out of inventory
    pub affects_stock: bool,
    /// Optional free-text narration
    pub narration: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Errors that can occur in the ledger system
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),
    #[error("Voucher not found: {0}")]
    VoucherNotFound(String),
    #[error("Invalid voucher: {0}")]
    InvalidVoucher(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] crate::ledger::snapshot::SnapshotError),
    #[error("GST error: {0}")]
    Gst(#[from] GstError),
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
