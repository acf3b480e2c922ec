//! Voucher pricing, snapshotting and persistence

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::billing::{aggregate, LineItem, LineItemInput, RawLineItem, Totals};
use crate::config::BillingSettings;
use crate::ledger::snapshot::{balance_effect, compute_snapshot, BillKind, LedgerEntry};
use crate::tax::gst::{GstBreakdown, GstEngine};
use crate::traits::*;
use crate::types::*;
use crate::utils::numeric::{parse_optional_lenient, round_money};

/// Voucher as typed into the billing form, before any parsing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawVoucherForm {
    pub customer_id: String,
    pub date: Option<NaiveDate>,
    pub payment_type: Option<PaymentType>,
    pub invoice_type: InvoiceType,
    pub items: Vec<RawLineItem>,
    pub stone_amount: Option<String>,
    pub round_off: Option<String>,
    pub cash_received: Option<String>,
    pub gold_rate: Option<String>,
    pub silver_rate: Option<String>,
    pub gst_rate: Option<String>,
    pub customer_state_code: Option<String>,
    pub affects_stock: bool,
    pub narration: Option<String>,
}

/// Typed voucher input, ready to be priced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoucherDraft {
    pub customer_id: String,
    pub date: NaiveDate,
    pub payment_type: PaymentType,
    pub invoice_type: InvoiceType,
    pub items: Vec<LineItemInput>,
    pub stone_amount: BigDecimal,
    pub round_off: BigDecimal,
    /// Cash tendered on a bill, or the settlement figure
    pub cash_received: BigDecimal,
    pub rates: MetalRates,
    /// Overrides the configured GST rate
    pub gst_rate: Option<BigDecimal>,
    /// Overrides the state code stored on the customer
    pub customer_state_code: Option<String>,
    pub affects_stock: bool,
    pub narration: Option<String>,
}

impl VoucherDraft {
    fn new(
        customer_id: &str,
        date: NaiveDate,
        payment_type: PaymentType,
        rates: MetalRates,
    ) -> Self {
        Self {
            customer_id: customer_id.to_string(),
            date,
            payment_type,
            invoice_type: InvoiceType::Normal,
            items: Vec::new(),
            stone_amount: BigDecimal::from(0),
            round_off: BigDecimal::from(0),
            cash_received: BigDecimal::from(0),
            rates,
            gst_rate: None,
            customer_state_code: None,
            affects_stock: false,
            narration: None,
        }
    }

    /// Start a cash bill
    pub fn cash_bill(customer_id: &str, date: NaiveDate, rates: MetalRates) -> Self {
        Self::new(customer_id, date, PaymentType::Cash, rates)
    }

    /// Start a credit bill
    pub fn credit_bill(customer_id: &str, date: NaiveDate, rates: MetalRates) -> Self {
        Self::new(customer_id, date, PaymentType::Credit, rates)
    }

    /// A settlement voucher; `value` is rupees or grams depending on the payment type
    pub fn settlement(
        customer_id: &str,
        date: NaiveDate,
        payment_type: PaymentType,
        value: BigDecimal,
        rates: MetalRates,
    ) -> Self {
        let mut draft = Self::new(customer_id, date, payment_type, rates);
        draft.cash_received = value;
        draft
    }

    pub fn item(mut self, item: LineItemInput) -> Self {
        self.items.push(item);
        self
    }

    pub fn stone_amount(mut self, amount: BigDecimal) -> Self {
        self.stone_amount = amount;
        self
    }

    pub fn round_off(mut self, amount: BigDecimal) -> Self {
        self.round_off = amount;
        self
    }

    pub fn cash_received(mut self, amount: BigDecimal) -> Self {
        self.cash_received = amount;
        self
    }

    /// Mark as a GST invoice
    pub fn gst(mut self) -> Self {
        self.invoice_type = InvoiceType::Gst;
        self
    }

    pub fn gst_rate(mut self, rate_percent: BigDecimal) -> Self {
        self.gst_rate = Some(rate_percent);
        self
    }

    pub fn customer_state_code(mut self, state_code: &str) -> Self {
        self.customer_state_code = Some(state_code.to_string());
        self
    }

    pub fn affects_stock(mut self, affects_stock: bool) -> Self {
        self.affects_stock = affects_stock;
        self
    }

    pub fn narration(mut self, narration: &str) -> Self {
        self.narration = Some(narration.to_string());
        self
    }

    /// Parse a raw form. Missing numbers become zero; a missing payment type means a cash bill.
    pub fn from_form(form: RawVoucherForm, today: NaiveDate) -> Self {
        let rates = MetalRates::new(
            parse_optional_lenient(form.gold_rate.as_deref()),
            parse_optional_lenient(form.silver_rate.as_deref()),
        );
        let gst_rate = form
            .gst_rate
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(|r| parse_optional_lenient(Some(r)));

        Self {
            customer_id: form.customer_id.trim().to_string(),
            date: form.date.unwrap_or(today),
            payment_type: form.payment_type.unwrap_or(PaymentType::Cash),
            invoice_type: form.invoice_type,
            items: form.items.iter().map(LineItemInput::from_raw).collect(),
            stone_amount: parse_optional_lenient(form.stone_amount.as_deref()),
            round_off: parse_optional_lenient(form.round_off.as_deref()),
            cash_received: parse_optional_lenient(form.cash_received.as_deref()),
            rates,
            gst_rate,
            customer_state_code: form
                .customer_state_code
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            affects_stock: form.affects_stock,
            narration: form.narration.filter(|n| !n.trim().is_empty()),
        }
    }
}

/// A voucher with every figure computed except the balance snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedVoucher {
    pub customer_id: String,
    pub date: NaiveDate,
    pub payment_type: PaymentType,
    pub invoice_type: InvoiceType,
    pub items: Vec<LineItem>,
    pub stone_amount: BigDecimal,
    pub round_off: BigDecimal,
    pub cash_received: BigDecimal,
    pub rates: MetalRates,
    pub settlement: Option<SettlementDelta>,
    pub totals: Totals,
    pub gst_details: Option<GstBreakdown>,
    pub bill_total: BigDecimal,
    pub net_bill_value: BigDecimal,
    pub affects_stock: bool,
    pub narration: Option<String>,
}

/// Price a draft: items, totals, GST and bill value.
///
/// `customer_state_code` is used when the draft carries no state code of its own.
/// A GST invoice whose tax type cannot be determined gets no breakdown.
pub fn price_voucher(
    draft: VoucherDraft,
    settings: &BillingSettings,
    customer_state_code: Option<&str>,
) -> PricedVoucher {
    let policy = settings.labour_charge_policy;
    let items = LineItem::price_all(draft.items, &draft.rates, policy);
    let totals = aggregate(&items, policy);
    let settlement = SettlementDelta::from_payment(draft.payment_type, draft.cash_received.clone());

    let (gst_details, bill_total, net_bill_value) = if draft.payment_type.is_bill() {
        let taxable_amount = round_money(&(&totals.amount_total + &draft.stone_amount));
        let gst_details = match draft.invoice_type {
            InvoiceType::Gst => {
                let engine = GstEngine::new(settings.gst_defaults.clone());
                let rate = draft
                    .gst_rate
                    .clone()
                    .unwrap_or_else(|| settings.gst_defaults.rate_percent.clone());
                let state = draft.customer_state_code.as_deref().or(customer_state_code);
                let breakdown = engine.calculate_with_rate(&taxable_amount, &rate, state);
                if breakdown.is_none() {
                    warn!(
                        customer_id = %draft.customer_id,
                        "GST tax type undetermined; breakdown withheld"
                    );
                }
                breakdown
            }
            InvoiceType::Normal => None,
        };
        let tax = gst_details
            .as_ref()
            .map(|g| g.total_gst.clone())
            .unwrap_or_else(|| BigDecimal::from(0));
        let bill_total = round_money(&(taxable_amount + tax + &draft.round_off));
        let net_bill_value = round_money(&(&bill_total - &draft.cash_received));
        (gst_details, bill_total, net_bill_value)
    } else {
        (None, BigDecimal::from(0), BigDecimal::from(0))
    };

    debug!(
        customer_id = %draft.customer_id,
        payment_type = ?draft.payment_type,
        items = items.len(),
        bill_total = %bill_total,
        net_bill_value = %net_bill_value,
        "Priced voucher"
    );

    PricedVoucher {
        customer_id: draft.customer_id,
        date: draft.date,
        payment_type: draft.payment_type,
        invoice_type: draft.invoice_type,
        items,
        stone_amount: draft.stone_amount,
        round_off: draft.round_off,
        cash_received: draft.cash_received,
        rates: draft.rates,
        settlement,
        totals,
        gst_details,
        bill_total,
        net_bill_value,
        affects_stock: draft.affects_stock,
        narration: draft.narration,
    }
}

impl PricedVoucher {
    /// Structural checks: bills need items, settlements must have none,
    /// GST bills need a determined tax type.
    pub fn validate(&self) -> LedgerResult<()> {
        if self.payment_type.is_bill() && self.items.is_empty() {
            return Err(LedgerError::InvalidVoucher(format!(
                "{:?} bill must have at least one item",
                self.payment_type
            )));
        }

        if self.payment_type.is_settlement() {
            if !self.items.is_empty() {
                return Err(LedgerError::InvalidVoucher(format!(
                    "{:?} settlement cannot carry items",
                    self.payment_type
                )));
            }
            if self.settlement.is_none() {
                return Err(LedgerError::InvalidVoucher(
                    "Settlement amount was not resolved".to_string(),
                ));
            }
        }

        if self.payment_type.is_bill()
            && self.invoice_type == InvoiceType::Gst
            && self.gst_details.is_none()
        {
            return Err(LedgerError::InvalidVoucher(
                "GST invoice needs both seller and customer state codes".to_string(),
            ));
        }

        Ok(())
    }

    /// What the snapshot engine needs from this voucher
    pub fn ledger_entry(&self) -> LedgerResult<LedgerEntry> {
        entry_for(
            self.payment_type,
            self.settlement.as_ref(),
            &self.net_bill_value,
            &self.totals,
            &self.rates,
        )
    }

    /// Freeze the snapshot against the customer's current balances and produce the voucher
    pub fn finalize(self, old_balances: Option<&LedgerBalances>) -> LedgerResult<Voucher> {
        let entry = self.ledger_entry()?;
        let balance_snapshot = compute_snapshot(old_balances, &entry)?;
        let balance_effect = balance_effect(&entry)?;

        Ok(Voucher {
            id: uuid::Uuid::new_v4().to_string(),
            customer_id: self.customer_id,
            date: self.date,
            payment_type: self.payment_type,
            invoice_type: self.invoice_type,
            items: self.items,
            stone_amount: self.stone_amount,
            round_off: self.round_off,
            cash_received: self.cash_received,
            gold_rate: self.rates.gold,
            silver_rate: self.rates.silver,
            settlement: self.settlement,
            totals: self.totals,
            gst_details: self.gst_details,
            bill_total: self.bill_total,
            net_bill_value: self.net_bill_value,
            balance_effect,
            balance_snapshot,
            affects_stock: self.affects_stock,
            narration: self.narration,
            created_at: chrono::Utc::now().naive_utc(),
        })
    }
}

impl Voucher {
    /// Rebuild the snapshot engine's view of a saved voucher
    pub fn ledger_entry(&self) -> LedgerResult<LedgerEntry> {
        entry_for(
            self.payment_type,
            self.settlement.as_ref(),
            &self.net_bill_value,
            &self.totals,
            &MetalRates::new(self.gold_rate.clone(), self.silver_rate.clone()),
        )
    }
}

fn entry_for(
    payment_type: PaymentType,
    settlement: Option<&SettlementDelta>,
    net_bill_value: &BigDecimal,
    totals: &Totals,
    rates: &MetalRates,
) -> LedgerResult<LedgerEntry> {
    let kind = match payment_type {
        PaymentType::Cash => BillKind::Cash,
        PaymentType::Credit => BillKind::Credit,
        _ => {
            let delta = settlement.cloned().ok_or_else(|| {
                LedgerError::InvalidVoucher("Settlement amount was not resolved".to_string())
            })?;
            return Ok(LedgerEntry::Settlement {
                delta,
                rates: rates.clone(),
            });
        }
    };

    Ok(LedgerEntry::Bill {
        kind,
        net_bill_value: net_bill_value.clone(),
        gold_fine_weight: totals.gold_fine_weight.clone(),
        silver_fine_weight: totals.silver_fine_weight.clone(),
    })
}

/// Voucher manager for pricing, recording and retracting vouchers
pub struct VoucherManager<S: LedgerStorage> {
    storage: S,
    validator: Box<dyn VoucherValidator>,
}

impl<S: LedgerStorage> VoucherManager<S> {
    /// Create a new voucher manager
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            validator: Box::new(DefaultVoucherValidator),
        }
    }

    /// Create a new voucher manager with custom validator
    pub fn with_validator(storage: S, validator: Box<dyn VoucherValidator>) -> Self {
        Self { storage, validator }
    }

    async fn customer_required(&self, customer_id: &str) -> LedgerResult<Customer> {
        self.storage
            .get_customer(customer_id)
            .await?
            .ok_or_else(|| LedgerError::CustomerNotFound(customer_id.to_string()))
    }

    async fn prepare(
        &self,
        draft: VoucherDraft,
        settings: &BillingSettings,
    ) -> LedgerResult<(PricedVoucher, Customer)> {
        let customer = self.customer_required(&draft.customer_id).await?;
        let priced = price_voucher(draft, settings, customer.state_code.as_deref());
        self.validator.validate_voucher(&priced)?;
        Ok((priced, customer))
    }

    /// Price and snapshot a draft against the live balances without saving anything
    pub async fn preview_voucher(
        &self,
        draft: VoucherDraft,
        settings: &BillingSettings,
    ) -> LedgerResult<Voucher> {
        let (priced, customer) = self.prepare(draft, settings).await?;
        priced.finalize(Some(&customer.balances))
    }

    /// Price, snapshot and persist a voucher together with the customer's new balances
    pub async fn record_voucher(
        &mut self,
        draft: VoucherDraft,
        settings: &BillingSettings,
    ) -> LedgerResult<Voucher> {
        let (priced, customer) = self.prepare(draft, settings).await?;
        let voucher = priced.finalize(Some(&customer.balances))?;
        let balances_after = customer.balances.apply(&voucher.balance_effect);

        self.storage.commit_voucher(&voucher, &balances_after).await?;

        info!(
            voucher_id = %voucher.id,
            customer_id = %voucher.customer_id,
            payment_type = ?voucher.payment_type,
            net_bill_value = %voucher.net_bill_value,
            "Recorded voucher"
        );

        Ok(voucher)
    }

    /// Get a voucher by ID
    pub async fn get_voucher(&self, voucher_id: &str) -> LedgerResult<Option<Voucher>> {
        self.storage.get_voucher(voucher_id).await
    }

    /// Get a voucher by ID, returning an error if not found
    pub async fn get_voucher_required(&self, voucher_id: &str) -> LedgerResult<Voucher> {
        self.storage
            .get_voucher(voucher_id)
            .await?
            .ok_or_else(|| LedgerError::VoucherNotFound(voucher_id.to_string()))
    }

    /// Get vouchers for a specific customer, oldest first
    pub async fn get_customer_vouchers(
        &self,
        customer_id: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> LedgerResult<Vec<Voucher>> {
        self.storage
            .get_customer_vouchers(customer_id, start_date, end_date)
            .await
    }

    /// Get all vouchers within a date range
    pub async fn get_vouchers(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> LedgerResult<Vec<Voucher>> {
        self.storage.get_vouchers(start_date, end_date).await
    }

    /// Delete a voucher and take its effect back out of the live balances.
    ///
    /// Snapshots frozen into later vouchers are left as they were.
    pub async fn delete_voucher(&mut self, voucher_id: &str) -> LedgerResult<()> {
        let voucher = self.get_voucher_required(voucher_id).await?;
        let customer = self.customer_required(&voucher.customer_id).await?;
        let balances_after = customer.balances.revert(&voucher.balance_effect);

        let later = self
            .storage
            .get_customer_vouchers(&voucher.customer_id, None, None)
            .await?
            .into_iter()
            .filter(|v| v.id != voucher.id && v.created_at > voucher.created_at)
            .count();
        if later > 0 {
            warn!(
                voucher_id = %voucher.id,
                later_vouchers = later,
                "Deleting a voucher that later snapshots were based on"
            );
        }

        self.storage.retract_voucher(voucher_id, &balances_after).await?;

        info!(voucher_id = %voucher.id, customer_id = %voucher.customer_id, "Deleted voucher");
        Ok(())
    }
}
