//! Main ledger orchestrator that coordinates customers and vouchers

use chrono::NaiveDate;

use crate::config::BillingSettings;
use crate::ledger::{CustomerManager, VoucherDraft, VoucherManager};
use crate::reconciliation::{audit_snapshots, SnapshotAuditReport};
use crate::traits::*;
use crate::types::*;

/// Billing ledger that reads balances, prices vouchers and persists them with their snapshot.
///
/// Mutating operations take `&mut self`: one ledger handle runs at most one
/// balance-changing operation at a time. Sharing a store between several handles
/// brings back the stale-balance problem and is up to the caller to serialize.
pub struct BillingLedger<S: LedgerStorage> {
    customer_manager: CustomerManager<S>,
    voucher_manager: VoucherManager<S>,
    settings: BillingSettings,
}

impl<S: LedgerStorage + Clone> BillingLedger<S> {
    /// Create a new billing ledger with the given storage backend
    pub fn new(storage: S, settings: BillingSettings) -> Self {
        Self {
            customer_manager: CustomerManager::new(storage.clone()),
            voucher_manager: VoucherManager::new(storage),
            settings,
        }
    }

    /// Create a new billing ledger with custom validators
    pub fn with_validators(
        storage: S,
        settings: BillingSettings,
        customer_validator: Box<dyn CustomerValidator>,
        voucher_validator: Box<dyn VoucherValidator>,
    ) -> Self {
        Self {
            customer_manager: CustomerManager::with_validator(storage.clone(), customer_validator),
            voucher_manager: VoucherManager::with_validator(storage, voucher_validator),
            settings,
        }
    }

    pub fn settings(&self) -> &BillingSettings {
        &self.settings
    }

    /// Replace the account settings used for pricing later vouchers
    pub fn set_settings(&mut self, settings: BillingSettings) {
        self.settings = settings;
    }

    // Customer operations
    /// Open a customer ledger
    pub async fn create_customer(&mut self, customer: Customer) -> LedgerResult<Customer> {
        self.customer_manager.create_customer(customer).await
    }

    /// Get a customer by ID
    pub async fn get_customer(&self, customer_id: &str) -> LedgerResult<Option<Customer>> {
        self.customer_manager.get_customer(customer_id).await
    }

    /// List all customers
    pub async fn list_customers(&self) -> LedgerResult<Vec<Customer>> {
        self.customer_manager.list_customers().await
    }

    /// Update a customer's details
    pub async fn update_customer(&mut self, customer: &Customer) -> LedgerResult<()> {
        self.customer_manager.update_customer(customer).await
    }

    /// Delete a customer without vouchers
    pub async fn delete_customer(&mut self, customer_id: &str) -> LedgerResult<()> {
        self.customer_manager.delete_customer(customer_id).await
    }

    /// Live balances of a customer
    pub async fn get_balances(&self, customer_id: &str) -> LedgerResult<LedgerBalances> {
        self.customer_manager.get_balances(customer_id).await
    }

    /// Balances as of a date, replayed from the voucher history
    pub async fn get_balances_as_of(
        &self,
        customer_id: &str,
        as_of_date: NaiveDate,
    ) -> LedgerResult<LedgerBalances> {
        self.customer_manager
            .get_balances_as_of(customer_id, as_of_date)
            .await
    }

    // Voucher operations
    /// Price and snapshot a draft without saving it
    pub async fn preview_voucher(&self, draft: VoucherDraft) -> LedgerResult<Voucher> {
        self.voucher_manager
            .preview_voucher(draft, &self.settings)
            .await
    }

    /// Record a voucher and update the customer's balances
    pub async fn record_voucher(&mut self, draft: VoucherDraft) -> LedgerResult<Voucher> {
        self.voucher_manager
            .record_voucher(draft, &self.settings)
            .await
    }

    /// Get a voucher by ID
    pub async fn get_voucher(&self, voucher_id: &str) -> LedgerResult<Option<Voucher>> {
        self.voucher_manager.get_voucher(voucher_id).await
    }

    /// Get vouchers for a specific customer, oldest first
    pub async fn get_customer_vouchers(
        &self,
        customer_id: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> LedgerResult<Vec<Voucher>> {
        self.voucher_manager
            .get_customer_vouchers(customer_id, start_date, end_date)
            .await
    }

    /// Get all vouchers within a date range
    pub async fn get_vouchers(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> LedgerResult<Vec<Voucher>> {
        self.voucher_manager
            .get_vouchers(start_date, end_date)
            .await
    }

    /// Delete a voucher, reversing its effect on the live balances
    pub async fn delete_voucher(&mut self, voucher_id: &str) -> LedgerResult<()> {
        self.voucher_manager.delete_voucher(voucher_id).await
    }

    /// Compare every frozen snapshot of a customer against a replay of the history
    pub async fn audit_snapshots(&self, customer_id: &str) -> LedgerResult<SnapshotAuditReport> {
        let customer = self
            .customer_manager
            .get_customer_required(customer_id)
            .await?;
        let vouchers = self
            .voucher_manager
            .get_customer_vouchers(customer_id, None, None)
            .await?;

        audit_snapshots(&customer, &vouchers)
    }
}
