//! Traits for storage abstraction and extensibility

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::ledger::voucher::PricedVoucher;
use crate::types::*;

/// Storage abstraction for customer ledgers and vouchers
///
/// This trait allows the billing core to work with any storage backend
/// (PostgreSQL, SQLite, a remote API, in-memory, etc.) by implementing these methods.
///
/// Callers must not run two balance-mutating operations against the same customer
/// at once: `commit_voucher` and `retract_voucher` write balances that were derived
/// from a read made earlier in the same operation.
#[async_trait]
pub trait LedgerStorage: Send + Sync {
    /// Save a new customer to storage
    async fn save_customer(&mut self, customer: &Customer) -> LedgerResult<()>;

    /// Get a customer by ID
    async fn get_customer(&self, customer_id: &str) -> LedgerResult<Option<Customer>>;

    /// List all customers
    async fn list_customers(&self) -> LedgerResult<Vec<Customer>>;

    /// Update a customer's details
    async fn update_customer(&mut self, customer: &Customer) -> LedgerResult<()>;

    /// Delete a customer
    async fn delete_customer(&mut self, customer_id: &str) -> LedgerResult<()>;

    /// Current live balances of a customer, `None` if the customer is unknown
    async fn get_balances(&self, customer_id: &str) -> LedgerResult<Option<LedgerBalances>> {
        Ok(self.get_customer(customer_id).await?.map(|c| c.balances))
    }

    /// Persist a new voucher and the customer's updated balances as one unit
    async fn commit_voucher(
        &mut self,
        voucher: &Voucher,
        balances_after: &LedgerBalances,
    ) -> LedgerResult<()>;

    /// Get a voucher by ID
    async fn get_voucher(&self, voucher_id: &str) -> LedgerResult<Option<Voucher>>;

    /// Vouchers of one customer, oldest first
    async fn get_customer_vouchers(
        &self,
        customer_id: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> LedgerResult<Vec<Voucher>>;

    /// All vouchers within a date range, oldest first
    async fn get_vouchers(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> LedgerResult<Vec<Voucher>>;

    /// Remove a voucher and store the customer's balances with its effect reverted, as one unit
    async fn retract_voucher(
        &mut self,
        voucher_id: &str,
        balances_after: &LedgerBalances,
    ) -> LedgerResult<()>;
}

/// Trait for implementing custom customer validation rules
pub trait CustomerValidator: Send + Sync {
    /// Validate a customer before saving
    fn validate_customer(&self, customer: &Customer) -> LedgerResult<()>;

    /// Validate customer deletion given how many vouchers still reference it
    fn validate_customer_deletion(&self, customer_id: &str, voucher_count: usize)
        -> LedgerResult<()>;
}

/// Trait for implementing custom voucher validation rules
pub trait VoucherValidator: Send + Sync {
    /// Validate a priced voucher before it is snapshotted and saved
    fn validate_voucher(&self, voucher: &PricedVoucher) -> LedgerResult<()>;
}

/// Default customer validator with basic rules
pub struct DefaultCustomerValidator;

impl CustomerValidator for DefaultCustomerValidator {
    fn validate_customer(&self, customer: &Customer) -> LedgerResult<()> {
        if customer.id.trim().is_empty() {
            return Err(LedgerError::Validation("Customer ID cannot be empty".to_string()));
        }

        if customer.name.trim().is_empty() {
            return Err(LedgerError::Validation("Customer name cannot be empty".to_string()));
        }

        Ok(())
    }

    fn validate_customer_deletion(
        &self,
        customer_id: &str,
        voucher_count: usize,
    ) -> LedgerResult<()> {
        if voucher_count > 0 {
            return Err(LedgerError::Validation(format!(
                "Customer '{}' still has {} voucher(s)",
                customer_id, voucher_count
            )));
        }
        Ok(())
    }
}

/// Default voucher validator: item rules per payment type and GST readiness
pub struct DefaultVoucherValidator;

impl VoucherValidator for DefaultVoucherValidator {
    fn validate_voucher(&self, voucher: &PricedVoucher) -> LedgerResult<()> {
        voucher.validate()
    }
}
