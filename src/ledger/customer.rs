//! Customer ledger management

use chrono::NaiveDate;
use tracing::info;

use crate::traits::*;
use crate::types::*;

/// Customer manager for opening, updating and closing customer ledgers
pub struct CustomerManager<S: LedgerStorage> {
    pub(crate) storage: S,
    validator: Box<dyn CustomerValidator>,
}

impl<S: LedgerStorage> CustomerManager<S> {
    /// Create a new customer manager
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            validator: Box::new(DefaultCustomerValidator),
        }
    }

    /// Create a new customer manager with custom validator
    pub fn with_validator(storage: S, validator: Box<dyn CustomerValidator>) -> Self {
        Self { storage, validator }
    }

    /// Open a ledger for a new customer
    pub async fn create_customer(&mut self, customer: Customer) -> LedgerResult<Customer> {
        self.validator.validate_customer(&customer)?;

        if self.storage.get_customer(&customer.id).await?.is_some() {
            return Err(LedgerError::Validation(format!(
                "Customer with ID '{}' already exists",
                customer.id
            )));
        }

        self.storage.save_customer(&customer).await?;

        info!(customer_id = %customer.id, "Opened customer ledger");
        Ok(customer)
    }

    /// Get a customer by ID
    pub async fn get_customer(&self, customer_id: &str) -> LedgerResult<Option<Customer>> {
        self.storage.get_customer(customer_id).await
    }

    /// Get a customer by ID, returning an error if not found
    pub async fn get_customer_required(&self, customer_id: &str) -> LedgerResult<Customer> {
        self.storage
            .get_customer(customer_id)
            .await?
            .ok_or_else(|| LedgerError::CustomerNotFound(customer_id.to_string()))
    }

    /// List all customers
    pub async fn list_customers(&self) -> LedgerResult<Vec<Customer>> {
        self.storage.list_customers().await
    }

    /// Update a customer's details. Balances are owned by voucher posting and are kept as stored.
    pub async fn update_customer(&mut self, customer: &Customer) -> LedgerResult<()> {
        self.validator.validate_customer(customer)?;

        let existing = self.get_customer_required(&customer.id).await?;

        let mut updated = customer.clone();
        updated.balances = existing.balances;
        updated.opening_balances = existing.opening_balances;
        updated.created_at = existing.created_at;
        updated.updated_at = chrono::Utc::now().naive_utc();

        self.storage.update_customer(&updated).await
    }

    /// Delete a customer that has no vouchers
    pub async fn delete_customer(&mut self, customer_id: &str) -> LedgerResult<()> {
        self.get_customer_required(customer_id).await?;

        let voucher_count = self
            .storage
            .get_customer_vouchers(customer_id, None, None)
            .await?
            .len();
        self.validator
            .validate_customer_deletion(customer_id, voucher_count)?;

        self.storage.delete_customer(customer_id).await?;

        info!(customer_id = %customer_id, "Closed customer ledger");
        Ok(())
    }

    /// Live balances of a customer; unknown customers are an error, never zero
    pub async fn get_balances(&self, customer_id: &str) -> LedgerResult<LedgerBalances> {
        self.storage
            .get_balances(customer_id)
            .await?
            .ok_or_else(|| LedgerError::CustomerNotFound(customer_id.to_string()))
    }

    /// Balances as of the end of a date, replayed from the opening balances
    pub async fn get_balances_as_of(
        &self,
        customer_id: &str,
        as_of_date: NaiveDate,
    ) -> LedgerResult<LedgerBalances> {
        let customer = self.get_customer_required(customer_id).await?;
        let vouchers = self
            .storage
            .get_customer_vouchers(customer_id, None, Some(as_of_date))
            .await?;

        Ok(vouchers
            .iter()
            .fold(customer.opening_balances, |running, voucher| {
                running.apply(&voucher.balance_effect)
            }))
    }
}
