//! In-memory storage implementation for testing

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::traits::*;
use crate::types::*;

#[derive(Debug, Default)]
struct Tables {
    customers: HashMap<String, Customer>,
    vouchers: HashMap<String, Voucher>,
}

/// In-memory storage implementation for testing and development.
///
/// Customers and vouchers share one lock so a voucher and the balances it
/// produced are always written together.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStorage {
    /// Create a new memory storage instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) -> LedgerResult<()> {
        let mut tables = self.write()?;
        tables.customers.clear();
        tables.vouchers.clear();
        Ok(())
    }

    fn read(&self) -> LedgerResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| LedgerError::Storage("memory storage lock poisoned".to_string()))
    }

    fn write(&self) -> LedgerResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| LedgerError::Storage("memory storage lock poisoned".to_string()))
    }
}

fn in_range(date: NaiveDate, start_date: Option<NaiveDate>, end_date: Option<NaiveDate>) -> bool {
    if let Some(start) = start_date {
        if date < start {
            return false;
        }
    }
    if let Some(end) = end_date {
        if date > end {
            return false;
        }
    }
    true
}

fn sorted(mut vouchers: Vec<Voucher>) -> Vec<Voucher> {
    vouchers.sort_by_key(|v| (v.date, v.created_at));
    vouchers
}

#[async_trait]
impl LedgerStorage for MemoryStorage {
    async fn save_customer(&mut self, customer: &Customer) -> LedgerResult<()> {
        self.write()?
            .customers
            .insert(customer.id.clone(), customer.clone());
        Ok(())
    }

    async fn get_customer(&self, customer_id: &str) -> LedgerResult<Option<Customer>> {
        Ok(self.read()?.customers.get(customer_id).cloned())
    }

    async fn list_customers(&self) -> LedgerResult<Vec<Customer>> {
        let mut customers: Vec<Customer> = self.read()?.customers.values().cloned().collect();
        customers.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(customers)
    }

    async fn update_customer(&mut self, customer: &Customer) -> LedgerResult<()> {
        let mut tables = self.write()?;
        match tables.customers.get_mut(&customer.id) {
            Some(existing) => {
                *existing = customer.clone();
                Ok(())
            }
            None => Err(LedgerError::CustomerNotFound(customer.id.clone())),
        }
    }

    async fn delete_customer(&mut self, customer_id: &str) -> LedgerResult<()> {
        if self.write()?.customers.remove(customer_id).is_some() {
            Ok(())
        } else {
            Err(LedgerError::CustomerNotFound(customer_id.to_string()))
        }
    }

    async fn commit_voucher(
        &mut self,
        voucher: &Voucher,
        balances_after: &LedgerBalances,
    ) -> LedgerResult<()> {
        let mut tables = self.write()?;
        if tables.vouchers.contains_key(&voucher.id) {
            return Err(LedgerError::Storage(format!(
                "Voucher '{}' already exists",
                voucher.id
            )));
        }
        let customer = tables
            .customers
            .get_mut(&voucher.customer_id)
            .ok_or_else(|| LedgerError::CustomerNotFound(voucher.customer_id.clone()))?;
        customer.set_balances(balances_after.clone());
        tables.vouchers.insert(voucher.id.clone(), voucher.clone());
        Ok(())
    }

    async fn get_voucher(&self, voucher_id: &str) -> LedgerResult<Option<Voucher>> {
        Ok(self.read()?.vouchers.get(voucher_id).cloned())
    }

    async fn get_customer_vouchers(
        &self,
        customer_id: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> LedgerResult<Vec<Voucher>> {
        let filtered = self
            .read()?
            .vouchers
            .values()
            .filter(|v| v.customer_id == customer_id && in_range(v.date, start_date, end_date))
            .cloned()
            .collect();
        Ok(sorted(filtered))
    }

    async fn get_vouchers(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> LedgerResult<Vec<Voucher>> {
        let filtered = self
            .read()?
            .vouchers
            .values()
            .filter(|v| in_range(v.date, start_date, end_date))
            .cloned()
            .collect();
        Ok(sorted(filtered))
    }

    async fn retract_voucher(
        &mut self,
        voucher_id: &str,
        balances_after: &LedgerBalances,
    ) -> LedgerResult<()> {
        let mut tables = self.write()?;
        let customer_id = tables
            .vouchers
            .get(voucher_id)
            .map(|v| v.customer_id.clone())
            .ok_or_else(|| LedgerError::VoucherNotFound(voucher_id.to_string()))?;
        let customer = tables
            .customers
            .get_mut(&customer_id)
            .ok_or_else(|| LedgerError::CustomerNotFound(customer_id.clone()))?;
        customer.set_balances(balances_after.clone());
        tables.vouchers.remove(voucher_id);
        Ok(())
    }
}
