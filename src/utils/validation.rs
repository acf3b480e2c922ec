//! Validation utilities

use bigdecimal::BigDecimal;

use crate::ledger::voucher::PricedVoucher;
use crate::tax::gst::is_valid_gstin;
use crate::traits::*;
use crate::types::*;

/// Validate that an amount is not negative
pub fn validate_non_negative(field: &str, amount: &BigDecimal) -> LedgerResult<()> {
    if *amount < BigDecimal::from(0) {
        Err(LedgerError::Validation(format!("{} cannot be negative", field)))
    } else {
        Ok(())
    }
}

/// Validate that a customer ID is valid
pub fn validate_customer_id(customer_id: &str) -> LedgerResult<()> {
    if customer_id.trim().is_empty() {
        return Err(LedgerError::Validation("Customer ID cannot be empty".to_string()));
    }

    if customer_id.len() > 50 {
        return Err(LedgerError::Validation("Customer ID cannot exceed 50 characters".to_string()));
    }

    if !customer_id
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(LedgerError::Validation(
            "Customer ID can only contain alphanumeric characters, dashes, and underscores"
                .to_string(),
        ));
    }

    Ok(())
}

/// Validate that a customer name is valid
pub fn validate_customer_name(name: &str) -> LedgerResult<()> {
    if name.trim().is_empty() {
        return Err(LedgerError::Validation("Customer name cannot be empty".to_string()));
    }

    if name.len() > 100 {
        return Err(LedgerError::Validation(
            "Customer name cannot exceed 100 characters".to_string(),
        ));
    }

    Ok(())
}

/// Validate a two-digit GST state code
pub fn validate_state_code(state_code: &str) -> LedgerResult<()> {
    if state_code.len() != 2 || !state_code.chars().all(|c| c.is_ascii_digit()) {
        return Err(LedgerError::Validation(format!(
            "State code must be two digits, got '{}'",
            state_code
        )));
    }
    Ok(())
}

/// Validate a voucher narration
pub fn validate_narration(narration: &str) -> LedgerResult<()> {
    if narration.len() > 500 {
        return Err(LedgerError::Validation("Narration cannot exceed 500 characters".to_string()));
    }
    Ok(())
}

/// Enhanced voucher validator with detailed checks
pub struct EnhancedVoucherValidator;

impl VoucherValidator for EnhancedVoucherValidator {
    fn validate_voucher(&self, voucher: &PricedVoucher) -> LedgerResult<()> {
        // Structural rules
        voucher.validate()?;

        validate_customer_id(&voucher.customer_id)?;
        if let Some(narration) = &voucher.narration {
            validate_narration(narration)?;
        }

        if let Some(delta) = &voucher.settlement {
            validate_non_negative("Settlement amount", delta.value())?;
        }

        validate_non_negative("Cash received", &voucher.cash_received)?;
        validate_non_negative("Stone amount", &voucher.stone_amount)?;

        for item in &voucher.items {
            validate_non_negative("Gross weight", &item.gross_weight)?;
            validate_non_negative("Less weight", &item.less_weight)?;
            validate_non_negative("Wastage", &item.wastage_grams)?;
            if item.melting_percent < BigDecimal::from(0)
                || item.melting_percent > BigDecimal::from(100)
            {
                return Err(LedgerError::Validation(format!(
                    "Melting percent must be between 0 and 100, got {}",
                    item.melting_percent
                )));
            }
            if item.less_weight > item.gross_weight {
                return Err(LedgerError::Validation(format!(
                    "Less weight {} exceeds gross weight {}",
                    item.less_weight, item.gross_weight
                )));
            }
        }

        Ok(())
    }
}

/// Enhanced customer validator with detailed checks
pub struct EnhancedCustomerValidator;

impl CustomerValidator for EnhancedCustomerValidator {
    fn validate_customer(&self, customer: &Customer) -> LedgerResult<()> {
        validate_customer_id(&customer.id)?;
        validate_customer_name(&customer.name)?;

        if let Some(gstin) = &customer.gstin {
            if !is_valid_gstin(gstin) {
                return Err(LedgerError::Validation(format!("Invalid GSTIN '{}'", gstin)));
            }
        }

        if let Some(state_code) = &customer.state_code {
            validate_state_code(state_code)?;
        }

        Ok(())
    }

    fn validate_customer_deletion(
        &self,
        customer_id: &str,
        voucher_count: usize,
    ) -> LedgerResult<()> {
        DefaultCustomerValidator.validate_customer_deletion(customer_id, voucher_count)
    }
}
