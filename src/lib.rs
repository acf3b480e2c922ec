//! # Jewellery Ledger Core
//!
//! Billing and bookkeeping engine for jewellery retailers, tracking every customer
//! in two parallel currencies: money (₹) and fine weight of gold and silver.
//!
//! ## Features
//!
//! - **Weight calculation**: gross/less weight, melting percent and wastage into net and fine weight
//! - **Item pricing**: fine weight at the metal rate plus flat or per-gram labour
//! - **Invoice totals**: summed weights and amounts with policy-applied labour
//! - **GST**: CGST/SGST vs IGST selection from state codes, GSTIN validation
//! - **Balance snapshots**: frozen before/after balances for cash bills, credit bills and settlements
//! - **Snapshot audit**: replay a customer's history and report drifted snapshots
//! - **Storage abstraction**: database-agnostic design with trait-based storage
//!
//! ## Quick Start
//!
//! ```rust
//! use jewellery_ledger_core::{compute_weights, compute_gst, TaxType};
//! use bigdecimal::BigDecimal;
//! use std::str::FromStr;
//!
//! let d = |s: &str| BigDecimal::from_str(s).unwrap();
//! let weights = compute_weights(&d("10"), &d("0.5"), &d("91.6"), &d("0.2"));
//! assert_eq!(weights.fine_weight, d("8.902"));
//!
//! let gst = compute_gst(&d("10000"), &d("3"), TaxType::CgstSgst);
//! assert_eq!(gst.total, d("10300"));
//! ```

pub mod billing;
pub mod config;
pub mod ledger;
pub mod reconciliation;
pub mod tax;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use billing::*;
pub use config::*;
pub use ledger::*;
pub use reconciliation::*;
pub use tax::gst::*;
pub use traits::*;
pub use types::*;
