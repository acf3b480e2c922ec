//! Ledger module: customer ledgers, voucher processing and balance snapshots

pub mod core;
pub mod customer;
pub mod snapshot;
pub mod voucher;

pub use self::core::*;
pub use customer::*;
pub use snapshot::*;
pub use voucher::*;
