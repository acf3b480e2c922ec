//! Billing calculators: weights, item amounts and invoice totals

pub mod amount;
pub mod item;
pub mod totals;
pub mod weight;

pub use amount::*;
pub use item::*;
pub use totals::*;
pub use weight::*;
