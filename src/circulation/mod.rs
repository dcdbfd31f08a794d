//! Loan bookkeeping

pub mod ledger;

pub use ledger::{CirculationLedger, IssuePlan, ReturnPlan};
