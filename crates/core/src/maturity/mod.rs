//! Maturity module - remaining days, holidays in window and roll flags.

mod maturity_calculator;
mod maturity_model;
mod maturity_traits;


pub use maturity_calculator::{derive_fact, MaturityCalculator};
pub use maturity_model::{MaturityFact, MaturityRun};
pub use maturity_traits::{MaturityCalculatorTrait, MaturityRepositoryTrait};
