//! Payroll calculation and the payslip lifecycle.

mod calculator;
mod lifecycle;
mod policy;

pub use calculator::*;
pub use lifecycle::*;
pub use policy::*;
