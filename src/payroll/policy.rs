use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

use crate::consts::BASIS_POINTS_SCALE;

/// A pay line expressed relative to basic salary or as a flat amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rate {
    /// 1000 = 10% of basic salary
    BasisPoints(u32),
    /// Minor currency units
    Fixed(i64),
}

impl Default for Rate {
    fn default() -> Self {
        Rate::Fixed(0)
    }
}

impl Rate {
    /// `None` when the amount does not fit in minor units
    pub fn amount_of(&self, basic_salary: i64) -> Option<i64> {
        match *self {
            Rate::BasisPoints(points) => basic_salary.checked_mul(points as i64).map(|scaled| scaled / BASIS_POINTS_SCALE),
            Rate::Fixed(amount) => Some(amount),
        }
    }

    fn validate(&self, name: &str) -> Result<(), String> {
        match *self {
            Rate::BasisPoints(points) if points as i64 > BASIS_POINTS_SCALE =>
                Err(format!("`{name}` cannot exceed {BASIS_POINTS_SCALE} basis points")),
            Rate::Fixed(amount) if amount < 0 =>
                Err(format!("`{name}` cannot be negative")),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRate {
    pub name: String,
    pub rate: Rate,
}

/// Allowance and deduction rules of one organization.
///
/// Stored on the organization and handed to the calculator as is, so every
/// number a payslip contains can be traced back to this document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(default)]
pub struct RatePolicy {
    pub housing_allowance: Rate,
    pub transport_allowance: Rate,
    pub tax: Rate,
    pub provident_fund: Rate,
    pub extra_allowances: Vec<NamedRate>,
    pub extra_deductions: Vec<NamedRate>,
}

impl RatePolicy {
    pub fn allowances(&self) -> impl Iterator<Item = (&str, Rate)> {
        let standard: [(&str, Rate); 2] = [("housing", self.housing_allowance), ("transport", self.transport_allowance)];

        standard.into_iter()
            .chain(self.extra_allowances.iter().map(|r| (r.name.as_str(), r.rate)))
    }

    pub fn deductions(&self) -> impl Iterator<Item = (&str, Rate)> {
        let standard: [(&str, Rate); 2] = [("tax", self.tax), ("provident_fund", self.provident_fund)];

        standard.into_iter()
            .chain(self.extra_deductions.iter().map(|r| (r.name.as_str(), r.rate)))
    }

    pub fn validate(&self) -> Result<(), String> {
        for (name, rate) in self.allowances().chain(self.deductions()) {
            if name.trim().is_empty() {
                return Err("pay line names cannot be blank".to_owned());
            }
            rate.validate(name)?;
        }

        Ok(())
    }
}
