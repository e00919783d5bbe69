use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    entity::{attendance, leave_request, sea_orm_active_enums::{AttendanceStatus, PayBasis}, user},
    period::Period,
    summary,
    utils,
};

use super::{Rate, RatePolicy};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayItem {
    pub name: String,
    pub amount: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(transparent)]
pub struct PayItems(pub Vec<PayItem>);

impl PayItems {
    pub fn total(&self) -> Option<i64> {
        self.0.iter().try_fold(0i64, |total, item| total.checked_add(item.amount))
    }
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("pay of employee {employee_id} exceeds the supported amount")]
pub struct PayOverflow {
    pub employee_id: Uuid,
}

/// Attendance figures a payslip was computed from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct AttendanceSnapshot {
    pub present: u32,
    pub absent: u32,
    pub late: u32,
    pub half_day: u32,
    pub leave: u32,
    pub business_days: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayComponents {
    pub pay_basis: PayBasis,
    pub rate: i64,
    pub days_worked: u32,
    pub basic_salary: i64,
    pub allowances: PayItems,
    pub deductions: PayItems,
    pub gross_salary: i64,
    pub net_salary: i64,
}

pub fn gross_salary(basic_salary: i64, allowances: &PayItems) -> Option<i64> {
    basic_salary.checked_add(allowances.total()?)
}

pub fn net_salary(basic_salary: i64, allowances: &PayItems, deductions: &PayItems) -> Option<i64> {
    gross_salary(basic_salary, allowances)?.checked_sub(deductions.total()?)
}

/// Minutes between check-in and check-out over every completed day
fn worked_minutes(records: &[attendance::Model]) -> i64 {
    records.iter()
        .filter_map(|r| Some((r.check_out_at? - r.check_in_at?).num_minutes()))
        .filter(|minutes| *minutes > 0)
        .sum()
}

fn pay_items<'a>(lines: impl Iterator<Item = (&'a str, Rate)>, basic_salary: i64) -> Option<PayItems> {
    let mut items = Vec::new();

    for (name, rate) in lines {
        let amount = rate.amount_of(basic_salary)?;
        if amount != 0 {
            items.push(PayItem { name: name.to_owned(), amount });
        }
    }

    Some(PayItems(items))
}

/// Pay for one employee over the attendance rows of one period.
///
/// Deterministic: identical inputs always yield identical components.
pub fn compute_payroll(employee: &user::Model, records: &[attendance::Model], policy: &RatePolicy) -> Result<PayComponents, PayOverflow> {
    let overflow = PayOverflow { employee_id: employee.id };

    let days_worked = records.iter()
        .filter(|r| r.status == AttendanceStatus::Present)
        .count() as u32;

    let basic_salary = match employee.pay_basis {
        PayBasis::Daily => (days_worked as i64).checked_mul(employee.base_rate),
        PayBasis::Hourly => employee.base_rate.checked_mul(worked_minutes(records)).map(|pay| pay / 60),
        PayBasis::Monthly => Some(employee.base_rate),
    }.ok_or(overflow)?;

    let allowances = pay_items(policy.allowances(), basic_salary).ok_or(overflow)?;
    let deductions = pay_items(policy.deductions(), basic_salary).ok_or(overflow)?;

    Ok(PayComponents {
        pay_basis: employee.pay_basis,
        rate: employee.base_rate,
        days_worked,
        basic_salary,
        gross_salary: gross_salary(basic_salary, &allowances).ok_or(overflow)?,
        net_salary: net_salary(basic_salary, &allowances, &deductions).ok_or(overflow)?,
        allowances,
        deductions,
    })
}

pub fn attendance_snapshot(
    period: &Period,
    records: &[attendance::Model],
    leaves: &[leave_request::Model],
) -> AttendanceSnapshot {
    let count = |status: AttendanceStatus| records.iter()
        .filter(|r| r.status == status && period.contains(r.date) && utils::is_business_day(r.date))
        .count() as u32;
    let summary = summary::monthly_summary(period, records, leaves);

    AttendanceSnapshot {
        present: count(AttendanceStatus::Present),
        late: count(AttendanceStatus::Late),
        half_day: count(AttendanceStatus::HalfDay),
        absent: summary.absent,
        leave: summary.leave,
        business_days: summary.total,
    }
}
