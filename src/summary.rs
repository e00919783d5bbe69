//! Read-only aggregations over attendance, leave and payslips.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    entity::{attendance, leave_request, payslip, sea_orm_active_enums::{AttendanceStatus, LeaveStatus, PayslipStatus, RoleType, UserStatus}, user},
    period::Period,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayKind {
    Present,
    Leave,
    Absent,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MonthlySummary {
    pub present: u32,
    pub absent: u32,
    pub leave: u32,
    /// Business days in the month
    pub total: u32,
}

fn covers(leave: &leave_request::Model, day: NaiveDate) -> bool {
    leave.status == LeaveStatus::Approved && leave.start_date <= day && day <= leave.end_date
}

/// A recorded day wins over leave, leave wins over nothing
pub fn classify_day(day: NaiveDate, records: &[attendance::Model], leaves: &[leave_request::Model]) -> DayKind {
    if records.iter().any(|r| r.date == day && r.status != AttendanceStatus::Absent) {
        DayKind::Present
    } else if leaves.iter().any(|l| covers(l, day)) {
        DayKind::Leave
    } else {
        DayKind::Absent
    }
}

/// Classifies every business day of `period`, so `total == present + absent + leave`
pub fn monthly_summary(period: &Period, records: &[attendance::Model], leaves: &[leave_request::Model]) -> MonthlySummary {
    let mut summary = MonthlySummary::default();

    for day in period.business_days() {
        match classify_day(day, records, leaves) {
            DayKind::Present => summary.present += 1,
            DayKind::Leave => summary.leave += 1,
            DayKind::Absent => summary.absent += 1,
        }
        summary.total += 1;
    }

    summary
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LeaveCounts {
    pub pending: u32,
    pub approved: u32,
    pub rejected: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PayrollTotals {
    pub count: u32,
    pub total_net: i64,
    pub pending_net: i64,
    pub approved_net: i64,
    pub paid_net: i64,
    pub average_net: i64,
}

impl PayrollTotals {
    pub fn from_payslips(payslips: &[payslip::Model]) -> Self {
        let mut totals = Self::default();

        for payslip in payslips {
            totals.count += 1;
            totals.total_net = totals.total_net.saturating_add(payslip.net_salary);

            let bucket = match payslip.status {
                PayslipStatus::Pending => &mut totals.pending_net,
                PayslipStatus::Approved => &mut totals.approved_net,
                PayslipStatus::Paid => &mut totals.paid_net,
                PayslipStatus::Rejected => continue,
            };
            *bucket = bucket.saturating_add(payslip.net_salary);
        }

        if totals.count > 0 {
            totals.average_net = totals.total_net / totals.count as i64;
        }

        totals
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub date: NaiveDate,
    pub total_employees: u32,
    pub present_today: u32,
    pub late_today: u32,
    pub absent_today: u32,
    pub on_leave_today: u32,
    /// Share of employees present on `date`, between 0 and 1
    pub attendance_rate: f64,
    pub leave_requests: LeaveCounts,
    /// Only when a period was asked for
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payroll: Option<PayrollTotals>,
}

/// Days a report looks at: the whole period when one is given, otherwise `date` alone
pub fn report_window(date: NaiveDate, period: Option<&Period>) -> (NaiveDate, NaiveDate) {
    period.map_or((date, date), |p| (p.first_day(), p.last_day()))
}

/// Dashboard figures for one organization.
///
/// Only active employees among `employees` are counted; rows and leave of anyone
/// else are ignored. `leave_requests` counts the requests overlapping the report window.
pub fn overview(
    date: NaiveDate,
    period: Option<&Period>,
    employees: &[user::Model],
    records_today: &[attendance::Model],
    leaves: &[leave_request::Model],
    payslips: Option<&[payslip::Model]>,
) -> Overview {
    let active: HashSet<Uuid> = employees.iter()
        .filter(|e| e.role == RoleType::Employee && e.status == UserStatus::Active)
        .map(|e| e.id)
        .collect();
    let total_employees = active.len() as u32;

    let attending: Vec<&attendance::Model> = records_today.iter()
        .filter(|r| r.date == date && active.contains(&r.user_id) && r.status != AttendanceStatus::Absent)
        .collect();

    let present_today = attending.iter()
        .map(|r| r.user_id)
        .collect::<HashSet<_>>()
        .len() as u32;
    let late_today = attending.iter()
        .filter(|r| r.status == AttendanceStatus::Late)
        .count() as u32;

    let on_leave_today = leaves.iter()
        .filter(|l| covers(l, date) && active.contains(&l.user_id))
        .filter(|l| !attending.iter().any(|r| r.user_id == l.user_id))
        .map(|l| l.user_id)
        .collect::<HashSet<_>>()
        .len() as u32;

    let (from, to) = report_window(date, period);
    let mut leave_requests = LeaveCounts::default();
    for leave in leaves.iter().filter(|l| l.start_date <= to && from <= l.end_date) {
        match leave.status {
            LeaveStatus::Pending => leave_requests.pending += 1,
            LeaveStatus::Approved => leave_requests.approved += 1,
            LeaveStatus::Rejected => leave_requests.rejected += 1,
        }
    }

    let attendance_rate = if total_employees == 0 {
        0.0
    } else {
        present_today as f64 / total_employees as f64
    };

    Overview {
        date,
        total_employees,
        present_today,
        late_today,
        absent_today: total_employees.saturating_sub(present_today + on_leave_today),
        on_leave_today,
        attendance_rate,
        leave_requests,
        payroll: payslips.map(PayrollTotals::from_payslips),
    }
}
