use chrono::Utc;
use sea_orm::{ActiveEnum as _, ActiveValue::{Set, Unchanged}, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    entity::{attendance, leave_request, organization, payslip, prelude::*, sea_orm_active_enums::{LeaveStatus, PayslipStatus}, user},
    error::{is_unique_violation, ApiError, Conflict},
    notify::{self, Notifier, PayslipEvent, PayslipEventKind},
    period::Period,
};

use super::{attendance_snapshot, compute_payroll, gross_salary, net_salary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PayslipAction {
    Approve,
    Reject,
    MarkPaid,
    Void,
}

impl PayslipAction {
    fn verb(&self) -> &'static str {
        match self {
            PayslipAction::Approve => "approve",
            PayslipAction::Reject => "reject",
            PayslipAction::MarkPaid => "mark as paid",
            PayslipAction::Void => "void",
        }
    }
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("cannot {} a payslip that is {}", .action.verb(), .from.to_value())]
pub struct InvalidTransition {
    pub from: PayslipStatus,
    pub action: PayslipAction,
}

/// `pending → approved → paid` and `pending → rejected`; `paid` and `rejected` are terminal
pub fn next_status(from: PayslipStatus, action: PayslipAction) -> Result<PayslipStatus, InvalidTransition> {
    match (from, action) {
        (PayslipStatus::Pending, PayslipAction::Approve) => Ok(PayslipStatus::Approved),
        (PayslipStatus::Pending, PayslipAction::Reject) => Ok(PayslipStatus::Rejected),
        (PayslipStatus::Approved, PayslipAction::MarkPaid) => Ok(PayslipStatus::Paid),
        _ => Err(InvalidTransition { from, action }),
    }
}

/// Only payslips that never took effect may be removed to redo a period
pub fn ensure_voidable(status: PayslipStatus) -> Result<(), InvalidTransition> {
    match status {
        PayslipStatus::Pending | PayslipStatus::Rejected => Ok(()),
        from => Err(InvalidTransition { from, action: PayslipAction::Void }),
    }
}

/// Re-derives gross and net from the stored pay lines
pub fn with_recomputed_totals(mut payslip: payslip::Model) -> payslip::Model {
    let (Some(gross), Some(net)) = (
        gross_salary(payslip.basic_salary, &payslip.allowances),
        net_salary(payslip.basic_salary, &payslip.allowances, &payslip.deductions),
    ) else {
        warn!(payslip_id = %payslip.id, "stored pay lines overflow, keeping stored totals");
        return payslip;
    };

    if gross != payslip.gross_salary || net != payslip.net_salary {
        warn!(
            payslip_id = %payslip.id,
            stored_net = payslip.net_salary,
            net,
            "stored payslip totals disagree with its pay lines"
        );
    }

    payslip.gross_salary = gross;
    payslip.net_salary = net;
    payslip
}

/// Computes and stores the payslip of one employee for one period.
///
/// Fails with [`Conflict::DuplicatePeriod`] when one already exists, whether found up
/// front or rejected by the unique index on insert.
pub async fn generate<C: ConnectionTrait>(
    db: &C,
    notifier: &dyn Notifier,
    organization: &organization::Model,
    employee: &user::Model,
    period: Period,
    generated_by: Uuid,
) -> Result<payslip::Model, ApiError> {
    let month = period.month as i16;

    let existing = Payslip::find()
        .filter(payslip::Column::EmployeeId.eq(employee.id))
        .filter(payslip::Column::Month.eq(month))
        .filter(payslip::Column::Year.eq(period.year))
        .one(db).await?;

    if existing.is_some() {
        return Err(Conflict::DuplicatePeriod.into());
    }

    let records = Attendance::find()
        .filter(attendance::Column::UserId.eq(employee.id))
        .filter(attendance::Column::Date.between(period.first_day(), period.last_day()))
        .all(db).await?;

    let leaves = LeaveRequest::find()
        .filter(leave_request::Column::UserId.eq(employee.id))
        .filter(leave_request::Column::Status.eq(LeaveStatus::Approved))
        .filter(leave_request::Column::StartDate.lte(period.last_day()))
        .filter(leave_request::Column::EndDate.gte(period.first_day()))
        .all(db).await?;

    let components = compute_payroll(employee, &records, &organization.rate_policy)?;
    let snapshot = attendance_snapshot(&period, &records, &leaves);
    let now = Utc::now().fixed_offset();

    let model = payslip::ActiveModel {
        created_at: Set(now),
        updated_at: Set(now),
        employee_id: Set(employee.id),
        organization_id: Set(organization.id),
        month: Set(month),
        year: Set(period.year),
        pay_basis: Set(components.pay_basis),
        rate: Set(components.rate),
        days_worked: Set(components.days_worked as i32),
        basic_salary: Set(components.basic_salary),
        allowances: Set(components.allowances),
        deductions: Set(components.deductions),
        gross_salary: Set(components.gross_salary),
        net_salary: Set(components.net_salary),
        attendance: Set(snapshot),
        status: Set(PayslipStatus::Pending),
        generated_by: Set(Some(generated_by)),
        approved_by: Set(None),
        approved_at: Set(None),
        rejection_reason: Set(None),
        paid_at: Set(None),
        ..Default::default()
    };

    let payslip = Payslip::insert(model)
        .exec_with_returning(db).await
        .map_err(|err| if is_unique_violation(&err) {
            Conflict::DuplicatePeriod.into()
        } else {
            ApiError::from(err)
        })?;

    info!(
        payslip_id = %payslip.id,
        employee_id = %employee.id,
        month = period.month,
        year = period.year,
        net_salary = payslip.net_salary,
        "payslip generated"
    );

    notify::dispatch(notifier, PayslipEvent::new(PayslipEventKind::Generated, &payslip)).await;

    Ok(payslip)
}

/// Moves a payslip along the state machine.
///
/// The update only applies while the row still holds the status it was read with, so
/// a concurrent transition makes this one fail instead of overwriting it.
pub async fn transition<C: ConnectionTrait>(
    db: &C,
    payslip: &payslip::Model,
    action: PayslipAction,
    actor: Uuid,
    reason: Option<String>,
) -> Result<payslip::Model, ApiError> {
    let next = next_status(payslip.status, action)?;
    let now = Utc::now().fixed_offset();

    let mut model = payslip::ActiveModel {
        id: Unchanged(payslip.id),
        status: Set(next),
        updated_at: Set(now),
        ..Default::default()
    };

    match action {
        PayslipAction::Approve => {
            model.approved_by = Set(Some(actor));
            model.approved_at = Set(Some(now));
        },
        PayslipAction::Reject => {
            model.approved_by = Set(Some(actor));
            model.approved_at = Set(Some(now));
            model.rejection_reason = Set(reason);
        },
        PayslipAction::MarkPaid => {
            model.paid_at = Set(Some(now));
        },
        PayslipAction::Void => {},
    }

    let updated = Payslip::update(model)
        .filter(payslip::Column::Status.eq(payslip.status))
        .exec(db).await
        .map_err(|err| match err {
            DbErr::RecordNotUpdated => InvalidTransition { from: payslip.status, action }.into(),
            err => ApiError::from(err),
        })?;

    info!(payslip_id = %updated.id, from = ?payslip.status, to = ?next, %actor, "payslip transitioned");

    Ok(updated)
}

pub async fn approve<C: ConnectionTrait>(
    db: &C,
    notifier: &dyn Notifier,
    payslip: &payslip::Model,
    approver: Uuid,
) -> Result<payslip::Model, ApiError> {
    let approved = transition(db, payslip, PayslipAction::Approve, approver, None).await?;

    // Approval is committed at this point, PDF and e-mail dispatch are best-effort
    notify::dispatch(notifier, PayslipEvent::new(PayslipEventKind::Approved, &approved)).await;

    Ok(approved)
}

pub async fn reject<C: ConnectionTrait>(
    db: &C,
    payslip: &payslip::Model,
    approver: Uuid,
    reason: String,
) -> Result<payslip::Model, ApiError> {
    transition(db, payslip, PayslipAction::Reject, approver, Some(reason)).await
}

pub async fn mark_paid<C: ConnectionTrait>(
    db: &C,
    payslip: &payslip::Model,
    actor: Uuid,
) -> Result<payslip::Model, ApiError> {
    transition(db, payslip, PayslipAction::MarkPaid, actor, None).await
}

pub async fn void<C: ConnectionTrait>(db: &C, payslip: &payslip::Model) -> Result<(), ApiError> {
    ensure_voidable(payslip.status)?;

    let res = Payslip::delete_many()
        .filter(payslip::Column::Id.eq(payslip.id))
        .filter(payslip::Column::Status.is_in([PayslipStatus::Pending, PayslipStatus::Rejected]))
        .exec(db).await?;

    if res.rows_affected == 0 {
        return Err(InvalidTransition { from: payslip.status, action: PayslipAction::Void }.into());
    }

    info!(payslip_id = %payslip.id, "payslip voided");

    Ok(())
}
