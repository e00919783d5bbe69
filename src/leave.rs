//! Leave entitlements, balances and the leave request workflow.

use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveValue::{Set, Unchanged}, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, FromJsonQueryResult, QueryFilter};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{
    consts::{DEFAULT_ANNUAL_LEAVE_DAYS, DEFAULT_CASUAL_LEAVE_DAYS, DEFAULT_SICK_LEAVE_DAYS},
    entity::{leave_request, prelude::*, sea_orm_active_enums::{LeaveStatus, LeaveType}},
    error::{ApiError, Conflict},
    utils,
};

/// Days of each leave type an employee is entitled to per calendar year
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(default)]
pub struct LeavePolicy {
    pub casual: u32,
    pub sick: u32,
    pub annual: u32,
}

impl Default for LeavePolicy {
    fn default() -> Self {
        Self {
            casual: DEFAULT_CASUAL_LEAVE_DAYS,
            sick: DEFAULT_SICK_LEAVE_DAYS,
            annual: DEFAULT_ANNUAL_LEAVE_DAYS,
        }
    }
}

impl LeavePolicy {
    pub fn entitlement(&self, leave_type: LeaveType) -> u32 {
        match leave_type {
            LeaveType::Casual => self.casual,
            LeaveType::Sick => self.sick,
            LeaveType::Annual => self.annual,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Balance {
    pub total: u32,
    pub consumed: u32,
    pub available: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LeaveBalances {
    pub year: i32,
    pub casual: Balance,
    pub sick: Balance,
    pub annual: Balance,
}

fn year_bounds(year: i32) -> Result<(NaiveDate, NaiveDate), ApiError> {
    let first = NaiveDate::from_ymd_opt(year, 1, 1);
    let last = NaiveDate::from_ymd_opt(year, 12, 31);

    first.zip(last).ok_or_else(|| ApiError::validation("invalid year"))
}

/// Balances for `year`. Approved calendar days are consumed, clipped to the year.
pub fn balances(policy: &LeavePolicy, requests: &[leave_request::Model], year: i32) -> Result<LeaveBalances, ApiError> {
    let bounds = year_bounds(year)?;

    let balance = |leave_type: LeaveType| {
        let consumed = requests.iter()
            .filter(|r| r.leave_type == leave_type && r.status == LeaveStatus::Approved)
            .map(|r| utils::overlapping_days((r.start_date, r.end_date), bounds))
            .sum::<i64>() as u32;
        let total = policy.entitlement(leave_type);

        Balance { total, consumed, available: total.saturating_sub(consumed) }
    };

    Ok(LeaveBalances {
        year,
        casual: balance(LeaveType::Casual),
        sick: balance(LeaveType::Sick),
        annual: balance(LeaveType::Annual),
    })
}

/// Pending and approved requests block the days they cover
pub fn overlaps(requests: &[leave_request::Model], start: NaiveDate, end: NaiveDate) -> bool {
    requests.iter()
        .filter(|r| r.status != LeaveStatus::Rejected)
        .any(|r| utils::overlapping_days((r.start_date, r.end_date), (start, end)) > 0)
}

/// Leave requests are decided once
pub fn next_leave_status(from: LeaveStatus, approve: bool) -> Result<LeaveStatus, Conflict> {
    match (from, approve) {
        (LeaveStatus::Pending, true) => Ok(LeaveStatus::Approved),
        (LeaveStatus::Pending, false) => Ok(LeaveStatus::Rejected),
        _ => Err(Conflict::LeaveAlreadyDecided),
    }
}

pub struct LeaveApplication {
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
}

impl LeaveApplication {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.end_date < self.start_date {
            return Err(ApiError::validation("`end_date` cannot precede `start_date`"));
        }

        if self.reason.trim().is_empty() {
            return Err(ApiError::validation("`reason` cannot be blank"));
        }

        Ok(())
    }
}

pub async fn apply<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    organization_id: Uuid,
    application: LeaveApplication,
) -> Result<leave_request::Model, ApiError> {
    application.validate()?;

    let existing = LeaveRequest::find()
        .filter(leave_request::Column::UserId.eq(user_id))
        .filter(leave_request::Column::Status.ne(LeaveStatus::Rejected))
        .filter(leave_request::Column::StartDate.lte(application.end_date))
        .filter(leave_request::Column::EndDate.gte(application.start_date))
        .all(db).await?;

    if overlaps(&existing, application.start_date, application.end_date) {
        return Err(Conflict::LeaveOverlap.into());
    }

    let now = Utc::now().fixed_offset();

    let model = leave_request::ActiveModel {
        created_at: Set(now),
        updated_at: Set(now),
        user_id: Set(user_id),
        organization_id: Set(organization_id),
        leave_type: Set(application.leave_type),
        start_date: Set(application.start_date),
        end_date: Set(application.end_date),
        reason: Set(application.reason),
        status: Set(LeaveStatus::Pending),
        approver: Set(None),
        approved_at: Set(None),
        rejection_reason: Set(None),
        ..Default::default()
    };

    let leave = LeaveRequest::insert(model).exec_with_returning(db).await?;

    info!(leave_id = %leave.id, %user_id, leave_type = ?leave.leave_type, "leave requested");

    Ok(leave)
}

/// Approves or rejects, only while the request is still pending in the database
pub async fn decide<C: ConnectionTrait>(
    db: &C,
    leave: &leave_request::Model,
    approver: Uuid,
    rejection_reason: Option<String>,
) -> Result<leave_request::Model, ApiError> {
    let next = next_leave_status(leave.status, rejection_reason.is_none())?;
    let now = Utc::now().fixed_offset();

    let model = leave_request::ActiveModel {
        id: Unchanged(leave.id),
        updated_at: Set(now),
        status: Set(next),
        approver: Set(Some(approver)),
        approved_at: Set(Some(now)),
        rejection_reason: Set(rejection_reason),
        ..Default::default()
    };

    let decided = LeaveRequest::update(model)
        .filter(leave_request::Column::Status.eq(LeaveStatus::Pending))
        .exec(db).await
        .map_err(|err| match err {
            DbErr::RecordNotUpdated => Conflict::LeaveAlreadyDecided.into(),
            err => ApiError::from(err),
        })?;

    info!(leave_id = %decided.id, status = ?decided.status, %approver, "leave decided");

    Ok(decided)
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, MockDatabase};

    use crate::payroll::tests::approved_leave;

    use super::*;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    #[test]
    fn test_casual_balance() {
        let user_id = Uuid::new_v4();
        let requests = vec![approved_leave(user_id, LeaveType::Casual, date(3, 4), date(3, 6))];

        let balances = balances(&LeavePolicy::default(), &requests, 2024).unwrap();

        assert_eq!(balances.casual, Balance { total: 10, consumed: 3, available: 7 });
        assert_eq!(balances.sick, Balance { total: 10, consumed: 0, available: 10 });
        assert_eq!(balances.annual.total, 15);
    }

    #[test]
    fn test_balance_counts_only_approved_days_in_year() {
        let user_id = Uuid::new_v4();

        let mut pending = approved_leave(user_id, LeaveType::Annual, date(5, 1), date(5, 3));
        pending.status = LeaveStatus::Pending;

        let requests = vec![
            pending,
            // Two of these days belong to 2024
            approved_leave(user_id, LeaveType::Annual, NaiveDate::from_ymd_opt(2023, 12, 30).unwrap(), date(1, 2)),
            approved_leave(user_id, LeaveType::Sick, date(2, 1), date(2, 20)),
        ];

        let policy = LeavePolicy { sick: 5, ..Default::default() };
        let balances = balances(&policy, &requests, 2024).unwrap();

        assert_eq!(balances.annual.consumed, 2);
        // Never negative
        assert_eq!(balances.sick, Balance { total: 5, consumed: 20, available: 0 });
    }

    #[test]
    fn test_leave_policy_json() {
        let policy: LeavePolicy = serde_json::from_str(r#"{ "annual": 20 }"#).unwrap();

        assert_eq!(policy, LeavePolicy { casual: 10, sick: 10, annual: 20 });
    }

    #[test]
    fn test_overlaps() {
        let user_id = Uuid::new_v4();
        let mut rejected = approved_leave(user_id, LeaveType::Casual, date(6, 10), date(6, 12));
        rejected.status = LeaveStatus::Rejected;
        let requests = vec![approved_leave(user_id, LeaveType::Casual, date(6, 3), date(6, 5)), rejected];

        assert!(overlaps(&requests, date(6, 5), date(6, 7)));
        assert!(!overlaps(&requests, date(6, 6), date(6, 7)));
        assert!(!overlaps(&requests, date(6, 11), date(6, 11)));
    }

    #[test]
    fn test_application_validation() {
        let application = LeaveApplication {
            leave_type: LeaveType::Sick,
            start_date: date(6, 5),
            end_date: date(6, 4),
            reason: "flu".to_owned(),
        };
        assert!(matches!(application.validate(), Err(ApiError::Validation(_))));

        let blank = LeaveApplication { end_date: date(6, 6), reason: "  ".to_owned(), ..application };
        assert!(matches!(blank.validate(), Err(ApiError::Validation(_))));
    }

    #[test]
    fn test_decided_once() {
        assert_eq!(next_leave_status(LeaveStatus::Pending, true), Ok(LeaveStatus::Approved));
        assert_eq!(next_leave_status(LeaveStatus::Pending, false), Ok(LeaveStatus::Rejected));
        assert_eq!(next_leave_status(LeaveStatus::Approved, false), Err(Conflict::LeaveAlreadyDecided));
        assert_eq!(next_leave_status(LeaveStatus::Rejected, true), Err(Conflict::LeaveAlreadyDecided));
    }

    #[actix_web::test]
    async fn test_apply_overlapping() {
        let user_id = Uuid::new_v4();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![approved_leave(user_id, LeaveType::Casual, date(6, 3), date(6, 5))]])
            .into_connection();

        let application = LeaveApplication {
            leave_type: LeaveType::Annual,
            start_date: date(6, 4),
            end_date: date(6, 4),
            reason: "moving".to_owned(),
        };

        let err = apply(&db, user_id, Uuid::nil(), application).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(Conflict::LeaveOverlap)));
    }

    #[actix_web::test]
    async fn test_decide_race_lost() {
        let mut pending = approved_leave(Uuid::new_v4(), LeaveType::Casual, date(6, 3), date(6, 5));
        pending.status = LeaveStatus::Pending;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<leave_request::Model>::new()])
            .into_connection();

        let err = decide(&db, &pending, Uuid::new_v4(), None).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(Conflict::LeaveAlreadyDecided)));
    }
}
