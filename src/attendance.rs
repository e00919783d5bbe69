//! Daily check-in / check-out bookkeeping.
//!
//! One row per employee per UTC calendar day, enforced by a unique index on
//! `(user_id, date)`. Every write is conditional on the row still being in the
//! state it was read in, except for corrections made by a manager.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use sea_orm::{ActiveValue::{Set, Unchanged}, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{
    consts::MILLIS_PER_HOUR,
    entity::{attendance, leave_request, prelude::*, sea_orm_active_enums::{AttendanceStatus, CheckMethod, LeaveStatus}},
    error::{is_unique_violation, ApiError, Conflict},
    period::Period,
    summary::{self, MonthlySummary},
    utils,
};

/// Fractional hours between two instants, `None` when `check_out` precedes `check_in`
pub fn working_hours(check_in: DateTime<FixedOffset>, check_out: DateTime<FixedOffset>) -> Option<f64> {
    let millis = (check_out - check_in).num_milliseconds();

    (millis >= 0).then(|| millis as f64 / MILLIS_PER_HOUR)
}

pub async fn find_for_day<C: ConnectionTrait>(db: &C, user_id: Uuid, date: NaiveDate) -> Result<Option<attendance::Model>, DbErr> {
    Attendance::find()
        .filter(attendance::Column::UserId.eq(user_id))
        .filter(attendance::Column::Date.eq(date))
        .one(db).await
}

pub async fn find_for_period<C: ConnectionTrait>(db: &C, user_id: Uuid, period: &Period) -> Result<Vec<attendance::Model>, DbErr> {
    Attendance::find()
        .filter(attendance::Column::UserId.eq(user_id))
        .filter(attendance::Column::Date.between(period.first_day(), period.last_day()))
        .order_by_asc(attendance::Column::Date)
        .all(db).await
}

pub async fn check_in<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    organization_id: Uuid,
    at: DateTime<FixedOffset>,
    method: CheckMethod,
) -> Result<attendance::Model, ApiError> {
    let date = utils::utc_date(&at);
    let now = Utc::now().fixed_offset();

    let record = match find_for_day(db, user_id, date).await? {
        Some(existing) if existing.check_in_at.is_some() => {
            return Err(Conflict::AlreadyCheckedIn.into());
        },
        // Row pre-created by a correction
        Some(existing) => {
            Attendance::update(attendance::ActiveModel {
                id: Unchanged(existing.id),
                updated_at: Set(now),
                check_in_at: Set(Some(at)),
                check_in_method: Set(Some(method)),
                status: Set(AttendanceStatus::Present),
                ..Default::default()
            })
                .filter(attendance::Column::CheckInAt.is_null())
                .exec(db).await
                .map_err(|err| match err {
                    DbErr::RecordNotUpdated => Conflict::AlreadyCheckedIn.into(),
                    err => ApiError::from(err),
                })?
        },
        None => {
            let model = attendance::ActiveModel {
                created_at: Set(now),
                updated_at: Set(now),
                user_id: Set(user_id),
                organization_id: Set(organization_id),
                date: Set(date),
                check_in_at: Set(Some(at)),
                check_in_method: Set(Some(method)),
                check_out_at: Set(None),
                check_out_method: Set(None),
                working_hours: Set(None),
                status: Set(AttendanceStatus::Present),
                notes: Set(None),
                ..Default::default()
            };

            Attendance::insert(model)
                .exec_with_returning(db).await
                .map_err(|err| if is_unique_violation(&err) {
                    Conflict::AlreadyCheckedIn.into()
                } else {
                    ApiError::from(err)
                })?
        },
    };

    info!(attendance_id = %record.id, %user_id, %date, ?method, "checked in");

    Ok(record)
}

pub async fn check_out<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    at: DateTime<FixedOffset>,
    method: CheckMethod,
) -> Result<attendance::Model, ApiError> {
    let date = utils::utc_date(&at);

    let record = find_for_day(db, user_id, date).await?
        .ok_or(ApiError::NoCheckInFound)?;

    if record.check_out_at.is_some() {
        return Err(Conflict::AlreadyCheckedOut.into());
    }

    let check_in_at = record.check_in_at.ok_or(Conflict::MissingCheckIn)?;

    let hours = working_hours(check_in_at, at)
        .ok_or_else(|| ApiError::validation("check-out time precedes check-in time"))?;

    let record = Attendance::update(attendance::ActiveModel {
        id: Unchanged(record.id),
        updated_at: Set(Utc::now().fixed_offset()),
        check_out_at: Set(Some(at)),
        check_out_method: Set(Some(method)),
        working_hours: Set(Some(hours)),
        ..Default::default()
    })
        .filter(attendance::Column::CheckOutAt.is_null())
        .exec(db).await
        .map_err(|err| match err {
            DbErr::RecordNotUpdated => Conflict::AlreadyCheckedOut.into(),
            err => ApiError::from(err),
        })?;

    info!(attendance_id = %record.id, %user_id, working_hours = hours, ?method, "checked out");

    Ok(record)
}

/// A manager's override of one employee's day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    #[serde(default)]
    pub notes: Option<String>,
    /// Replaces the recorded time when given
    #[serde(default)]
    pub check_in_at: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub check_out_at: Option<DateTime<FixedOffset>>,
}

impl Correction {
    fn validate(&self) -> Result<(), ApiError> {
        for time in [self.check_in_at, self.check_out_at].into_iter().flatten() {
            if utils::utc_date(&time) != self.date {
                return Err(ApiError::validation("corrected times must fall on `date`"));
            }
        }

        Ok(())
    }
}

/// Sets the status, notes and optionally the times of an employee's day.
///
/// Creates the row when the employee has none for that day, so a manager can mark
/// someone absent or late ahead of payroll. Corrected times are recorded as manual.
pub async fn correct<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    organization_id: Uuid,
    correction: Correction,
    corrected_by: Uuid,
) -> Result<attendance::Model, ApiError> {
    correction.validate()?;

    let existing = find_for_day(db, user_id, correction.date).await?;

    let check_in_at = correction.check_in_at.or(existing.as_ref().and_then(|r| r.check_in_at));
    let check_out_at = correction.check_out_at.or(existing.as_ref().and_then(|r| r.check_out_at));

    let hours = match (check_in_at, check_out_at) {
        (Some(check_in_at), Some(check_out_at)) => Some(
            working_hours(check_in_at, check_out_at)
                .ok_or_else(|| ApiError::validation("check-out time precedes check-in time"))?
        ),
        (None, Some(_)) => return Err(Conflict::MissingCheckIn.into()),
        _ => None,
    };

    let now = Utc::now().fixed_offset();
    let manual = |time: Option<DateTime<FixedOffset>>| time.map(|_| CheckMethod::Manual);

    let record = match existing {
        Some(existing) => {
            let mut model = attendance::ActiveModel {
                id: Unchanged(existing.id),
                updated_at: Set(now),
                status: Set(correction.status),
                notes: Set(correction.notes),
                working_hours: Set(hours),
                ..Default::default()
            };
            if correction.check_in_at.is_some() {
                model.check_in_at = Set(correction.check_in_at);
                model.check_in_method = Set(manual(correction.check_in_at));
            }
            if correction.check_out_at.is_some() {
                model.check_out_at = Set(correction.check_out_at);
                model.check_out_method = Set(manual(correction.check_out_at));
            }

            Attendance::update(model).exec(db).await?
        },
        None => {
            let model = attendance::ActiveModel {
                created_at: Set(now),
                updated_at: Set(now),
                user_id: Set(user_id),
                organization_id: Set(organization_id),
                date: Set(correction.date),
                check_in_at: Set(check_in_at),
                check_in_method: Set(manual(check_in_at)),
                check_out_at: Set(check_out_at),
                check_out_method: Set(manual(check_out_at)),
                working_hours: Set(hours),
                status: Set(correction.status),
                notes: Set(correction.notes),
                ..Default::default()
            };

            Attendance::insert(model)
                .exec_with_returning(db).await
                .map_err(|err| if is_unique_violation(&err) {
                    Conflict::AttendanceChanged.into()
                } else {
                    ApiError::from(err)
                })?
        },
    };

    info!(
        attendance_id = %record.id,
        %user_id,
        date = %record.date,
        status = ?record.status,
        %corrected_by,
        "attendance corrected"
    );

    Ok(record)
}

/// Present / absent / leave breakdown of one employee's business days
pub async fn monthly_summary<C: ConnectionTrait>(db: &C, user_id: Uuid, period: &Period) -> Result<MonthlySummary, DbErr> {
    let records = find_for_period(db, user_id, period).await?;

    let leaves = LeaveRequest::find()
        .filter(leave_request::Column::UserId.eq(user_id))
        .filter(leave_request::Column::Status.eq(LeaveStatus::Approved))
        .filter(leave_request::Column::StartDate.lte(period.last_day()))
        .filter(leave_request::Column::EndDate.gte(period.first_day()))
        .all(db).await?;

    Ok(summary::monthly_summary(period, &records, &leaves))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;
    use sea_orm::{DatabaseBackend, MockDatabase};

    use crate::{error::tests::unique_violation, payroll::tests::record};

    use super::*;

    fn at(hour: u32, minute: u32) -> DateTime<FixedOffset> {
        Utc.with_ymd_and_hms(2024, 6, 3, hour, minute, 0).unwrap().fixed_offset()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
    }

    #[test]
    fn test_working_hours() {
        assert_eq!(working_hours(at(9, 0), at(17, 30)), Some(8.5));
        assert_eq!(working_hours(at(9, 0), at(9, 0)), Some(0.0));
        assert_eq!(working_hours(at(9, 0), at(8, 59)), None);

        let precise = working_hours(at(9, 0), at(9, 0) + chrono::Duration::milliseconds(1_800_001)).unwrap();
        assert_eq!(precise, 1_800_001.0 / 3_600_000.0);
    }

    #[actix_web::test]
    async fn test_check_in_creates_the_day() {
        let user_id = Uuid::new_v4();
        let mut created = record(user_id, today(), AttendanceStatus::Present);
        created.check_out_at = None;
        created.working_hours = None;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                vec![],
                vec![created.clone()],
            ])
            .into_connection();

        let record = check_in(&db, user_id, Uuid::nil(), at(9, 0), CheckMethod::Web).await.unwrap();
        assert_eq!(record, created);
    }

    #[actix_web::test]
    async fn test_check_in_twice() {
        let user_id = Uuid::new_v4();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![record(user_id, today(), AttendanceStatus::Present)]])
            .into_connection();

        let err = check_in(&db, user_id, Uuid::nil(), at(10, 0), CheckMethod::Mobile).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(Conflict::AlreadyCheckedIn)));
    }

    #[actix_web::test]
    async fn test_check_in_race_is_already_checked_in() {
        let user_id = Uuid::new_v4();

        // Nothing found, then a concurrent check-in wins the unique index
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<attendance::Model>::new()])
            .append_query_errors([unique_violation()])
            .into_connection();

        let err = check_in(&db, user_id, Uuid::nil(), at(9, 0), CheckMethod::Web).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(Conflict::AlreadyCheckedIn)));
    }

    fn correction(status: AttendanceStatus) -> Correction {
        Correction { date: today(), status, notes: Some("sick, called in".to_owned()), check_in_at: None, check_out_at: None }
    }

    #[actix_web::test]
    async fn test_correct_creates_absent_day() {
        let user_id = Uuid::new_v4();

        let mut absent = record(user_id, today(), AttendanceStatus::Absent);
        absent.check_in_at = None;
        absent.check_out_at = None;
        absent.working_hours = None;
        absent.notes = Some("sick, called in".to_owned());

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                vec![],
                vec![absent.clone()],
            ])
            .into_connection();

        let corrected = correct(&db, user_id, Uuid::nil(), correction(AttendanceStatus::Absent), Uuid::new_v4()).await.unwrap();
        assert_eq!(corrected, absent);

        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains("INSERT INTO"));
    }

    #[actix_web::test]
    async fn test_correct_existing_day() {
        let user_id = Uuid::new_v4();
        let existing = record(user_id, today(), AttendanceStatus::Present);
        let late = attendance::Model {
            status: AttendanceStatus::Late,
            check_in_at: Some(at(10, 30)),
            check_in_method: Some(CheckMethod::Manual),
            working_hours: Some(7.0),
            ..existing.clone()
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                vec![existing],
                vec![late.clone()],
            ])
            .into_connection();

        let payload = Correction { check_in_at: Some(at(10, 30)), ..correction(AttendanceStatus::Late) };

        let corrected = correct(&db, user_id, Uuid::nil(), payload, Uuid::new_v4()).await.unwrap();
        assert_eq!(corrected, late);

        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains("UPDATE"));
    }

    #[actix_web::test]
    async fn test_correct_rejects_inconsistent_times() {
        let user_id = Uuid::new_v4();

        // A time on another day never reaches the database
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let payload = Correction { check_in_at: Some(at(9, 0) + chrono::Duration::days(1)), ..correction(AttendanceStatus::Present) };
        let err = correct(&db, user_id, Uuid::nil(), payload, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<attendance::Model>::new()])
            .into_connection();
        let payload = Correction { check_out_at: Some(at(17, 0)), ..correction(AttendanceStatus::Present) };
        let err = correct(&db, user_id, Uuid::nil(), payload, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(Conflict::MissingCheckIn)));

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![record(user_id, today(), AttendanceStatus::Present)]])
            .into_connection();
        let payload = Correction { check_out_at: Some(at(8, 0)), ..correction(AttendanceStatus::Present) };
        let err = correct(&db, user_id, Uuid::nil(), payload, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[actix_web::test]
    async fn test_check_in_over_absent_row() {
        let user_id = Uuid::new_v4();

        let mut absent = record(user_id, today(), AttendanceStatus::Absent);
        absent.check_in_at = None;
        absent.check_out_at = None;
        absent.working_hours = None;

        let checked_in = attendance::Model {
            check_in_at: Some(at(9, 0)),
            status: AttendanceStatus::Present,
            ..absent.clone()
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                vec![absent],
                vec![checked_in.clone()],
            ])
            .into_connection();

        let record = check_in(&db, user_id, Uuid::nil(), at(9, 0), CheckMethod::Biometric).await.unwrap();
        assert_eq!(record, checked_in);
    }

    #[actix_web::test]
    async fn test_check_out() {
        let user_id = Uuid::new_v4();

        let mut open = record(user_id, today(), AttendanceStatus::Present);
        open.check_out_at = None;
        open.working_hours = None;

        let closed = record(user_id, today(), AttendanceStatus::Present);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                vec![open],
                vec![closed.clone()],
            ])
            .into_connection();

        let record = check_out(&db, user_id, at(17, 30), CheckMethod::Web).await.unwrap();
        assert_eq!(record.working_hours, Some(8.5));

        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains("Double(Some(8.5))"));
    }

    #[actix_web::test]
    async fn test_check_out_failures() {
        let user_id = Uuid::new_v4();

        let mut without_check_in = record(user_id, today(), AttendanceStatus::Absent);
        without_check_in.check_in_at = None;
        without_check_in.check_out_at = None;

        let mut open = record(user_id, today(), AttendanceStatus::Present);
        open.check_out_at = None;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                vec![],
                vec![record(user_id, today(), AttendanceStatus::Present)],
                vec![without_check_in],
                vec![open],
            ])
            .into_connection();

        let err = check_out(&db, user_id, at(17, 0), CheckMethod::Web).await.unwrap_err();
        assert!(matches!(err, ApiError::NoCheckInFound));

        let err = check_out(&db, user_id, at(17, 0), CheckMethod::Web).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(Conflict::AlreadyCheckedOut)));

        let err = check_out(&db, user_id, at(17, 0), CheckMethod::Web).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(Conflict::MissingCheckIn)));

        // Checked in at 09:00
        let err = check_out(&db, user_id, at(8, 0), CheckMethod::Web).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[actix_web::test]
    async fn test_monthly_summary() {
        let user_id = Uuid::new_v4();
        let june = Period::new(6, 2024).unwrap();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![record(user_id, today(), AttendanceStatus::Present)]])
            .append_query_results([Vec::<leave_request::Model>::new()])
            .into_connection();

        let summary = monthly_summary(&db, user_id, &june).await.unwrap();
        assert_eq!(summary, MonthlySummary { present: 1, absent: 19, leave: 0, total: 20 });
    }
}
