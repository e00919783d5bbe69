use actix_web::{body, http::StatusCode, HttpResponse, ResponseError};
use sea_orm::{sqlx, DbErr, RuntimeErr};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::{auth::AuthError, payroll::{InvalidTransition, PayOverflow}};

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("no check-in found for today")]
    NoCheckInFound,

    #[error(transparent)]
    Conflict(#[from] Conflict),

    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Detail is logged, never returned to the client
    #[error("internal server error")]
    Database(#[from] DbErr),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// Requests that are well formed but clash with the current state
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Conflict {
    #[error("already checked in today")]
    AlreadyCheckedIn,

    #[error("already checked out today")]
    AlreadyCheckedOut,

    #[error("attendance record has no check-in time")]
    MissingCheckIn,

    #[error("a payslip already exists for this employee and period")]
    DuplicatePeriod,

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    #[error("leave request overlaps an existing request")]
    LeaveOverlap,

    #[error("leave request has already been decided")]
    LeaveAlreadyDecided,

    #[error("username is already taken")]
    UsernameTaken,

    #[error("attendance record changed concurrently, retry the correction")]
    AttendanceChanged,
}

impl From<InvalidTransition> for ApiError {
    fn from(value: InvalidTransition) -> Self {
        Self::Conflict(value.into())
    }
}

impl From<PayOverflow> for ApiError {
    fn from(value: PayOverflow) -> Self {
        Self::Validation(value.to_string())
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse<body::BoxBody> {
        if let ApiError::Database(err) = self {
            error!(%err, "database failure");
        }

        HttpResponse::build(self.status_code())
            .json(ErrorBody { error: self.to_string() })
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) | ApiError::NoCheckInFound => StatusCode::NOT_FOUND,
            ApiError::Conflict(
                Conflict::AlreadyCheckedIn
                | Conflict::AlreadyCheckedOut
                | Conflict::MissingCheckIn
            ) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Auth(err) => err.status_code(),
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Whether an insert lost the race against a unique index
pub fn is_unique_violation(err: &DbErr) -> bool {
    match err {
        DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::Database(err)))
        | DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(err))) => err.is_unique_violation(),
        _ => false,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{borrow::Cow, error::Error as StdError, fmt};

    use sea_orm::sqlx::error::{DatabaseError, ErrorKind};

    use crate::{entity::sea_orm_active_enums::PayslipStatus, payroll::PayslipAction};

    use super::*;

    /// What Postgres reports when a unique index rejects a row
    #[derive(Debug)]
    struct DuplicateKey;

    impl fmt::Display for DuplicateKey {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.message())
        }
    }

    impl StdError for DuplicateKey {}

    impl DatabaseError for DuplicateKey {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed("23505"))
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    pub(crate) fn unique_violation() -> DbErr {
        DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(Box::new(DuplicateKey))))
    }

    #[test]
    fn test_unique_violation() {
        assert!(is_unique_violation(&unique_violation()));
        assert!(is_unique_violation(&DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::Database(Box::new(DuplicateKey))))));

        assert!(!is_unique_violation(&DbErr::Query(RuntimeErr::Internal("duplicate key".to_owned()))));
        assert!(!is_unique_violation(&DbErr::RecordNotUpdated));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::validation("bad").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotFound("payslip").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::NoCheckInFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::from(Conflict::AlreadyCheckedIn).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::from(Conflict::AlreadyCheckedOut).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::from(Conflict::DuplicatePeriod).status_code(), StatusCode::CONFLICT);
        assert_eq!(ApiError::from(AuthError::Unauthorized).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::from(AuthError::Forbidden).status_code(), StatusCode::FORBIDDEN);

        let transition = InvalidTransition { from: PayslipStatus::Paid, action: PayslipAction::Approve };
        assert_eq!(ApiError::from(transition).status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_database_error_is_not_leaked() {
        let err = ApiError::from(DbErr::Query(RuntimeErr::Internal("relation \"payslip\" does not exist".to_owned())));

        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "internal server error");
    }

    #[test]
    fn test_invalid_transition_message() {
        let transition = InvalidTransition { from: PayslipStatus::Pending, action: PayslipAction::MarkPaid };

        assert_eq!(ApiError::from(transition).to_string(), "cannot mark as paid a payslip that is pending");
    }
}
