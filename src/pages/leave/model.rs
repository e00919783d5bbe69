use super::*;

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct ApplyLeave {
    pub(super) leave_type: LeaveType,
    pub(super) start_date: NaiveDate,
    pub(super) end_date: NaiveDate,
    pub(super) reason: String,
}

impl From<ApplyLeave> for LeaveApplication {
    fn from(value: ApplyLeave) -> Self {
        Self {
            leave_type: value.leave_type,
            start_date: value.start_date,
            end_date: value.end_date,
            reason: value.reason,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct RejectLeave {
    pub(super) reason: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(super) struct OrganizationLeaveQuery {
    pub(super) organization_id: Option<Uuid>,
    pub(super) status: Option<LeaveStatus>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(super) struct BalanceQuery {
    pub(super) year: Option<i32>,
}
