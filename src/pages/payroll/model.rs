use super::*;

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct GeneratePayroll {
    pub(super) month: u32,
    pub(super) year: i32,
    /// Only this employee instead of every active employee of the organization
    pub(super) employee_id: Option<Uuid>,
    pub(super) organization_id: Option<Uuid>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(super) struct GeneratedPayroll {
    pub(super) generated: Vec<payslip::Model>,
    /// Employees that already had a payslip for the period
    pub(super) skipped: Vec<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct RejectPayslip {
    pub(super) reason: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(super) struct ListPayslips {
    pub(super) month: Option<u32>,
    pub(super) year: Option<i32>,
    pub(super) organization_id: Option<Uuid>,
}
