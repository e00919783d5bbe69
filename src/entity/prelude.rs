pub use super::attendance::Entity as Attendance;
pub use super::leave_request::Entity as LeaveRequest;
pub use super::organization::Entity as Organization;
pub use super::payslip::Entity as Payslip;
pub use super::user::Entity as User;
