pub mod prelude;

pub mod attendance;
pub mod leave_request;
pub mod organization;
pub mod payslip;
pub mod sea_orm_active_enums;
pub mod user;
