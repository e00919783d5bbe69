use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::payroll::{AttendanceSnapshot, PayItems};

use super::sea_orm_active_enums::{PayBasis, PayslipStatus};

/// Outcome of one payroll run for one employee and one period.
///
/// Unique on `(employee_id, month, year)`. Pay figures are produced by the payroll
/// calculator before insert and only `status` and its bookkeeping columns change
/// afterwards.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payslip")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub employee_id: Uuid,
    pub organization_id: Uuid,
    pub month: i16,
    pub year: i32,
    pub pay_basis: PayBasis,
    pub rate: i64,
    pub days_worked: i32,
    pub basic_salary: i64,
    #[sea_orm(column_type = "JsonBinary")]
    pub allowances: PayItems,
    #[sea_orm(column_type = "JsonBinary")]
    pub deductions: PayItems,
    pub gross_salary: i64,
    pub net_salary: i64,
    #[sea_orm(column_type = "JsonBinary")]
    pub attendance: AttendanceSnapshot,
    pub status: PayslipStatus,
    pub generated_by: Option<Uuid>,
    /// Whoever approved or rejected the payslip
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTimeWithTimeZone>,
    #[sea_orm(column_type = "Text", nullable)]
    pub rejection_reason: Option<String>,
    pub paid_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::EmployeeId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Employee,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employee.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
