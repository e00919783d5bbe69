use sea_orm_migration::{prelude::{extension::postgres::TypeDropStatement, *}, sea_orm::{ActiveEnum, DbBackend, DeriveActiveEnum, EnumIter, Schema}};

use crate::{setup_owned_table_fk, util::{default_owned_table_statement, default_table_statement, DefaultColumn}};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = Schema::new(DbBackend::Postgres);

        manager.create_type(schema.create_enum_from_active_enum::<RoleType>()).await?;
        manager.create_type(schema.create_enum_from_active_enum::<EmploymentType>()).await?;
        manager.create_type(schema.create_enum_from_active_enum::<PayBasis>()).await?;
        manager.create_type(schema.create_enum_from_active_enum::<UserStatus>()).await?;
        manager.create_type(schema.create_enum_from_active_enum::<AttendanceStatus>()).await?;
        manager.create_type(schema.create_enum_from_active_enum::<CheckMethod>()).await?;
        manager.create_type(schema.create_enum_from_active_enum::<LeaveType>()).await?;
        manager.create_type(schema.create_enum_from_active_enum::<LeaveStatus>()).await?;
        manager.create_type(schema.create_enum_from_active_enum::<PayslipStatus>()).await?;

        manager
            .create_table(default_table_statement()
                .table(Organization::Table)
                .col(ColumnDef::new(Organization::Name)
                    .text()
                    .not_null())
                .col(ColumnDef::new(Organization::RatePolicy)
                    .json_binary()
                    .not_null()
                    .default(Expr::cust("'{}'::jsonb")))
                .col(ColumnDef::new(Organization::LeavePolicy)
                    .json_binary()
                    .not_null()
                    .default(Expr::cust("'{}'::jsonb")))
                .take()
            ).await?;

        manager
            .create_table(default_table_statement()
                .table(User::Table)
                .col(ColumnDef::new(User::OrganizationId)
                    .uuid()) // Platform admins belong to no organization
                .col(ColumnDef::new(User::Username)
                    .text()
                    .unique_key()
                    .not_null())
                .col(ColumnDef::new(User::Password)
                    .binary()
                    .not_null()) // Password should be in a hashed format
                .col(ColumnDef::new(User::Role)
                    .custom(RoleType::name())
                    .not_null())
                .col(ColumnDef::new(User::EmploymentType)
                    .custom(EmploymentType::name())
                    .not_null())
                .col(ColumnDef::new(User::PayBasis)
                    .custom(PayBasis::name())
                    .not_null())
                .col(ColumnDef::new(User::BaseRate)
                    .big_integer()
                    .not_null()) // Minor currency units
                .col(ColumnDef::new(User::Status)
                    .custom(UserStatus::name())
                    .not_null())
                .take()
            ).await?;

        manager.create_foreign_key(ForeignKeyCreateStatement::new()
            .from(User::Table, User::OrganizationId)
            .to(Organization::Table, DefaultColumn::Id)
            .on_delete(ForeignKeyAction::Restrict)
            .on_update(ForeignKeyAction::Cascade)
            .take()
        ).await?;

        manager
            .create_table(default_owned_table_statement(Attendance::UserId)
                .table(Attendance::Table)
                .col(ColumnDef::new(Attendance::Date)
                    .date()
                    .not_null())
                .col(ColumnDef::new(Attendance::CheckInAt)
                    .timestamp_with_time_zone())
                .col(ColumnDef::new(Attendance::CheckInMethod)
                    .custom(CheckMethod::name()))
                .col(ColumnDef::new(Attendance::CheckOutAt)
                    .timestamp_with_time_zone())
                .col(ColumnDef::new(Attendance::CheckOutMethod)
                    .custom(CheckMethod::name()))
                .col(ColumnDef::new(Attendance::WorkingHours)
                    .double())
                .col(ColumnDef::new(Attendance::Status)
                    .custom(AttendanceStatus::name())
                    .not_null())
                .col(ColumnDef::new(Attendance::Notes)
                    .text())
                .take()
            ).await?;
        setup_owned_table_fk!(manager, Attendance::Table, Attendance::UserId);

        // One row per employee per calendar day, even under racing check-ins
        manager.create_index(Index::create()
            .name("idx_attendance_user_date")
            .table(Attendance::Table)
            .col(Attendance::UserId)
            .col(Attendance::Date)
            .unique()
            .take()
        ).await?;

        manager
            .create_table(default_owned_table_statement(LeaveRequest::UserId)
                .table(LeaveRequest::Table)
                .col(ColumnDef::new(LeaveRequest::LeaveType)
                    .custom(LeaveType::name())
                    .not_null())
                .col(ColumnDef::new(LeaveRequest::StartDate)
                    .date()
                    .not_null())
                .col(ColumnDef::new(LeaveRequest::EndDate)
                    .date()
                    .not_null())
                .col(ColumnDef::new(LeaveRequest::Reason)
                    .text()
                    .not_null())
                .col(ColumnDef::new(LeaveRequest::Status)
                    .custom(LeaveStatus::name())
                    .not_null())
                .col(ColumnDef::new(LeaveRequest::Approver)
                    .uuid())
                .col(ColumnDef::new(LeaveRequest::ApprovedAt)
                    .timestamp_with_time_zone())
                .col(ColumnDef::new(LeaveRequest::RejectionReason)
                    .text())
                .take()
            ).await?;
        setup_owned_table_fk!(manager, LeaveRequest::Table, LeaveRequest::UserId);

        manager
            .create_table(default_owned_table_statement(Payslip::EmployeeId)
                .table(Payslip::Table)
                .col(ColumnDef::new(Payslip::Month)
                    .small_integer()
                    .not_null())
                .col(ColumnDef::new(Payslip::Year)
                    .integer()
                    .not_null())
                .col(ColumnDef::new(Payslip::PayBasis)
                    .custom(PayBasis::name())
                    .not_null())
                .col(ColumnDef::new(Payslip::Rate)
                    .big_integer()
                    .not_null())
                .col(ColumnDef::new(Payslip::DaysWorked)
                    .integer()
                    .not_null())
                .col(ColumnDef::new(Payslip::BasicSalary)
                    .big_integer()
                    .not_null())
                .col(ColumnDef::new(Payslip::Allowances)
                    .json_binary()
                    .not_null())
                .col(ColumnDef::new(Payslip::Deductions)
                    .json_binary()
                    .not_null())
                .col(ColumnDef::new(Payslip::GrossSalary)
                    .big_integer()
                    .not_null())
                .col(ColumnDef::new(Payslip::NetSalary)
                    .big_integer()
                    .not_null())
                .col(ColumnDef::new(Payslip::Attendance)
                    .json_binary()
                    .not_null())
                .col(ColumnDef::new(Payslip::Status)
                    .custom(PayslipStatus::name())
                    .not_null())
                .col(ColumnDef::new(Payslip::GeneratedBy)
                    .uuid())
                .col(ColumnDef::new(Payslip::ApprovedBy)
                    .uuid())
                .col(ColumnDef::new(Payslip::ApprovedAt)
                    .timestamp_with_time_zone())
                .col(ColumnDef::new(Payslip::RejectionReason)
                    .text())
                .col(ColumnDef::new(Payslip::PaidAt)
                    .timestamp_with_time_zone())
                .take()
            ).await?;
        setup_owned_table_fk!(manager, Payslip::Table, Payslip::EmployeeId);

        // A period can only ever hold one payslip per employee
        manager.create_index(Index::create()
            .name("idx_payslip_employee_period")
            .table(Payslip::Table)
            .col(Payslip::EmployeeId)
            .col(Payslip::Month)
            .col(Payslip::Year)
            .unique()
            .take()
        ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(
            TableDropStatement::new()
                .table(Payslip::Table)
                .take()
        ).await?;

        manager.drop_table(
            TableDropStatement::new()
                .table(LeaveRequest::Table)
                .take()
        ).await?;

        manager.drop_table(
            TableDropStatement::new()
                .table(Attendance::Table)
                .take()
        ).await?;

        manager.drop_table(
            TableDropStatement::new()
                .table(User::Table)
                .take()
        ).await?;

        manager.drop_table(
            TableDropStatement::new()
                .table(Organization::Table)
                .take()
        ).await?;

        for name in [
            RoleType::name(),
            EmploymentType::name(),
            PayBasis::name(),
            UserStatus::name(),
            AttendanceStatus::name(),
            CheckMethod::name(),
            LeaveType::name(),
            LeaveStatus::name(),
            PayslipStatus::name(),
        ] {
            manager
                .drop_type(
                    TypeDropStatement::new()
                        .name(name)
                        .to_owned()
                ).await?;
        }

        Ok(())
    }
}

#[derive(Iden)]
pub(crate) enum Organization {
    Table,
    Name,
    RatePolicy,
    LeavePolicy,
}

#[derive(Iden)]
pub(crate) enum User {
    Table,
    OrganizationId,
    Username,
    Password,
    Role,
    EmploymentType,
    PayBasis,
    BaseRate,
    Status,
}

#[derive(Iden)]
enum Attendance {
    Table,
    UserId,
    Date,
    CheckInAt,
    CheckInMethod,
    CheckOutAt,
    CheckOutMethod,
    WorkingHours,
    Status,
    Notes,
}

#[derive(Iden)]
enum LeaveRequest {
    Table,
    UserId,
    LeaveType,
    StartDate,
    EndDate,
    Reason,
    Status,
    Approver,
    ApprovedAt,
    RejectionReason,
}

#[derive(Iden)]
enum Payslip {
    Table,
    EmployeeId,
    Month,
    Year,
    PayBasis,
    Rate,
    DaysWorked,
    BasicSalary,
    Allowances,
    Deductions,
    GrossSalary,
    NetSalary,
    Attendance,
    Status,
    GeneratedBy,
    ApprovedBy,
    ApprovedAt,
    RejectionReason,
    PaidAt,
}

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "role_type")]
enum RoleType {
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "client")]
    Client,
    #[sea_orm(string_value = "employee")]
    Employee,
}

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "employment_type")]
enum EmploymentType {
    #[sea_orm(string_value = "full_time")]
    FullTime,
    #[sea_orm(string_value = "contract")]
    Contract,
}

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "pay_basis")]
enum PayBasis {
    #[sea_orm(string_value = "daily")]
    Daily,
    #[sea_orm(string_value = "hourly")]
    Hourly,
    #[sea_orm(string_value = "monthly")]
    Monthly,
}

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "user_status")]
enum UserStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "inactive")]
    Inactive,
}

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "attendance_status")]
enum AttendanceStatus {
    #[sea_orm(string_value = "present")]
    Present,
    #[sea_orm(string_value = "absent")]
    Absent,
    #[sea_orm(string_value = "late")]
    Late,
    #[sea_orm(string_value = "half_day")]
    HalfDay,
}

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "check_method")]
enum CheckMethod {
    #[sea_orm(string_value = "web")]
    Web,
    #[sea_orm(string_value = "mobile")]
    Mobile,
    #[sea_orm(string_value = "biometric")]
    Biometric,
    #[sea_orm(string_value = "manual")]
    Manual,
}

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "leave_type")]
enum LeaveType {
    #[sea_orm(string_value = "casual")]
    Casual,
    #[sea_orm(string_value = "sick")]
    Sick,
    #[sea_orm(string_value = "annual")]
    Annual,
}

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "leave_status")]
enum LeaveStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payslip_status")]
enum PayslipStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}
