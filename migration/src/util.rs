use sea_orm_migration::prelude::*;

pub(crate) fn default_table_statement() -> TableCreateStatement {
    TableCreateStatement::new()
        .if_not_exists()
        .col(ColumnDef::new(DefaultColumn::Id)
            .uuid()
            .primary_key()
            .default(Expr::cust("GEN_RANDOM_UUID()"))
            .take())
        .col(ColumnDef::new(DefaultColumn::CreatedAt)
            .timestamp_with_time_zone()
            .not_null()
            .take())
        .col(ColumnDef::new(DefaultColumn::UpdatedAt)
            .timestamp_with_time_zone()
            .not_null()
            .take())
        .take()
}

#[derive(DeriveIden)]
pub(crate) enum DefaultColumn {
    Id,
    CreatedAt,
    UpdatedAt,
}

/// Table owned by one user of one organization.
///
/// Must run `setup_owned_table_fk` macro on the table afterwards
///
/// # Example
///
/// ```rs
/// manager
///     .create_table(default_owned_table_statement(Payslip::EmployeeId)
///         .table(Payslip::Table)
///         .col(ColumnDef::new(Payslip::Month)
///             .small_integer()
///             .not_null())
///         .take()
///     ).await?;
/// setup_owned_table_fk!(manager, Payslip::Table, Payslip::EmployeeId);
/// ```
pub(crate) fn default_owned_table_statement(owner: impl IntoIden) -> TableCreateStatement {
    default_table_statement()
        .col(ColumnDef::new(owner)
            .uuid()
            .not_null())
        .col(ColumnDef::new(DefaultOwnedColumn::OrganizationId)
            .uuid()
            .not_null())
        .take()
}

#[macro_export]
macro_rules! setup_owned_table_fk {
    ($m:expr,$t:expr,$owner:expr) => {{
        use crate::util::*;
        use crate::m20250702_091500_init::{Organization, User};

        $m.create_foreign_key(ForeignKeyCreateStatement::new()
                .from($t, $owner)
                .to(User::Table, DefaultColumn::Id)
                .on_delete(ForeignKeyAction::Restrict)
                .on_update(ForeignKeyAction::Cascade)
                .take()
        ).await?;

        $m.create_foreign_key(ForeignKeyCreateStatement::new()
                .from($t, DefaultOwnedColumn::OrganizationId)
                .to(Organization::Table, DefaultColumn::Id)
                .on_delete(ForeignKeyAction::Restrict)
                .on_update(ForeignKeyAction::Cascade)
                .take()
        ).await?;
    }};
}

#[derive(DeriveIden)]
pub(crate) enum DefaultOwnedColumn {
    OrganizationId,
}
