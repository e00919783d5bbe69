use sea_orm_migration::prelude::*;
use sha2::Digest as _;

use crate::m20250702_091500_init::{Organization, User};

#[derive(DeriveMigrationName)]
pub struct Migration;

const ORGANIZATION_ID: u128 = 0xd3e0;
const ADMIN_ID: u128 = 12345;
const CLIENT_ID: u128 = 12346;
const EMPLOYEES: u128 = 20;

fn uuid_of(i: u128) -> SimpleExpr {
    Expr::val(format!("{:032x}", i)).cast_as("uuid")
}

fn hashed(username: &str) -> Vec<u8> {
    sha2::Sha256::digest(format!("{}:{}", username, username)).to_vec()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let time = Expr::val("2025-07-04T14:02:10.000Z").cast_as("timestamptz");

        let rate_policy = r#"{
            "housing_allowance": { "basis_points": 1000 },
            "transport_allowance": { "fixed": 150000 },
            "tax": { "basis_points": 1000 },
            "provident_fund": { "basis_points": 500 }
        }"#;
        let leave_policy = r#"{ "casual": 10, "sick": 10, "annual": 15 }"#;

        manager
            .exec_stmt(Query::insert()
                .into_table(Organization::Table)
                .columns(["id", "created_at", "updated_at", "name", "rate_policy", "leave_policy"])
                .values_panic([
                    uuid_of(ORGANIZATION_ID),
                    time.clone(),
                    time.clone(),
                    "Demo Organization".into(),
                    Expr::val(rate_policy).cast_as("jsonb"),
                    Expr::val(leave_policy).cast_as("jsonb"),
                ])
                .to_owned()
        ).await?;

        let user_columns = ["id", "created_at", "updated_at", "organization_id", "username", "password", "role", "employment_type", "pay_basis", "base_rate", "status"];

        // Platform admin, outside of any organization
        manager
            .exec_stmt(Query::insert()
                .into_table(User::Table)
                .columns(user_columns)
                .values_panic([
                    uuid_of(ADMIN_ID),
                    time.clone(),
                    time.clone(),
                    Expr::val(Option::<String>::None).cast_as("uuid"),
                    "admin".into(),
                    hashed("admin").into(),
                    Expr::val("admin").cast_as("role_type"),
                    Expr::val("full_time").cast_as("employment_type"),
                    Expr::val("monthly").cast_as("pay_basis"),
                    0.into(),
                    Expr::val("active").cast_as("user_status"),
                ])
                .to_owned()
        ).await?;

        // HR manager of the demo organization
        manager
            .exec_stmt(Query::insert()
                .into_table(User::Table)
                .columns(user_columns)
                .values_panic([
                    uuid_of(CLIENT_ID),
                    time.clone(),
                    time.clone(),
                    uuid_of(ORGANIZATION_ID),
                    "hr".into(),
                    hashed("hr").into(),
                    Expr::val("client").cast_as("role_type"),
                    Expr::val("full_time").cast_as("employment_type"),
                    Expr::val("monthly").cast_as("pay_basis"),
                    0.into(),
                    Expr::val("active").cast_as("user_status"),
                ])
                .to_owned()
        ).await?;

        // Even ids are salaried staff, odd ids are daily-rate contractors
        for i in 1..=EMPLOYEES {
            let username = i.to_string();
            let (employment_type, pay_basis, base_rate) = if i % 2 == 0 {
                ("full_time", "monthly", rand::random_range(5_000_000..=20_000_000i64))
            } else {
                ("contract", "daily", rand::random_range(250_000..=900_000i64))
            };

            manager
                .exec_stmt(Query::insert()
                    .into_table(User::Table)
                    .columns(user_columns)
                    .values_panic([
                        uuid_of(i),
                        time.clone(),
                        time.clone(),
                        uuid_of(ORGANIZATION_ID),
                        username.as_str().into(),
                        hashed(&username).into(),
                        Expr::val("employee").cast_as("role_type"),
                        Expr::val(employment_type).cast_as("employment_type"),
                        Expr::val(pay_basis).cast_as("pay_basis"),
                        base_rate.into(),
                        Expr::val("active").cast_as("user_status"),
                    ])
                    .to_owned()
            ).await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for i in (1..=EMPLOYEES).chain([ADMIN_ID, CLIENT_ID]) {
            manager
                .exec_stmt(Query::delete()
                    .from_table(User::Table)
                    .and_where(Expr::col("id").eq(uuid_of(i)))
                    .to_owned()
            ).await?;
        }

        manager
            .exec_stmt(Query::delete()
                .from_table(Organization::Table)
                .and_where(Expr::col("id").eq(uuid_of(ORGANIZATION_ID)))
                .to_owned()
        ).await?;

        Ok(())
    }
}
