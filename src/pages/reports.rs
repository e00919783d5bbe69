use actix_web::{get, web, Responder};
use chrono::{NaiveDate, Utc};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::Manager,
    entity::{attendance, leave_request, payslip, prelude::*, sea_orm_active_enums::{RoleType, UserStatus}, user},
    error::ApiResult,
    pages::find_organization,
    period::PeriodQuery,
    summary,
    utils,
};

pub(super) fn config(cfg: &mut web::ServiceConfig) {
    cfg
        .service(overview);
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct OverviewQuery {
    organization_id: Option<Uuid>,
    /// Defaults to today in UTC
    date: Option<NaiveDate>,
    month: Option<u32>,
    year: Option<i32>,
}

#[get("/overview")]
async fn overview(db: web::Data<DatabaseConnection>, manager: Manager, query: web::Query<OverviewQuery>) -> ApiResult<impl Responder> {
    let organization_id = manager.managed_organization(query.organization_id)?;
    let period = PeriodQuery { month: query.month, year: query.year }.optional()?;
    let date = query.date.unwrap_or_else(|| utils::utc_date(&Utc::now().fixed_offset()));

    find_organization(db.get_ref(), organization_id).await?;

    let employees = User::find()
        .filter(user::Column::OrganizationId.eq(organization_id))
        .filter(user::Column::Role.eq(RoleType::Employee))
        .filter(user::Column::Status.eq(UserStatus::Active))
        .all(db.get_ref()).await?;

    let records_today = Attendance::find()
        .filter(attendance::Column::OrganizationId.eq(organization_id))
        .filter(attendance::Column::Date.eq(date))
        .all(db.get_ref()).await?;

    // Requests overlapping the window or covering `date`
    let (from, to) = summary::report_window(date, period.as_ref());
    let leaves = LeaveRequest::find()
        .filter(leave_request::Column::OrganizationId.eq(organization_id))
        .filter(leave_request::Column::StartDate.lte(to.max(date)))
        .filter(leave_request::Column::EndDate.gte(from.min(date)))
        .all(db.get_ref()).await?;

    let payslips = match period {
        Some(period) => Some(
            Payslip::find()
                .filter(payslip::Column::OrganizationId.eq(organization_id))
                .filter(payslip::Column::Month.eq(period.month as i16))
                .filter(payslip::Column::Year.eq(period.year))
                .all(db.get_ref()).await?
        ),
        None => None,
    };

    Ok(web::Json(summary::overview(date, period.as_ref(), &employees, &records_today, &leaves, payslips.as_deref())))
}
