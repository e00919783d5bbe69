use actix_web::{delete, dev, get, post, web, FromRequest, HttpRequest, HttpResponse, Responder};
use futures_util::future::LocalBoxFuture;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::{Capability, Identity, Manager},
    entity::{payslip, prelude::*, sea_orm_active_enums::{RoleType, UserStatus}, user},
    error::{ApiError, ApiResult, Conflict},
    notify::Notifier,
    pages::{find_organization, path_id},
    payroll,
    period::Period,
};

use model::*;

mod extractor;
mod model;

pub(super) fn config(cfg: &mut web::ServiceConfig) {
    cfg
        .service(generate_payroll)
        .service(list_payroll)
        .service(approve_payslip)
        .service(reject_payslip)
        .service(mark_paid)
        .service(void_payslip);
}

pub(super) fn payslip_config(cfg: &mut web::ServiceConfig) {
    cfg
        .service(my_payslips)
        .service(get_payslip);
}

#[post("/generate")]
async fn generate_payroll(
    db: web::Data<DatabaseConnection>,
    notifier: web::Data<dyn Notifier>,
    manager: Manager,
    payload: web::Json<GeneratePayroll>,
) -> ApiResult<impl Responder> {
    let period = Period::new(payload.month, payload.year)?;
    let mut result = GeneratedPayroll::default();

    if let Some(employee_id) = payload.employee_id {
        let employee = User::find_by_id(employee_id)
            .filter(user::Column::Role.eq(RoleType::Employee))
            .one(db.get_ref()).await?
            .ok_or(ApiError::NotFound("employee"))?;

        let organization_id = employee.organization_id.ok_or(ApiError::NotFound("organization"))?;
        manager.require(Capability::OrgManager(organization_id))?;

        if employee.status != UserStatus::Active {
            return Err(ApiError::validation("employee is inactive"));
        }

        let organization = find_organization(db.get_ref(), organization_id).await?;

        let payslip = payroll::generate(db.get_ref(), notifier.get_ref(), &organization, &employee, period, manager.user_id).await?;
        result.generated.push(payslip);
    } else {
        let organization_id = manager.managed_organization(payload.organization_id)?;
        let organization = find_organization(db.get_ref(), organization_id).await?;

        let employees = User::find()
            .filter(user::Column::OrganizationId.eq(organization_id))
            .filter(user::Column::Role.eq(RoleType::Employee))
            .filter(user::Column::Status.eq(UserStatus::Active))
            .order_by_asc(user::Column::Username)
            .all(db.get_ref()).await?;

        for employee in employees {
            match payroll::generate(db.get_ref(), notifier.get_ref(), &organization, &employee, period, manager.user_id).await {
                Ok(payslip) => result.generated.push(payslip),
                Err(ApiError::Conflict(Conflict::DuplicatePeriod)) => result.skipped.push(employee.id),
                Err(err) => return Err(err),
            }
        }

        info!(
            %organization_id,
            month = period.month,
            year = period.year,
            generated = result.generated.len(),
            skipped = result.skipped.len(),
            "payroll run finished"
        );
    }

    Ok(HttpResponse::Created().json(result))
}

#[get("")]
async fn list_payroll(db: web::Data<DatabaseConnection>, manager: Manager, query: web::Query<ListPayslips>) -> ApiResult<impl Responder> {
    let organization_id = manager.managed_organization(query.organization_id)?;
    let period = Period::from_parts(query.month, query.year)?;

    let payslips = Payslip::find()
        .filter(payslip::Column::OrganizationId.eq(organization_id))
        .filter(payslip::Column::Month.eq(period.month as i16))
        .filter(payslip::Column::Year.eq(period.year))
        .order_by_asc(payslip::Column::CreatedAt)
        .all(db.get_ref()).await?;

    Ok(web::Json(payslips.into_iter().map(payroll::with_recomputed_totals).collect::<Vec<_>>()))
}

#[post("/approve/{payslip_id}")]
async fn approve_payslip(
    db: web::Data<DatabaseConnection>,
    notifier: web::Data<dyn Notifier>,
    manager: Manager,
    payslip: payslip::Model,
) -> ApiResult<impl Responder> {
    manager.require(Capability::OrgManager(payslip.organization_id))?;

    let payslip = payroll::approve(db.get_ref(), notifier.get_ref(), &payslip, manager.user_id).await?;

    Ok(web::Json(payslip))
}

#[post("/reject/{payslip_id}")]
async fn reject_payslip(db: web::Data<DatabaseConnection>, manager: Manager, payslip: payslip::Model, payload: web::Json<RejectPayslip>) -> ApiResult<impl Responder> {
    manager.require(Capability::OrgManager(payslip.organization_id))?;

    if payload.reason.trim().is_empty() {
        return Err(ApiError::validation("`reason` cannot be blank"));
    }

    let payslip = payroll::reject(db.get_ref(), &payslip, manager.user_id, payload.into_inner().reason).await?;

    Ok(web::Json(payslip))
}

#[post("/paid/{payslip_id}")]
async fn mark_paid(db: web::Data<DatabaseConnection>, manager: Manager, payslip: payslip::Model) -> ApiResult<impl Responder> {
    manager.require(Capability::OrgManager(payslip.organization_id))?;

    let payslip = payroll::mark_paid(db.get_ref(), &payslip, manager.user_id).await?;

    Ok(web::Json(payslip))
}

#[delete("/{payslip_id}")]
async fn void_payslip(db: web::Data<DatabaseConnection>, manager: Manager, payslip: payslip::Model) -> ApiResult<impl Responder> {
    manager.require(Capability::OrgManager(payslip.organization_id))?;

    payroll::void(db.get_ref(), &payslip).await?;

    Ok(HttpResponse::NoContent().finish())
}

#[get("")]
async fn my_payslips(db: web::Data<DatabaseConnection>, identity: Identity) -> ApiResult<impl Responder> {
    let payslips = Payslip::find()
        .filter(payslip::Column::EmployeeId.eq(identity.user_id))
        .order_by_desc(payslip::Column::Year)
        .order_by_desc(payslip::Column::Month)
        .all(db.get_ref()).await?;

    Ok(web::Json(payslips.into_iter().map(payroll::with_recomputed_totals).collect::<Vec<_>>()))
}

#[get("/{payslip_id}")]
async fn get_payslip(identity: Identity, payslip: payslip::Model) -> ApiResult<impl Responder> {
    identity.require(Capability::SelfOrManager {
        user_id: payslip.employee_id,
        organization_id: Some(payslip.organization_id),
    })?;

    Ok(web::Json(payroll::with_recomputed_totals(payslip)))
}
