use actix_web::{dev, get, post, web, FromRequest, HttpRequest, HttpResponse, Responder};
use chrono::{Datelike as _, NaiveDate, Utc};
use futures_util::future::LocalBoxFuture;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::{Capability, Identity, Manager},
    entity::{leave_request, prelude::*, sea_orm_active_enums::{LeaveStatus, LeaveType}},
    error::{ApiError, ApiResult},
    leave::{self, LeaveApplication},
    pages::{employee::Employee, find_organization, path_id},
};

use model::*;

mod extractor;
mod model;

pub(super) fn config(cfg: &mut web::ServiceConfig) {
    cfg
        .service(apply_leave)
        .service(my_leave)
        .service(organization_leave)
        .service(leave_balance)
        .service(approve_leave)
        .service(reject_leave);
}

#[post("/apply")]
async fn apply_leave(db: web::Data<DatabaseConnection>, identity: Identity, payload: web::Json<ApplyLeave>) -> ApiResult<impl Responder> {
    let organization_id = identity.member_of()?;

    let leave = leave::apply(db.get_ref(), identity.user_id, organization_id, payload.into_inner().into()).await?;

    Ok(HttpResponse::Created().json(leave))
}

#[get("")]
async fn my_leave(db: web::Data<DatabaseConnection>, identity: Identity) -> ApiResult<impl Responder> {
    let leaves = LeaveRequest::find()
        .filter(leave_request::Column::UserId.eq(identity.user_id))
        .order_by_desc(leave_request::Column::StartDate)
        .all(db.get_ref()).await?;

    Ok(web::Json(leaves))
}

#[get("/organization")]
async fn organization_leave(db: web::Data<DatabaseConnection>, manager: Manager, query: web::Query<OrganizationLeaveQuery>) -> ApiResult<impl Responder> {
    let organization_id = manager.managed_organization(query.organization_id)?;

    let mut select = LeaveRequest::find()
        .filter(leave_request::Column::OrganizationId.eq(organization_id));

    if let Some(status) = query.status {
        select = select.filter(leave_request::Column::Status.eq(status));
    }

    let leaves = select
        .order_by_desc(leave_request::Column::CreatedAt)
        .all(db.get_ref()).await?;

    Ok(web::Json(leaves))
}

#[get("/balance/{employee_id}")]
async fn leave_balance(db: web::Data<DatabaseConnection>, identity: Identity, employee: Employee, query: web::Query<BalanceQuery>) -> ApiResult<impl Responder> {
    identity.require(Capability::SelfOrManager { user_id: employee.id, organization_id: employee.organization_id })?;

    let year = query.year.unwrap_or_else(|| Utc::now().year());
    let organization_id = employee.organization_id.ok_or(ApiError::NotFound("organization"))?;
    let organization = find_organization(db.get_ref(), organization_id).await?;

    let approved = LeaveRequest::find()
        .filter(leave_request::Column::UserId.eq(employee.id))
        .filter(leave_request::Column::Status.eq(LeaveStatus::Approved))
        .all(db.get_ref()).await?;

    let balances = leave::balances(&organization.leave_policy, &approved, year)?;

    Ok(web::Json(balances))
}

#[post("/{leave_id}/approve")]
async fn approve_leave(db: web::Data<DatabaseConnection>, manager: Manager, leave: leave_request::Model) -> ApiResult<impl Responder> {
    manager.require(Capability::OrgManager(leave.organization_id))?;

    let leave = leave::decide(db.get_ref(), &leave, manager.user_id, None).await?;

    Ok(web::Json(leave))
}

#[post("/{leave_id}/reject")]
async fn reject_leave(db: web::Data<DatabaseConnection>, manager: Manager, leave: leave_request::Model, payload: web::Json<RejectLeave>) -> ApiResult<impl Responder> {
    manager.require(Capability::OrgManager(leave.organization_id))?;

    if payload.reason.trim().is_empty() {
        return Err(ApiError::validation("`reason` cannot be blank"));
    }

    let leave = leave::decide(db.get_ref(), &leave, manager.user_id, Some(payload.into_inner().reason)).await?;

    Ok(web::Json(leave))
}
