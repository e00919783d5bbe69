use actix_web::{dev, get, post, web, FromRequest, HttpRequest, HttpResponse, Responder};
use chrono::Utc;
use futures_util::future::LocalBoxFuture;
use sea_orm::{ActiveValue::{Set, Unchanged}, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::{Capability, Manager},
    consts::MAX_BASE_RATE,
    entity::{prelude::*, sea_orm_active_enums::{EmploymentType, PayBasis, RoleType, UserStatus}, user},
    error::{is_unique_violation, ApiError, ApiResult, Conflict},
    pages::{auth::password_digest, find_organization, path_id},
};

use model::*;

pub(super) use extractor::Employee;

mod extractor;
mod model;

pub(super) fn config(cfg: &mut web::ServiceConfig) {
    cfg
        .service(create_employee)
        .service(list_employees)
        .service(deactivate_employee);
}

#[post("")]
async fn create_employee(db: web::Data<DatabaseConnection>, manager: Manager, payload: web::Json<CreateEmployee>) -> ApiResult<impl Responder> {
    let organization_id = manager.managed_organization(payload.organization_id)?;
    payload.validate()?;

    find_organization(db.get_ref(), organization_id).await?;

    let payload = payload.into_inner();
    let now = Utc::now().fixed_offset();

    let model = user::ActiveModel {
        created_at: Set(now),
        updated_at: Set(now),
        organization_id: Set(Some(organization_id)),
        password: Set(password_digest(&payload.username, &payload.password)),
        username: Set(payload.username),
        role: Set(RoleType::Employee),
        employment_type: Set(payload.employment_type),
        pay_basis: Set(payload.pay_basis),
        base_rate: Set(payload.base_rate),
        status: Set(UserStatus::Active),
        ..Default::default()
    };

    let employee = User::insert(model)
        .exec_with_returning(db.get_ref()).await
        .map_err(|err| if is_unique_violation(&err) {
            Conflict::UsernameTaken.into()
        } else {
            ApiError::from(err)
        })?;

    info!(employee_id = %employee.id, %organization_id, by = %manager.user_id, "employee hired");

    Ok(HttpResponse::Created().json(employee))
}

#[get("")]
async fn list_employees(db: web::Data<DatabaseConnection>, manager: Manager, query: web::Query<ListEmployees>) -> ApiResult<impl Responder> {
    let organization_id = manager.managed_organization(query.organization_id)?;

    let mut select = User::find()
        .filter(user::Column::OrganizationId.eq(organization_id))
        .filter(user::Column::Role.eq(RoleType::Employee));

    if let Some(status) = query.status {
        select = select.filter(user::Column::Status.eq(status));
    }

    let employees = select
        .order_by_asc(user::Column::Username)
        .all(db.get_ref()).await?;

    Ok(web::Json(employees))
}

/// Employees are never deleted, their payslips and attendance stay attributable
#[post("/{employee_id}/deactivate")]
async fn deactivate_employee(db: web::Data<DatabaseConnection>, manager: Manager, employee: Employee) -> ApiResult<impl Responder> {
    let organization_id = employee.organization_id.ok_or(ApiError::NotFound("organization"))?;
    manager.require(Capability::OrgManager(organization_id))?;

    let employee = User::update(user::ActiveModel {
        id: Unchanged(employee.id),
        updated_at: Set(Utc::now().fixed_offset()),
        status: Set(UserStatus::Inactive),
        ..Default::default()
    }).exec(db.get_ref()).await?;

    info!(employee_id = %employee.id, by = %manager.user_id, "employee deactivated");

    Ok(web::Json(employee))
}
