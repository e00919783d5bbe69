use actix_web::{get, post, put, web, HttpResponse, Responder};
use chrono::Utc;
use sea_orm::{ActiveValue::{Set, Unchanged}, DatabaseConnection, EntityTrait};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::{Admin, Capability, Identity},
    entity::{organization, prelude::*},
    error::{ApiError, ApiResult},
    leave::LeavePolicy,
    pages::find_organization,
    payroll::RatePolicy,
};

pub(super) fn config(cfg: &mut web::ServiceConfig) {
    cfg
        .service(create_organization)
        .service(get_organization)
        .service(update_policy);
}

#[derive(Debug, Serialize, Deserialize)]
struct CreateOrganization {
    name: String,
    #[serde(default)]
    rate_policy: RatePolicy,
    #[serde(default)]
    leave_policy: LeavePolicy,
}

#[derive(Debug, Serialize, Deserialize)]
struct UpdatePolicy {
    rate_policy: RatePolicy,
    leave_policy: LeavePolicy,
}

#[post("")]
async fn create_organization(db: web::Data<DatabaseConnection>, admin: Admin, payload: web::Json<CreateOrganization>) -> ApiResult<impl Responder> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::validation("`name` cannot be blank"));
    }
    payload.rate_policy.validate().map_err(ApiError::Validation)?;

    let payload = payload.into_inner();
    let now = Utc::now().fixed_offset();

    let organization = Organization::insert(organization::ActiveModel {
        created_at: Set(now),
        updated_at: Set(now),
        name: Set(payload.name),
        rate_policy: Set(payload.rate_policy),
        leave_policy: Set(payload.leave_policy),
        ..Default::default()
    }).exec_with_returning(db.get_ref()).await?;

    info!(organization_id = %organization.id, by = %admin.user_id, "organization created");

    Ok(HttpResponse::Created().json(organization))
}

#[get("/{organization_id}")]
async fn get_organization(db: web::Data<DatabaseConnection>, identity: Identity, organization_id: web::Path<Uuid>) -> ApiResult<impl Responder> {
    let organization_id = organization_id.into_inner();
    identity.require(Capability::OrgManager(organization_id))?;

    let organization = find_organization(db.get_ref(), organization_id).await?;

    Ok(web::Json(organization))
}

/// Replaces both policies; payslips already generated keep the figures they were computed with
#[put("/{organization_id}/policy")]
async fn update_policy(db: web::Data<DatabaseConnection>, identity: Identity, organization_id: web::Path<Uuid>, payload: web::Json<UpdatePolicy>) -> ApiResult<impl Responder> {
    let organization_id = organization_id.into_inner();
    identity.require(Capability::OrgManager(organization_id))?;

    payload.rate_policy.validate().map_err(ApiError::Validation)?;

    find_organization(db.get_ref(), organization_id).await?;

    let payload = payload.into_inner();

    let organization = Organization::update(organization::ActiveModel {
        id: Unchanged(organization_id),
        updated_at: Set(Utc::now().fixed_offset()),
        rate_policy: Set(payload.rate_policy),
        leave_policy: Set(payload.leave_policy),
        ..Default::default()
    }).exec(db.get_ref()).await?;

    info!(%organization_id, by = %identity.user_id, "organization policy replaced");

    Ok(web::Json(organization))
}
