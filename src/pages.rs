use actix_web::web;
use sea_orm::{ConnectionTrait, EntityTrait};
use uuid::Uuid;

use crate::{entity::{self, prelude::*}, error::ApiError};

mod auth;
mod attendance;
mod employee;
mod leave;
mod organization;
mod payroll;
mod reports;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg
        .service(web::scope("/auth")
            .configure(auth::config))
        .service(web::scope("/attendance")
            .configure(attendance::config))
        .service(web::scope("/payroll")
            .configure(payroll::config))
        .service(web::scope("/payslips")
            .configure(payroll::payslip_config))
        .service(web::scope("/leave")
            .configure(leave::config))
        .service(web::scope("/reports")
            .configure(reports::config))
        .service(web::scope("/organizations")
            .configure(organization::config))
        .service(web::scope("/employees")
            .configure(employee::config));
}

/// Parses the `{name}` path segment of a request routed under it
fn path_id(req: &actix_web::HttpRequest, name: &'static str) -> Result<Uuid, ApiError> {
    let segment = req.match_info().get(name)
        .unwrap_or_else(|| panic!("This extractor must be used under `{name}` path"));

    segment.parse().map_err(|_| ApiError::validation(format!("invalid `{name}`")))
}

async fn find_organization<C: ConnectionTrait>(db: &C, organization_id: Uuid) -> Result<entity::organization::Model, ApiError> {
    Organization::find_by_id(organization_id)
        .one(db).await?
        .ok_or(ApiError::NotFound("organization"))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::web;

    use crate::notify::{tests::RecordingNotifier, Notifier};

    pub(super) fn notifier() -> (Arc<RecordingNotifier>, web::Data<dyn Notifier>) {
        let recording = Arc::new(RecordingNotifier::default());
        let data: Arc<dyn Notifier> = recording.clone();

        (recording, web::Data::from(data))
    }
}
