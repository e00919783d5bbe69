use actix_web::{get, post, put, web, HttpResponse, Responder};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};

use crate::{
    attendance,
    auth::{Capability, Identity},
    entity::sea_orm_active_enums::CheckMethod,
    error::{ApiError, ApiResult},
    pages::employee::Employee,
    period::PeriodQuery,
    utils,
};

use model::*;

mod model;

pub(super) fn config(cfg: &mut web::ServiceConfig) {
    cfg
        .service(check_in)
        .service(check_out)
        .service(today)
        .service(history)
        .service(monthly_summary)
        .service(correct_attendance);
}

#[post("/check-in")]
async fn check_in(db: web::Data<DatabaseConnection>, identity: Identity, payload: Option<web::Json<CheckPayload>>) -> ApiResult<impl Responder> {
    let organization_id = identity.member_of()?;
    let method = payload.map(|p| p.method()).unwrap_or_default();

    let record = attendance::check_in(db.get_ref(), identity.user_id, organization_id, Utc::now().fixed_offset(), method).await?;

    Ok(HttpResponse::Created().json(record))
}

#[post("/check-out")]
async fn check_out(db: web::Data<DatabaseConnection>, identity: Identity, payload: Option<web::Json<CheckPayload>>) -> ApiResult<impl Responder> {
    let method = payload.map(|p| p.method()).unwrap_or_default();

    let record = attendance::check_out(db.get_ref(), identity.user_id, Utc::now().fixed_offset(), method).await?;

    Ok(web::Json(record))
}

#[get("/today")]
async fn today(db: web::Data<DatabaseConnection>, identity: Identity) -> ApiResult<impl Responder> {
    let date = utils::utc_date(&Utc::now().fixed_offset());

    let record = attendance::find_for_day(db.get_ref(), identity.user_id, date).await?
        .ok_or(ApiError::NotFound("attendance record"))?;

    Ok(web::Json(record))
}

#[get("/history")]
async fn history(db: web::Data<DatabaseConnection>, identity: Identity, query: web::Query<PeriodQuery>) -> ApiResult<impl Responder> {
    let period = query.required()?;

    let records = attendance::find_for_period(db.get_ref(), identity.user_id, &period).await?;

    Ok(web::Json(records))
}

#[get("/monthly-summary/{employee_id}")]
async fn monthly_summary(db: web::Data<DatabaseConnection>, identity: Identity, employee: Employee, query: web::Query<PeriodQuery>) -> ApiResult<impl Responder> {
    identity.require(Capability::SelfOrManager { user_id: employee.id, organization_id: employee.organization_id })?;

    let period = query.required()?;

    let summary = attendance::monthly_summary(db.get_ref(), employee.id, &period).await?;

    Ok(web::Json(summary))
}

/// Managers fix or pre-fill a day: mark it absent, late or half-day, adjust times, add notes
#[put("/correction/{employee_id}")]
async fn correct_attendance(db: web::Data<DatabaseConnection>, identity: Identity, employee: Employee, payload: web::Json<attendance::Correction>) -> ApiResult<impl Responder> {
    let organization_id = employee.organization_id.ok_or(ApiError::NotFound("organization"))?;
    identity.require(Capability::OrgManager(organization_id))?;

    let record = attendance::correct(db.get_ref(), employee.id, organization_id, payload.into_inner(), identity.user_id).await?;

    Ok(web::Json(record))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::{Method, StatusCode}, test, App};
    use chrono::NaiveDate;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use uuid::Uuid;

    use crate::{
        auth::{tests::{bearer, user_with_role}, Authority},
        entity::{attendance as attendance_entity, leave_request, sea_orm_active_enums::{AttendanceStatus, RoleType}},
        payroll::tests::record,
        summary::MonthlySummary,
    };

    use super::*;

    fn today_record(user_id: Uuid) -> attendance_entity::Model {
        let mut record = record(user_id, utils::utc_date(&Utc::now().fixed_offset()), AttendanceStatus::Present);
        record.check_in_at = Some(Utc::now().fixed_offset() - chrono::Duration::hours(1));
        record.check_out_at = None;
        record.working_hours = None;
        record
    }

    #[actix_web::test]
    async fn test_check_in_twice() {
        let secret = b"secret";
        let employee = user_with_role(RoleType::Employee, Some(Uuid::new_v4()));

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                vec![ ],
                vec![ today_record(employee.id) ],
                vec![ today_record(employee.id) ],
            ]);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Authority::new(secret)))
                .app_data(web::Data::new(db.into_connection()))
                .service(web::scope("/attendance").configure(config))
        ).await;

        let req = test::TestRequest::default()
            .uri("/attendance/check-in")
            .method(Method::POST)
            .insert_header(bearer(secret, &employee))
            .set_json(CheckPayload { method: Some(CheckMethod::Mobile) })
            .to_request();

        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let req = test::TestRequest::default()
            .uri("/attendance/check-in")
            .method(Method::POST)
            .insert_header(bearer(secret, &employee))
            .to_request();

        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = test::read_body_json(response).await;
        assert_eq!(body["error"], "already checked in today");
    }

    #[actix_web::test]
    async fn test_check_out() {
        let secret = b"secret";
        let employee = user_with_role(RoleType::Employee, Some(Uuid::new_v4()));

        let open = today_record(employee.id);
        let closed = attendance_entity::Model {
            check_out_at: Some(Utc::now().fixed_offset()),
            working_hours: Some(1.0),
            ..open.clone()
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                vec![ ],
                vec![ open ],
                vec![ closed.clone() ],
            ]);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Authority::new(secret)))
                .app_data(web::Data::new(db.into_connection()))
                .service(web::scope("/attendance").configure(config))
        ).await;

        // Nothing recorded today
        let req = test::TestRequest::default()
            .uri("/attendance/check-out")
            .method(Method::POST)
            .insert_header(bearer(secret, &employee))
            .to_request();

        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::default()
            .uri("/attendance/check-out")
            .method(Method::POST)
            .insert_header(bearer(secret, &employee))
            .to_request();

        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::OK);

        let returned: serde_json::Value = test::read_body_json(response).await;
        assert_eq!(returned["id"], closed.id.to_string());
        assert_eq!(returned["working_hours"], 1.0);
    }

    #[actix_web::test]
    async fn test_monthly_summary() {
        let secret = b"secret";
        let org = Uuid::new_v4();
        let employee = user_with_role(RoleType::Employee, Some(org));
        let coworker = user_with_role(RoleType::Employee, Some(org));
        let client = user_with_role(RoleType::Client, Some(org));

        let june_3 = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                // Coworker asking
                vec![ employee.clone() ],
                // Invalid month
                vec![ employee.clone() ],
                // Client asking
                vec![ employee.clone() ],
            ])
            .append_query_results([vec![ record(employee.id, june_3, AttendanceStatus::Late) ]])
            .append_query_results([Vec::<leave_request::Model>::new()]);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Authority::new(secret)))
                .app_data(web::Data::new(db.into_connection()))
                .service(web::scope("/attendance").configure(config))
        ).await;

        let req = test::TestRequest::default()
            .uri(&format!("/attendance/monthly-summary/{}?month=6&year=2024", employee.id))
            .insert_header(bearer(secret, &coworker))
            .to_request();

        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::default()
            .uri(&format!("/attendance/monthly-summary/{}?month=13&year=2024", employee.id))
            .insert_header(bearer(secret, &employee))
            .to_request();

        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::default()
            .uri(&format!("/attendance/monthly-summary/{}?month=6&year=2024", employee.id))
            .insert_header(bearer(secret, &client))
            .to_request();

        let summary: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(summary, serde_json::to_value(MonthlySummary { present: 1, absent: 19, leave: 0, total: 20 }).unwrap());
    }

    #[actix_web::test]
    async fn test_correct_attendance() {
        let secret = b"secret";
        let org = Uuid::new_v4();
        let employee = user_with_role(RoleType::Employee, Some(org));
        let stranger = user_with_role(RoleType::Client, Some(Uuid::new_v4()));
        let client = user_with_role(RoleType::Client, Some(org));

        let june_3 = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let mut absent = record(employee.id, june_3, AttendanceStatus::Absent);
        absent.check_in_at = None;
        absent.check_out_at = None;
        absent.working_hours = None;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                vec![ employee.clone() ],
                vec![ employee.clone() ],
                vec![ employee.clone() ],
            ])
            .append_query_results([
                vec![ ],
                vec![ absent.clone() ],
            ]);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Authority::new(secret)))
                .app_data(web::Data::new(db.into_connection()))
                .service(web::scope("/attendance").configure(config))
        ).await;

        let payload = attendance::Correction {
            date: june_3,
            status: AttendanceStatus::Absent,
            notes: None,
            check_in_at: None,
            check_out_at: None,
        };

        // Employees cannot correct their own days
        let req = test::TestRequest::default()
            .uri(&format!("/attendance/correction/{}", employee.id))
            .method(Method::PUT)
            .insert_header(bearer(secret, &employee))
            .set_json(&payload)
            .to_request();

        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::default()
            .uri(&format!("/attendance/correction/{}", employee.id))
            .method(Method::PUT)
            .insert_header(bearer(secret, &stranger))
            .set_json(&payload)
            .to_request();

        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::default()
            .uri(&format!("/attendance/correction/{}", employee.id))
            .method(Method::PUT)
            .insert_header(bearer(secret, &client))
            .set_json(&payload)
            .to_request();

        let returned: attendance_entity::Model = test::call_and_read_body_json(&app, req).await;
        assert_eq!(returned, absent);
    }
}
