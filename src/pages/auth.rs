use actix_web::{get, post, web, Responder};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::{auth::{AuthError, Authority, Identity}, entity::{prelude::*, sea_orm_active_enums::UserStatus, user}, error::{ApiError, ApiResult}};

pub(super) fn config(cfg: &mut web::ServiceConfig) {
    cfg
        .service(login)
        .service(whoami);
}

#[derive(Debug, Serialize, Deserialize)]
struct Login {
    username: String,
    password: String,
}

pub(super) fn password_digest(username: &str, password: &str) -> Vec<u8> {
    Sha256::digest(format!("{password}:{username}")).to_vec()
}

#[post("/login")]
async fn login(db: web::Data<DatabaseConnection>, authority: web::Data<Authority>, credentials: web::Json<Login>) -> ApiResult<impl Responder> {
    let hashed_password = password_digest(&credentials.username, &credentials.password);

    let Some(user) = User::find()
        .filter(user::Column::Username.eq(&credentials.username))
        .filter(user::Column::Password.eq(hashed_password))
        .filter(user::Column::Status.eq(UserStatus::Active))
        .one(db.get_ref()).await?
    else {
        return Err(AuthError::InvalidCredentials.into());
    };

    info!(user_id = %user.id, role = ?user.role, "logged in");

    Ok(authority.issue_for(&user)?)
}

#[get("")]
async fn whoami(db: web::Data<DatabaseConnection>, identity: Identity) -> ApiResult<impl Responder> {
    let user = User::find_by_id(identity.user_id)
        .one(db.get_ref()).await?
        .ok_or(ApiError::NotFound("user"))?;

    Ok(web::Json(user))
}

#[cfg(test)]
mod tests {
    use actix_web::{body::MessageBody, http::{Method, StatusCode}, test, App};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use uuid::Uuid;

    use crate::{auth::tests::{bearer, user_with_role}, entity::sea_orm_active_enums::RoleType};

    use super::*;

    #[actix_web::test]
    async fn test_login() {
        let secret = b"secret";

        let user_password = "secret";
        let user = user::Model {
            password: password_digest("Bob", user_password),
            ..user_with_role(RoleType::Employee, Some(Uuid::new_v4()))
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                vec![ ],
                vec![ user.clone() ],
            ]);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Authority::new(secret)))
                .app_data(web::Data::new(db.into_connection()))
                .service(login)
        ).await;

        {
            let forbidden_req = test::TestRequest::default()
                .uri("/login")
                .method(Method::POST)
                .set_json(Login {
                    username: "username".to_owned(),
                    password: "password".to_owned(),
                })
                .to_request();

            let response = test::call_service(&app, forbidden_req).await;
            assert_eq!(response.status(), StatusCode::FORBIDDEN);
        }

        {
            let success_req = test::TestRequest::default()
                .uri("/login")
                .method(Method::POST)
                .set_json(Login {
                    username: user.username.clone(),
                    password: user_password.to_owned(),
                })
                .to_request();

            let response = test::call_service(&app, success_req).await;
            assert_eq!(response.status(), StatusCode::OK);

            let body = response.into_body().try_into_bytes().unwrap();
            let identity = Authority::new(secret).authorize(String::from_utf8_lossy(&body)).unwrap();
            assert_eq!(identity, Identity::from(&user));
        }
    }

    #[actix_web::test]
    async fn test_whoami_hides_password() {
        let secret = b"secret";

        let user = user::Model {
            password: password_digest("Bob", "secret"),
            ..user_with_role(RoleType::Client, Some(Uuid::new_v4()))
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![ user.clone() ]]);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Authority::new(secret)))
                .app_data(web::Data::new(db.into_connection()))
                .service(web::scope("/auth").service(whoami))
        ).await;

        let req = test::TestRequest::default()
            .uri("/auth")
            .insert_header(bearer(secret, &user))
            .to_request();

        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["id"], user.id.to_string());
        assert!(body.get("password").is_none());
    }
}
