use std::ops::Deref;

use super::*;

/// Employee named by the `employee_id` path segment
pub(in crate::pages) struct Employee(pub(in crate::pages) user::Model);

impl Deref for Employee {
    type Target = user::Model;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequest for Employee {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            let employee_id = path_id(&req, "employee_id")?;

            let db = req.app_data::<web::Data<DatabaseConnection>>().expect("DatabaseConnection must be attached");

            let Some(employee) = User::find_by_id(employee_id)
                .filter(user::Column::Role.eq(RoleType::Employee))
                .one(db.get_ref()).await.map_err(ApiError::from)?
            else {
                return Err(ApiError::NotFound("employee").into())
            };

            Ok(Self(employee))
        })
    }
}
