use super::*;

impl FromRequest for leave_request::Model {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            let leave_id = path_id(&req, "leave_id")?;

            let db = req.app_data::<web::Data<DatabaseConnection>>().expect("DatabaseConnection must be attached");

            let Some(leave) = LeaveRequest::find_by_id(leave_id)
                .one(db.get_ref()).await.map_err(ApiError::from)?
            else {
                return Err(ApiError::NotFound("leave request").into())
            };

            Ok(leave)
        })
    }
}
