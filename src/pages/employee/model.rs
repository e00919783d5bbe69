use super::*;

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct CreateEmployee {
    pub(super) username: String,
    pub(super) password: String,
    /// Required for admins, clients default to their own
    pub(super) organization_id: Option<Uuid>,
    pub(super) employment_type: EmploymentType,
    pub(super) pay_basis: PayBasis,
    pub(super) base_rate: i64,
}

impl CreateEmployee {
    pub(super) fn validate(&self) -> Result<(), ApiError> {
        if self.username.trim().is_empty() {
            return Err(ApiError::validation("`username` cannot be blank"));
        }

        if self.password.is_empty() {
            return Err(ApiError::validation("`password` cannot be empty"));
        }

        if self.base_rate < 0 {
            return Err(ApiError::validation("`base_rate` cannot be negative"));
        }

        if self.base_rate > MAX_BASE_RATE {
            return Err(ApiError::validation(format!("`base_rate` cannot exceed {MAX_BASE_RATE}")));
        }

        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(super) struct ListEmployees {
    pub(super) organization_id: Option<Uuid>,
    pub(super) status: Option<UserStatus>,
}
