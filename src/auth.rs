use std::ops::Deref;

use actix_web::{body, dev, http::StatusCode, web, FromRequest, HttpRequest, HttpResponse, ResponseError};
use chrono::{Duration, Local};
use futures_util::future::LocalBoxFuture;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::entity::{sea_orm_active_enums::RoleType, user};

/// Issues and verifies the bearer tokens carried by every request
pub struct Authority {
    jwt_key: (EncodingKey, DecodingKey),
}

impl Authority {
    pub fn new(jwt_key: &[u8]) -> Self {
        Self {
            jwt_key: (EncodingKey::from_secret(jwt_key), DecodingKey::from_secret(jwt_key))
        }
    }

    /// Issue a token for specified user with 1 week of expiration time
    pub fn issue_for(&self, user: &user::Model) -> Result<String, AuthError> {
        let claims = Claims {
            exp: (Local::now() + Duration::weeks(1)).timestamp(),
            data: Identity::from(user),
        };

        Ok(encode(&Header::default(), &claims, &self.jwt_key.0)?)
    }

    pub fn authorize(&self, token: impl AsRef<str>) -> Result<Identity, AuthError> {
        let payload = decode::<Claims<Identity>>(token.as_ref(), &self.jwt_key.1, &Validation::default())?;

        Ok(payload.claims.data)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims<T> {
    exp: i64,
    data: T,
}

/// Who is calling, as proven by the token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: Uuid,
    pub organization_id: Option<Uuid>,
    pub role: RoleType,
}

impl From<&user::Model> for Identity {
    fn from(user: &user::Model) -> Self {
        Self {
            user_id: user.id,
            organization_id: user.organization_id,
            role: user.role,
        }
    }
}

/// What an operation demands of its caller. Admins satisfy every capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Admin,
    /// The client role of this organization
    OrgManager(Uuid),
    /// The user themselves, or a manager of their organization
    SelfOrManager {
        user_id: Uuid,
        organization_id: Option<Uuid>,
    },
}

impl Identity {
    pub fn can(&self, capability: Capability) -> bool {
        if self.role == RoleType::Admin {
            return true;
        }

        match capability {
            Capability::Admin => false,
            Capability::OrgManager(organization_id) =>
                self.role == RoleType::Client && self.organization_id == Some(organization_id),
            Capability::SelfOrManager { user_id, organization_id } =>
                self.user_id == user_id
                    || organization_id.is_some_and(|org| self.can(Capability::OrgManager(org))),
        }
    }

    pub fn require(&self, capability: Capability) -> Result<(), AuthError> {
        if self.can(capability) {
            Ok(())
        } else {
            Err(AuthError::Forbidden)
        }
    }

    /// Organization a manager acts upon. Clients are bound to their own, admins must name one.
    pub fn managed_organization(&self, requested: Option<Uuid>) -> Result<Uuid, AuthError> {
        let organization_id = match (self.role, requested) {
            (RoleType::Admin, Some(org)) => org,
            (RoleType::Admin, None) => return Err(AuthError::OrganizationRequired),
            (_, Some(org)) => org,
            (_, None) => self.organization_id.ok_or(AuthError::Forbidden)?,
        };

        self.require(Capability::OrgManager(organization_id))?;

        Ok(organization_id)
    }

    /// Organization of an employee acting on their own records
    pub fn member_of(&self) -> Result<Uuid, AuthError> {
        self.organization_id.ok_or(AuthError::Forbidden)
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("invalid token")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("forbidden")]
    Forbidden,

    #[error("`organization_id` is required")]
    OrganizationRequired,
}

impl ResponseError for AuthError {
    fn error_response(&self) -> HttpResponse<body::BoxBody> {
        HttpResponse::build(self.status_code())
            .json(serde_json::json!({ "error": self.to_string() }))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Unauthorized | AuthError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            AuthError::InvalidCredentials | AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::OrganizationRequired => StatusCode::BAD_REQUEST,
        }
    }
}

impl FromRequest for Identity {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            // Basically grabs the value after space ( ) from `Authorization` header
            // Example: Bearer sometoken
            //                 ^ grabs this value
            let Some(Ok(Some((_, token)))) = req.headers()
                .get("Authorization")
                .map(|v|
                    v.to_str()
                        .map(|str| str.split_once(" "))
                )
            else {
                return Err(AuthError::Unauthorized.into())
            };

            let authority = req.app_data::<web::Data<Authority>>().expect("Authority must be attached");
            let identity = authority.authorize(token)?;

            Ok(identity)
        })
    }
}

/// Platform administrator
pub struct Admin(pub Identity);

impl Deref for Admin {
    type Target = Identity;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequest for Admin {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            let identity = Identity::from_request(&req, &mut dev::Payload::None).await?;

            if identity.role != RoleType::Admin {
                return Err(AuthError::Forbidden.into())
            }

            Ok(Self(identity))
        })
    }
}

/// Admin or client; which organization they may touch is checked per operation
pub struct Manager(pub Identity);

impl Deref for Manager {
    type Target = Identity;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequest for Manager {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            let identity = Identity::from_request(&req, &mut dev::Payload::None).await?;

            if !matches!(identity.role, RoleType::Admin | RoleType::Client) {
                return Err(AuthError::Forbidden.into())
            }

            Ok(Self(identity))
        })
    }
}
