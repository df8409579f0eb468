use crate::config::Config;
use crate::error::ApiError;
use crate::model::role::Role;
use crate::models::Claims;
use actix_web::{FromRequest, HttpRequest, dev::Payload, error::ErrorUnauthorized, web::Data};
use futures::future::{Ready, ready};
use jsonwebtoken::{DecodingKey, Validation, decode};

pub struct AuthUser {
    pub user_id: i64,
    pub username: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<i64>,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ErrorUnauthorized("Missing token"))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                return ready(Err(actix_web::error::ErrorInternalServerError(
                    "Config missing",
                )));
            }
        };

        let data = match decode::<Claims>(
            token,
            &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            &Validation::default(),
        ) {
            Ok(d) => d,
            Err(_) => return ready(Err(ErrorUnauthorized("Invalid token"))),
        };

        let role = match Role::parse(&data.claims.role) {
            Some(r) => r,
            None => return ready(Err(ErrorUnauthorized("Invalid role"))),
        };

        ready(Ok(AuthUser {
            user_id: data.claims.user_id,
            username: data.claims.sub,
            role,
            employee_id: data.claims.employee_id,
        }))
    }
}

impl AuthUser {
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(ApiError::forbidden("Admin only"))
        }
    }

    pub fn require_manager_or_admin(&self) -> Result<(), ApiError> {
        if matches!(self.role, Role::Admin | Role::Manager) {
            Ok(())
        } else {
            Err(ApiError::forbidden("Manager/Admin only"))
        }
    }

    /// The employee record this account is linked to, 404 when unlinked.
    pub fn linked_employee(&self) -> Result<i64, ApiError> {
        self.employee_id
            .ok_or_else(|| ApiError::not_found("Employee record not found"))
    }

    /// Attendance actions are self-service for every role: the target must
    /// be the caller's own linked employee record.
    pub fn require_self_employee(&self, employee_id: i64) -> Result<i64, ApiError> {
        let own = self.linked_employee()?;
        if own != employee_id {
            return Err(ApiError::forbidden(
                "You can only record attendance for yourself",
            ));
        }
        Ok(own)
    }

    /// Read access to per-employee data: own record, or any record for
    /// managers and admins.
    pub fn can_view_employee(&self, employee_id: i64) -> bool {
        matches!(self.role, Role::Admin | Role::Manager) || self.employee_id == Some(employee_id)
    }

    pub fn is_employee(&self) -> bool {
        self.role == Role::Employee
    }

    pub fn is_manager(&self) -> bool {
        self.role == Role::Manager
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::generate_access_token;
    use actix_web::test::TestRequest;

    fn test_config() -> Config {
        Config {
            database_url: String::new(),
            jwt_secret: "extractor-test-secret".to_string(),
            server_addr: String::new(),
            access_token_ttl: 900,
            refresh_token_ttl: 604800,
            rate_login_per_min: 60,
            rate_register_per_min: 30,
            rate_refresh_per_min: 30,
            rate_protected_per_min: 1000,
            api_prefix: "/api".to_string(),
        }
    }

    async fn extract(req: TestRequest) -> Result<AuthUser, actix_web::Error> {
        let req = req.app_data(Data::new(test_config())).to_http_request();
        AuthUser::from_request(&req, &mut Payload::None).await
    }

    #[actix_web::test]
    async fn missing_header_is_unauthorized() {
        assert!(extract(TestRequest::default()).await.is_err());
    }

    #[actix_web::test]
    async fn garbage_token_is_unauthorized() {
        let req = TestRequest::default().insert_header(("Authorization", "Bearer not-a-jwt"));
        assert!(extract(req).await.is_err());
    }

    #[actix_web::test]
    async fn valid_token_yields_the_user() {
        let token = generate_access_token(
            7,
            "alice".to_string(),
            "employee".to_string(),
            Some(5),
            "extractor-test-secret",
            900,
        );
        let req =
            TestRequest::default().insert_header(("Authorization", format!("Bearer {token}")));

        let user = extract(req).await.unwrap();
        assert_eq!(user.user_id, 7);
        assert_eq!(user.role, Role::Employee);
        assert_eq!(user.employee_id, Some(5));
    }

    #[test]
    fn role_gates() {
        let employee = AuthUser {
            user_id: 1,
            username: "alice".to_string(),
            role: Role::Employee,
            employee_id: Some(5),
        };
        assert!(employee.require_admin().is_err());
        assert!(employee.require_manager_or_admin().is_err());
        assert!(employee.require_self_employee(5).is_ok());
        assert!(matches!(
            employee.require_self_employee(6).unwrap_err(),
            ApiError::Forbidden(_)
        ));
        assert!(employee.can_view_employee(5));
        assert!(!employee.can_view_employee(6));

        let manager = AuthUser {
            user_id: 2,
            username: "bob".to_string(),
            role: Role::Manager,
            employee_id: Some(9),
        };
        assert!(manager.require_manager_or_admin().is_ok());
        assert!(manager.require_admin().is_err());
        assert!(manager.can_view_employee(6));
        // managers still check in only as themselves
        assert!(manager.require_self_employee(6).is_err());
    }

    #[test]
    fn unlinked_account_has_no_employee_record() {
        let admin = AuthUser {
            user_id: 3,
            username: "root".to_string(),
            role: Role::Admin,
            employee_id: None,
        };
        assert!(matches!(
            admin.linked_employee().unwrap_err(),
            ApiError::NotFound(_)
        ));
    }
}
