use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::error::AppError;
use crate::model::role::Role;
use crate::models::{Claims, TokenType};
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}

impl AuthUser {
    /// Only access tokens authenticate API calls.
    pub fn from_claims(claims: Claims) -> Result<Self, AppError> {
        if claims.token_type != TokenType::Access {
            return Err(AppError::Unauthorized("Access token required".into()));
        }

        let role = Role::from_id(claims.role)
            .ok_or_else(|| AppError::Unauthorized("Invalid role".into()))?;

        Ok(AuthUser {
            user_id: claims.user_id,
            username: claims.sub,
            role,
            employee_id: claims.employee_id,
        })
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(AppError::forbidden("Admin only"))
        }
    }

    pub fn require_hr_or_admin(&self) -> Result<(), AppError> {
        if self.role.is_administrator() {
            Ok(())
        } else {
            Err(AppError::forbidden("HR/Admin only"))
        }
    }

    pub fn is_administrator(&self) -> bool {
        self.role.is_administrator()
    }

    /// The caller's own employee profile.
    pub fn own_employee_id(&self) -> Result<u64, AppError> {
        self.employee_id
            .ok_or_else(|| AppError::forbidden("No employee profile"))
    }

    /// Employee whose data the caller wants to see. Administrators may name
    /// anyone; everyone else is limited to their own profile.
    pub fn target_employee(&self, requested: Option<u64>) -> Result<u64, AppError> {
        match requested {
            Some(id) if self.is_administrator() => Ok(id),
            Some(id) if Some(id) == self.employee_id => Ok(id),
            Some(_) => Err(AppError::forbidden("Cannot access another employee's data")),
            None => self.own_employee_id(),
        }
    }
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // Set by the auth middleware on protected scopes.
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let Some(token) = bearer_token(req) else {
            return ready(Err(AppError::Unauthorized("Missing token".into())));
        };

        let Some(config) = req.app_data::<Data<Config>>() else {
            return ready(Err(AppError::Internal("Config missing".into())));
        };

        let result = verify_token(token, &config.jwt_secret)
            .map_err(|_| AppError::Unauthorized("Invalid token".into()))
            .and_then(AuthUser::from_claims);

        ready(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role, employee_id: Option<u64>) -> AuthUser {
        AuthUser {
            user_id: 1,
            username: "u".into(),
            role,
            employee_id,
        }
    }

    #[test]
    fn employees_only_see_themselves() {
        let me = user(Role::Employee, Some(5));
        assert_eq!(me.target_employee(None).unwrap(), 5);
        assert_eq!(me.target_employee(Some(5)).unwrap(), 5);
        assert!(matches!(me.target_employee(Some(6)), Err(AppError::Forbidden(_))));
    }

    #[test]
    fn administrators_may_pick_any_employee() {
        let hr = user(Role::Hr, None);
        assert_eq!(hr.target_employee(Some(6)).unwrap(), 6);
        assert!(hr.target_employee(None).is_err());
    }

    #[test]
    fn role_guards() {
        assert!(user(Role::Admin, None).require_admin().is_ok());
        assert!(user(Role::Hr, None).require_admin().is_err());
        assert!(user(Role::Hr, None).require_hr_or_admin().is_ok());
        assert!(user(Role::Employee, Some(1)).require_hr_or_admin().is_err());
    }

    #[test]
    fn refresh_claims_do_not_authenticate() {
        let claims = Claims {
            user_id: 1,
            sub: "u".into(),
            role: 3,
            exp: 0,
            jti: "j".into(),
            token_type: TokenType::Refresh,
            employee_id: None,
        };
        assert!(AuthUser::from_claims(claims).is_err());
    }
}
