use crate::auth::auth::AuthUser;
use crate::auth::jwt::verify_token;
use crate::config::Config;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};
use serde_json::json;

fn reject(req: ServiceRequest, message: &str) -> Result<ServiceResponse<BoxBody>, Error> {
    let resp = HttpResponse::Unauthorized().json(json!({ "message": message }));
    Ok(req.into_response(resp.map_into_boxed_body()))
}

/// Validates the bearer access token and stores the caller as `AuthUser`.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let secret = req
        .app_data::<Data<Config>>()
        .map(|config| config.jwt_secret.clone())
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?;

    let token = match req
        .headers()
        .get("Authorization")
        .map(|h| h.to_str().map(str::to_owned))
    {
        None => return reject(req, "Missing Authorization header"),
        Some(Err(_)) => return reject(req, "Invalid Authorization header encoding"),
        Some(Ok(value)) => match value.strip_prefix("Bearer ") {
            Some(t) => t.to_owned(),
            None => return reject(req, "Authorization header must start with Bearer"),
        },
    };

    let claims = match verify_token(&token, &secret) {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!(error = %e, "Rejected token");
            return reject(req, "Invalid or expired token");
        }
    };

    let auth_user = match AuthUser::from_claims(claims) {
        Ok(user) => user,
        Err(e) => return reject(req, &e.to_string()),
    };

    req.extensions_mut().insert(auth_user);

    next.call(req).await
}
