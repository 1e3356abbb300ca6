use crate::{
    auth::{
        auth::AuthUser,
        jwt::{TokenSubject, generate_access_token, generate_refresh_token, verify_token},
        password::{hash_password, verify_password},
    },
    config::Config,
    error::{AppError, AppResult},
    model::{role::Role, user::User},
    models::{Claims, LoginReq, RegisterReq, TokenPair, TokenType},
};
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, info, instrument, warn};

fn token_error(e: jsonwebtoken::errors::Error) -> AppError {
    AppError::Internal(format!("token encoding failed: {e}"))
}

fn bearer(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// Issues a token pair and records the refresh token's `jti`.
async fn issue_tokens(
    subject: &TokenSubject,
    pool: &MySqlPool,
    config: &Config,
) -> AppResult<TokenPair> {
    let access_token = generate_access_token(subject, &config.jwt_secret, config.access_token_ttl)
        .map_err(token_error)?;
    let (refresh_token, refresh_claims) =
        generate_refresh_token(subject, &config.jwt_secret, config.refresh_token_ttl)
            .map_err(token_error)?;

    debug!(user_id = subject.user_id, jti = %refresh_claims.jti, "Storing refresh token");

    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (user_id, jti, expires_at)
        VALUES (?, ?, FROM_UNIXTIME(?))
        "#,
    )
    .bind(subject.user_id)
    .bind(&refresh_claims.jti)
    .bind(refresh_claims.exp as i64)
    .execute(pool)
    .await?;

    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}

/// Validated refresh-token claims from the Authorization header.
fn refresh_claims(req: &HttpRequest, config: &Config) -> Option<Claims> {
    let claims = verify_token(bearer(req)?, &config.jwt_secret).ok()?;
    (claims.token_type == TokenType::Refresh).then_some(claims)
}

/// Register a login for an employee (HR/Admin)
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterReq,
    responses(
        (status = 201, description = "User registered", body = Object, example = json!({
            "message": "User registered successfully"
        })),
        (status = 400, description = "Empty username or password, or unknown role"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Username already taken")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
#[instrument(name = "auth_register", skip(auth, pool, payload), fields(username = %payload.username))]
pub async fn register(
    auth: AuthUser,
    payload: web::Json<RegisterReq>,
    pool: web::Data<MySqlPool>,
) -> AppResult<impl Responder> {
    auth.require_hr_or_admin()?;

    let role = match payload.role_id {
        None => Role::Employee,
        Some(id) => Role::from_id(id).ok_or_else(|| AppError::bad_request("Unknown role"))?,
    };
    if role == Role::Admin {
        auth.require_admin()?;
    }

    let username = payload.username.trim().to_lowercase();

    if username.is_empty() || payload.password.is_empty() {
        return Err(AppError::bad_request("Username and password must not be empty"));
    }

    let hashed = hash_password(&payload.password)
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))?;

    let result = sqlx::query(
        r#"INSERT INTO users (username, password, role_id, employee_id) VALUES (?, ?, ?, ?)"#,
    )
    .bind(&username)
    .bind(hashed)
    .bind(role.id())
    .bind(payload.employee_id)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => {
            info!("User registered");
            Ok(HttpResponse::Created().json(json!({
                "message": "User registered successfully"
            })))
        }
        Err(e) if AppError::is_unique_violation(&e) => {
            Err(AppError::Conflict("Username already taken".into()))
        }
        Err(e) => Err(e.into()),
    }
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReq,
    responses(
        (status = 200, description = "Logged in", body = TokenPair),
        (status = 400, description = "Username or password required"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(pool, config, payload),
    fields(username = %payload.username)
)]
pub async fn login(
    payload: web::Json<LoginReq>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> AppResult<impl Responder> {
    info!("Login request received");

    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return Err(AppError::bad_request("Username or password required"));
    }

    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, password, role_id, employee_id
        FROM users
        WHERE username = ?
        "#,
    )
    .bind(payload.username.trim().to_lowercase())
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| {
        info!("Invalid credentials: user not found");
        AppError::Unauthorized("Invalid credentials".into())
    })?;

    if let Err(e) = verify_password(&payload.password, &user.password) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    let subject = TokenSubject {
        user_id: user.id,
        username: user.username,
        role: user.role_id,
        employee_id: user.employee_id,
    };
    let tokens = issue_tokens(&subject, pool.get_ref(), &config).await?;

    // Not fatal for the login itself.
    if let Err(e) = sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = ?")
        .bind(user.id)
        .execute(pool.get_ref())
        .await
    {
        warn!(error = %e, "Failed to update last_login_at");
    }

    info!("Login successful");
    Ok(HttpResponse::Ok().json(tokens))
}

/// Rotates a refresh token: the presented one is revoked and a new pair issued.
#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "New token pair", body = TokenPair),
        (status = 401, description = "Missing, invalid or revoked refresh token")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn refresh_token(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> AppResult<impl Responder> {
    let claims = refresh_claims(&req, &config)
        .ok_or_else(|| AppError::Unauthorized("Invalid refresh token".into()))?;

    // Revoke first; losing the race to another refresh means the token is spent.
    let revoked = sqlx::query(
        r#"
        UPDATE refresh_tokens
        SET revoked = 1
        WHERE jti = ? AND revoked = 0 AND expires_at > NOW()
        "#,
    )
    .bind(&claims.jti)
    .execute(pool.get_ref())
    .await?;

    if revoked.rows_affected() == 0 {
        return Err(AppError::Unauthorized("Refresh token revoked or unknown".into()));
    }

    let tokens = issue_tokens(&TokenSubject::from(&claims), pool.get_ref(), &config).await?;
    Ok(HttpResponse::Ok().json(tokens))
}

/// Revokes the presented refresh token. Always answers 204.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 204, description = "Logged out")),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn logout(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    if let Some(claims) = refresh_claims(&req, &config) {
        if let Err(e) = sqlx::query("UPDATE refresh_tokens SET revoked = 1 WHERE jti = ?")
            .bind(&claims.jti)
            .execute(pool.get_ref())
            .await
        {
            warn!(error = %e, "Failed to revoke refresh token");
        }
    }

    HttpResponse::NoContent().finish()
}
