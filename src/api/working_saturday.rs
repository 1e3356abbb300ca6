use crate::{
    aggregator::month_bounds,
    api::attendance::local_now,
    auth::auth::AuthUser,
    error::{AppError, AppResult},
    model::working_saturday::WorkingSaturday,
};
use actix_web::{HttpResponse, Responder, web};
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct SaturdayRange {
    /// First date of the range (defaults to the start of the current month)
    #[schema(example = "2025-03-01", format = "date", value_type = Option<String>)]
    pub from: Option<NaiveDate>,
    /// Last date of the range (defaults to the end of the current month)
    #[schema(example = "2025-03-31", format = "date", value_type = Option<String>)]
    pub to: Option<NaiveDate>,
}

/// Working-Saturday overrides within a date range
#[utoipa::path(
    get,
    path = "/api/working-saturdays",
    params(SaturdayRange),
    responses(
        (status = 200, description = "Overrides in the range", body = [WorkingSaturday]),
        (status = 400, description = "Range end before start"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Working Saturdays"
)]
pub async fn list_working_saturdays(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<SaturdayRange>,
) -> AppResult<impl Responder> {
    let today = local_now().date();
    let (month_start, month_end) = month_bounds(today.month(), today.year())?;
    let from = query.from.unwrap_or(month_start);
    let to = query.to.unwrap_or(month_end);

    if from > to {
        return Err(AppError::bad_request("'from' must not be after 'to'"));
    }

    let saturdays = sqlx::query_as::<_, WorkingSaturday>(
        r#"
        SELECT date, is_working
        FROM working_saturdays
        WHERE date BETWEEN ? AND ?
        ORDER BY date
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(saturdays))
}

/// Mark a Saturday as working or non-working (Admin)
#[utoipa::path(
    put,
    path = "/api/working-saturdays",
    request_body = WorkingSaturday,
    responses(
        (status = 200, description = "Override saved", body = WorkingSaturday),
        (status = 400, description = "Date is not a Saturday"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Working Saturdays"
)]
pub async fn set_working_saturday(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<WorkingSaturday>,
) -> AppResult<impl Responder> {
    auth.require_admin()?;
    let saturday = payload.into_inner();
    saturday.validate().map_err(AppError::BadRequest)?;

    sqlx::query(
        r#"
        INSERT INTO working_saturdays (date, is_working)
        VALUES (?, ?)
        ON DUPLICATE KEY UPDATE is_working = VALUES(is_working)
        "#,
    )
    .bind(saturday.date)
    .bind(saturday.is_working)
    .execute(pool.get_ref())
    .await?;

    info!(
        date = %saturday.date,
        is_working = saturday.is_working,
        admin = auth.user_id,
        "Working Saturday updated"
    );

    Ok(HttpResponse::Ok().json(saturday))
}
