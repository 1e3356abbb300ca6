use std::collections::HashSet;

use crate::{
    aggregator::{self, AggregateInput, Aggregation, DayView, MonthlySummary},
    auth::auth::AuthUser,
    error::{AppError, AppResult},
    export,
    model::attendance::{AttendanceRecord, AttendanceRow, AttendanceStatus, DEFAULT_LOCATION},
    utils::live_session::LiveSessionCache,
};
use actix_web::{HttpResponse, Responder, http::header, web};
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::{info, warn};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CheckInReq {
    #[schema(example = "Office")]
    pub location: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct MonthQuery {
    /// Month 1-12, defaults to the current month
    #[schema(example = 3)]
    pub month: Option<u32>,
    /// Defaults to the current year
    #[schema(example = 2025)]
    pub year: Option<i32>,
    /// Administrators only; defaults to the caller
    #[schema(example = 1000)]
    pub employee_id: Option<u64>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct WeekQuery {
    /// Any date in the wanted week, defaults to today
    #[schema(example = "2025-03-12", format = "date", value_type = Option<String>)]
    pub date: Option<NaiveDate>,
    /// Administrators only; defaults to the caller
    #[schema(example = 1000)]
    pub employee_id: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceViewResponse {
    pub employee_id: u64,
    #[schema(value_type = String, format = "date")]
    pub from: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub to: NaiveDate,
    pub days: Vec<DayView>,
    pub summary: MonthlySummary,
}

/// Server-local evaluation instant.
pub(crate) fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Records and working Saturdays the aggregator needs for `[from, to]`.
pub(crate) async fn load_period(
    pool: &MySqlPool,
    employee_id: u64,
    from: NaiveDate,
    to: NaiveDate,
) -> AppResult<(Vec<AttendanceRecord>, HashSet<NaiveDate>)> {
    let records: Vec<AttendanceRecord> = sqlx::query_as::<_, AttendanceRow>(
        r#"
        SELECT id, employee_id, date, in_time, out_time, status, location
        FROM attendance
        WHERE employee_id = ?
        AND date BETWEEN ? AND ?
        ORDER BY date, id
        "#,
    )
    .bind(employee_id)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(AttendanceRecord::from)
    .collect();

    let saturdays: HashSet<NaiveDate> = sqlx::query_scalar::<_, NaiveDate>(
        r#"
        SELECT date
        FROM working_saturdays
        WHERE is_working = 1
        AND date BETWEEN ? AND ?
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?
    .into_iter()
    .collect();

    Ok((records, saturdays))
}

/// Loads and aggregates `[from, to]` for one employee.
pub(crate) async fn aggregate_period(
    pool: &MySqlPool,
    live: &LiveSessionCache,
    employee_id: u64,
    from: NaiveDate,
    to: NaiveDate,
    now: NaiveDateTime,
) -> AppResult<Aggregation> {
    let (records, saturdays) = load_period(pool, employee_id, from, to).await?;

    let input = AggregateInput {
        employee_id,
        records: &records,
        working_saturdays: &saturdays,
        live_session: Some(live),
        now,
    };
    let aggregation = aggregator::aggregate_range(&input, from, to)?;

    if !aggregation.duplicate_dates.is_empty() {
        warn!(
            employee_id,
            dates = ?aggregation.duplicate_dates,
            "DataIntegrityWarning: multiple attendance records for one date, using the first"
        );
    }

    Ok(aggregation)
}

fn resolve_month(query: &MonthQuery, now: NaiveDateTime) -> AppResult<(u32, i32, NaiveDate, NaiveDate)> {
    let month = query.month.unwrap_or_else(|| now.month());
    let year = query.year.unwrap_or_else(|| now.year());
    let (from, to) = aggregator::month_bounds(month, year)?;
    Ok((month, year, from, to))
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    request_body(
        content = CheckInReq,
        description = "Optional; location defaults to Office",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Checked in successfully", body = Object, example = json!({
            "message": "Checked in successfully"
        })),
        (status = 400, description = "A record for today already exists (checked in, on leave, holiday or absent)", body = Object, example = json!({
            "message": "On approved leave today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    live: web::Data<LiveSessionCache>,
    payload: Option<web::Json<CheckInReq>>,
) -> AppResult<impl Responder> {
    let employee_id = auth.own_employee_id()?;
    let now = local_now();
    let location = payload
        .and_then(|p| p.into_inner().location)
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| DEFAULT_LOCATION.to_string());

    let result = sqlx::query(
        r#"
        INSERT INTO attendance (employee_id, date, in_time, status, location)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(now.date())
    .bind(now)
    .bind(AttendanceStatus::Present.as_ref())
    .bind(&location)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => {
            live.start(employee_id, now);
            info!(target: "attendance_events", event = "check_in", employee_id, at = %now, location = %location);
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "message": "Checked in successfully"
            })))
        }
        // A record for today already exists: a check-in, or a leave/holiday/absence entry.
        Err(e) if AppError::is_unique_violation(&e) => {
            let existing = sqlx::query_as::<_, AttendanceRow>(
                r#"
                SELECT id, employee_id, date, in_time, out_time, status, location
                FROM attendance
                WHERE employee_id = ? AND date = ?
                "#,
            )
            .bind(employee_id)
            .bind(now.date())
            .fetch_optional(pool.get_ref())
            .await?
            .map(AttendanceRecord::from);

            let message = existing
                .as_ref()
                .map_or("Already checked in today", AttendanceRecord::check_in_conflict);
            Err(AppError::bad_request(message))
        }
        Err(e) => {
            tracing::error!(error = %e, employee_id, "Check-in failed");
            Err(e.into())
        }
    }
}

/// Check-out endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-out",
    responses(
        (status = 200, description = "Checked out successfully", body = Object, example = json!({
            "message": "Checked out successfully"
        })),
        (status = 400, description = "No active check-in found for today", body = Object, example = json!({
            "message": "No active check-in found for today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    live: web::Data<LiveSessionCache>,
) -> AppResult<impl Responder> {
    let employee_id = auth.own_employee_id()?;
    let now = local_now();

    let result = sqlx::query(
        r#"
        UPDATE attendance
        SET out_time = ?
        WHERE employee_id = ?
        AND date = ?
        AND in_time IS NOT NULL
        AND out_time IS NULL
        "#,
    )
    .bind(now)
    .bind(employee_id)
    .bind(now.date())
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id, "Check-out failed");
        AppError::from(e)
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::bad_request("No active check-in found for today"));
    }

    live.finish(employee_id, now.date());
    info!(target: "attendance_events", event = "check_out", employee_id, at = %now);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Checked out successfully"
    })))
}

/// Monthly attendance calendar with summary
#[utoipa::path(
    get,
    path = "/api/attendance/monthly",
    params(MonthQuery),
    responses(
        (status = 200, description = "Every day of the month and its summary", body = AttendanceViewResponse),
        (status = 400, description = "Invalid month or year"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn monthly_view(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    live: web::Data<LiveSessionCache>,
    query: web::Query<MonthQuery>,
) -> AppResult<impl Responder> {
    let employee_id = auth.target_employee(query.employee_id)?;
    let now = local_now();
    let (_, _, from, to) = resolve_month(&query, now)?;

    let aggregation = aggregate_period(pool.get_ref(), &live, employee_id, from, to, now).await?;

    Ok(HttpResponse::Ok().json(AttendanceViewResponse {
        employee_id,
        from,
        to,
        days: aggregation.days,
        summary: aggregation.summary,
    }))
}

/// Weekly dashboard view, Monday to Sunday
#[utoipa::path(
    get,
    path = "/api/attendance/weekly",
    params(WeekQuery),
    responses(
        (status = 200, description = "The seven days of the week and their summary", body = AttendanceViewResponse),
        (status = 400, description = "Date outside the supported range"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn weekly_view(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    live: web::Data<LiveSessionCache>,
    query: web::Query<WeekQuery>,
) -> AppResult<impl Responder> {
    let employee_id = auth.target_employee(query.employee_id)?;
    let now = local_now();
    let (from, to) = aggregator::week_bounds(query.date.unwrap_or_else(|| now.date()))?;

    let aggregation = aggregate_period(pool.get_ref(), &live, employee_id, from, to, now).await?;

    Ok(HttpResponse::Ok().json(AttendanceViewResponse {
        employee_id,
        from,
        to,
        days: aggregation.days,
        summary: aggregation.summary,
    }))
}

/// CSV download of a month's attendance
#[utoipa::path(
    get,
    path = "/api/attendance/export",
    params(MonthQuery),
    responses(
        (status = 200, description = "CSV file", content_type = "text/csv", body = String),
        (status = 400, description = "Invalid month or year"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn export_csv(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    live: web::Data<LiveSessionCache>,
    query: web::Query<MonthQuery>,
) -> AppResult<impl Responder> {
    let employee_id = auth.target_employee(query.employee_id)?;
    let now = local_now();
    let (month, year, from, to) = resolve_month(&query, now)?;

    let aggregation = aggregate_period(pool.get_ref(), &live, employee_id, from, to, now).await?;
    let body = export::days_to_csv(&aggregation.days)
        .map_err(|e| AppError::Internal(format!("CSV export failed: {e}")))?;

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!(
                "attachment; filename=\"{}\"",
                export::export_filename(employee_id, month, year)
            ),
        ))
        .body(body))
}
