use crate::{
    api::{
        attendance::{aggregate_period, local_now},
        leave_request::{FilterValue, parse_status},
    },
    auth::auth::AuthUser,
    error::{AppError, AppResult},
    model::{
        attendance::{AttendanceRecord, AttendanceRow, AttendanceStatus},
        edit_request::{EditRequest, can_request_edit, validate_times},
        leave_request::RequestStatus,
    },
    utils::live_session::LiveSessionCache,
};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateEditRequest {
    #[schema(example = 345)]
    pub attendance_id: u64,
    #[schema(example = "2026-01-05T09:00:00", format = "date-time", value_type = String)]
    pub requested_in_time: NaiveDateTime,
    #[schema(example = "2026-01-05T17:30:00", format = "date-time", value_type = String)]
    pub requested_out_time: NaiveDateTime,
    #[schema(example = "Forgot to check out")]
    pub reason: String,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct EditRequestFilter {
    /// Filter by employee ID (administrators only)
    #[schema(example = 123)]
    pub employee_id: Option<u64>,
    /// Filter by request status
    #[schema(example = "pending")]
    pub status: Option<String>,
    #[schema(example = 1)]
    pub page: Option<u64>,
    #[schema(example = 10)]
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct EditRequestListResponse {
    pub data: Vec<EditRequest>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

const EDIT_COLUMNS: &str = "id, employee_id, attendance_id, requested_in_time, requested_out_time, \
     reason, status, reviewed_by, created_at";

/// Rewrites a record's times only while it is still a worked day.
const REWRITE_TIMES_SQL: &str =
    "UPDATE attendance SET in_time = ?, out_time = ? WHERE id = ? AND status = ?";

async fn fetch_record(pool: &MySqlPool, attendance_id: u64) -> AppResult<AttendanceRecord> {
    sqlx::query_as::<_, AttendanceRow>(
        r#"
        SELECT id, employee_id, date, in_time, out_time, status, location
        FROM attendance
        WHERE id = ?
        "#,
    )
    .bind(attendance_id)
    .fetch_optional(pool)
    .await?
    .map(AttendanceRecord::from)
    .ok_or_else(|| AppError::not_found("Attendance record not found"))
}

/// Submit a correction for a past, completed day
#[utoipa::path(
    post,
    path = "/api/edit-requests",
    request_body = CreateEditRequest,
    responses(
        (status = 201, description = "Edit request submitted", body = Object, example = json!({
            "message": "Edit request submitted",
            "status": "pending"
        })),
        (status = 400, description = "Day not editable or invalid times"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Record belongs to someone else"),
        (status = 404, description = "Attendance record not found"),
        (status = 409, description = "A pending request already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Edit Requests"
)]
pub async fn create_edit_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    live: web::Data<LiveSessionCache>,
    payload: web::Json<CreateEditRequest>,
) -> AppResult<impl Responder> {
    let employee_id = auth.own_employee_id()?;
    let payload = payload.into_inner();

    if payload.reason.trim().is_empty() {
        return Err(AppError::bad_request("A reason is required"));
    }

    let record = fetch_record(pool.get_ref(), payload.attendance_id).await?;
    if record.employee_id != employee_id {
        return Err(AppError::forbidden("Cannot edit another employee's attendance"));
    }
    if !record.accepts_time_edit() {
        return Err(AppError::bad_request("Only present days can be edited"));
    }

    // Eligibility is judged on the day as the calendar shows it.
    let now = local_now();
    let aggregation =
        aggregate_period(pool.get_ref(), &live, employee_id, record.date, record.date, now).await?;
    let editable = aggregation
        .days
        .first()
        .is_some_and(|day| day.attendance_id == Some(record.id) && can_request_edit(day, now.date()));
    if !editable {
        return Err(AppError::bad_request(
            "Only completed days before today can be edited",
        ));
    }

    validate_times(record.date, payload.requested_in_time, payload.requested_out_time)
        .map_err(AppError::BadRequest)?;

    let pending = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM edit_requests WHERE attendance_id = ? AND status = ?)",
    )
    .bind(record.id)
    .bind(RequestStatus::Pending.as_ref())
    .fetch_one(pool.get_ref())
    .await?;
    if pending {
        return Err(AppError::Conflict(
            "A pending edit request already exists for this day".into(),
        ));
    }

    sqlx::query(
        r#"
        INSERT INTO edit_requests
            (employee_id, attendance_id, requested_in_time, requested_out_time, reason, status)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(record.id)
    .bind(payload.requested_in_time)
    .bind(payload.requested_out_time)
    .bind(payload.reason.trim())
    .bind(RequestStatus::Pending.as_ref())
    .execute(pool.get_ref())
    .await?;

    info!(employee_id, attendance_id = record.id, "Edit request submitted");

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Edit request submitted",
        "status": "pending"
    })))
}

/// List edit requests; employees only see their own
#[utoipa::path(
    get,
    path = "/api/edit-requests",
    params(EditRequestFilter),
    responses(
        (status = 200, description = "Paginated edit requests", body = EditRequestListResponse),
        (status = 400, description = "Invalid status filter"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Edit Requests"
)]
pub async fn list_edit_requests(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<EditRequestFilter>,
) -> AppResult<impl Responder> {
    let employee_filter = if auth.is_administrator() {
        query.employee_id
    } else {
        Some(auth.target_employee(query.employee_id)?)
    };

    let per_page = query.per_page.unwrap_or(10).clamp(1, 100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(emp_id) = employee_filter {
        where_sql.push_str(" AND employee_id = ?");
        args.push(FilterValue::U64(emp_id));
    }

    if let Some(status) = query.status.as_deref() {
        let status = parse_status(status)?;
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status.into()));
    }

    let count_sql = format!("SELECT COUNT(*) FROM edit_requests{where_sql}");
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(*s),
        };
    }
    let total = count_q.fetch_one(pool.get_ref()).await?;

    let data_sql = format!(
        "SELECT {EDIT_COLUMNS} FROM edit_requests{where_sql} ORDER BY created_at DESC LIMIT ? OFFSET ?"
    );
    let mut data_q = sqlx::query_as::<_, EditRequest>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
        };
    }

    let data = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(EditRequestListResponse {
        data,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}

/// Approve an edit request and rewrite the attendance times (HR/Admin)
#[utoipa::path(
    put,
    path = "/api/edit-requests/{request_id}/approve",
    params(
        ("request_id" = u64, Path, description = "ID of the edit request to approve")
    ),
    responses(
        (status = 200, description = "Edit request approved", body = Object, example = json!({
            "message": "Edit request approved"
        })),
        (status = 400, description = "Request already processed or the day is no longer a present day"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Edit request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Edit Requests"
)]
pub async fn approve_edit_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<impl Responder> {
    auth.require_hr_or_admin()?;
    let request_id = path.into_inner();

    let mut tx = pool.begin().await?;

    let request = sqlx::query_as::<_, EditRequest>(&format!(
        "SELECT {EDIT_COLUMNS} FROM edit_requests WHERE id = ? FOR UPDATE"
    ))
    .bind(request_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found("Edit request not found"))?;

    let current: RequestStatus = request
        .status
        .parse()
        .map_err(|_| AppError::Internal(format!("Unknown edit request status {}", request.status)))?;
    let next = current
        .transition(RequestStatus::Approved)
        .map_err(AppError::BadRequest)?;

    // The day may have turned into leave or holiday since the request was filed.
    let updated = sqlx::query(REWRITE_TIMES_SQL)
        .bind(request.requested_in_time)
        .bind(request.requested_out_time)
        .bind(request.attendance_id)
        .bind(AttendanceStatus::Present.as_ref())
        .execute(&mut *tx)
        .await?;
    if updated.rows_affected() == 0 {
        return Err(AppError::bad_request(
            "Attendance record is no longer a present day and cannot be edited",
        ));
    }

    sqlx::query("UPDATE edit_requests SET status = ?, reviewed_by = ? WHERE id = ?")
        .bind(next.as_ref())
        .bind(auth.user_id)
        .bind(request_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    info!(
        request_id,
        attendance_id = request.attendance_id,
        reviewer = auth.user_id,
        "Edit request approved"
    );

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Edit request approved"
    })))
}

/// Reject an edit request (HR/Admin)
#[utoipa::path(
    put,
    path = "/api/edit-requests/{request_id}/reject",
    params(
        ("request_id" = u64, Path, description = "ID of the edit request to reject")
    ),
    responses(
        (status = 200, description = "Edit request rejected", body = Object, example = json!({
            "message": "Edit request rejected"
        })),
        (status = 400, description = "Edit request not found or already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Edit Requests"
)]
pub async fn reject_edit_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<impl Responder> {
    auth.require_hr_or_admin()?;
    let request_id = path.into_inner();

    let result = sqlx::query(
        r#"
        UPDATE edit_requests
        SET status = ?, reviewed_by = ?
        WHERE id = ?
        AND status = ?
        "#,
    )
    .bind(RequestStatus::Rejected.as_ref())
    .bind(auth.user_id)
    .bind(request_id)
    .bind(RequestStatus::Pending.as_ref())
    .execute(pool.get_ref())
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::bad_request(
            "Edit request not found or already processed",
        ));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Edit request rejected"
    })))
}
