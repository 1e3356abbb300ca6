use crate::{
    api::attendance::local_now,
    auth::auth::AuthUser,
    error::{AppError, AppResult},
    model::{
        attendance::{AttendanceStatus, DEFAULT_LOCATION},
        leave_request::{
            LeaveRequest, LeaveType, MAX_LEAVE_DAYS, RequestStatus, leave_dates, validate_leave_range,
        },
    },
};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-02", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "sick")]
    pub leave_type: LeaveType, // enum ensures Swagger dropdown
    #[schema(example = "Flu")]
    pub reason: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRequest>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    #[schema(example = 123)]
    /// Filter by employee ID (administrators only)
    pub employee_id: Option<u64>,
    #[schema(example = "pending")]
    /// Filter by leave status
    pub status: Option<String>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    #[schema(example = 10)]
    /// Pagination per page number
    pub per_page: Option<u64>,
}

// Helper enum for typed SQLx binding
pub(crate) enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
}

const LEAVE_COLUMNS: &str =
    "id, employee_id, start_date, end_date, leave_type, reason, status, created_at";

pub(crate) fn parse_status(raw: &str) -> AppResult<RequestStatus> {
    raw.parse()
        .map_err(|_| AppError::bad_request("Invalid status. Allowed: pending, approved, rejected"))
}

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Leave request submitted successfully",
         body = Object,
         example = json!({
            "message": "Leave request submitted",
            "status": "pending"
         })
        ),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateLeave>,
) -> AppResult<impl Responder> {
    let employee_id = auth.own_employee_id()?;

    validate_leave_range(payload.start_date, payload.end_date, local_now().date())
        .map_err(AppError::BadRequest)?;

    sqlx::query(
        r#"
        INSERT INTO leave_requests
            (employee_id, start_date, end_date, leave_type, reason, status)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(payload.leave_type.as_ref())
    .bind(payload.reason.as_deref())
    .bind(RequestStatus::Pending.as_ref())
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id, "Failed to create leave request");
        AppError::from(e)
    })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave request submitted",
        "status": "pending"
    })))
}

/* =========================
Approve leave (HR/Admin)
========================= */
/// Approval also marks every covered day as `Leave` in attendance.
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    responses(
        (status = 200, description = "Leave approved successfully", body = Object, example = json!({
            "message": "Leave approved"
        })),
        (status = 400, description = "Leave request already processed", body = Object, example = json!({
            "message": "Request is already approved, cannot mark it approved"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<impl Responder> {
    auth.require_hr_or_admin()?;
    let leave_id = path.into_inner();

    let mut tx = pool.begin().await?;

    let leave = sqlx::query_as::<_, LeaveRequest>(&format!(
        "SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ? FOR UPDATE"
    ))
    .bind(leave_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found("Leave request not found"))?;

    let next = parse_status(&leave.status)?
        .transition(RequestStatus::Approved)
        .map_err(AppError::BadRequest)?;

    if leave.end_date.signed_duration_since(leave.start_date).num_days() + 1 > MAX_LEAVE_DAYS {
        return Err(AppError::BadRequest(format!(
            "Leave spans more than {MAX_LEAVE_DAYS} days and cannot be approved"
        )));
    }

    sqlx::query("UPDATE leave_requests SET status = ?, reviewed_by = ? WHERE id = ?")
        .bind(next.as_ref())
        .bind(auth.user_id)
        .bind(leave_id)
        .execute(&mut *tx)
        .await?;

    // Days already worked keep their record.
    let days = leave_dates(leave.start_date, leave.end_date);
    for date in &days {
        sqlx::query(
            r#"
            INSERT INTO attendance (employee_id, date, status, location)
            VALUES (?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE status = IF(in_time IS NULL, VALUES(status), status)
            "#,
        )
        .bind(leave.employee_id)
        .bind(*date)
        .bind(AttendanceStatus::Leave.as_ref())
        .bind(DEFAULT_LOCATION)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    info!(leave_id, employee_id = leave.employee_id, days = days.len(), "Leave approved");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave approved"
    })))
}

/* =========================
Reject leave (HR/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    responses(
        (status = 200, description = "Leave rejected successfully", body = Object, example = json!({
            "message": "Leave rejected"
        })),
        (status = 400, description = "Leave request not found or already processed", body = Object, example = json!({
            "message": "Leave request not found or already processed"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<impl Responder> {
    auth.require_hr_or_admin()?;
    let leave_id = path.into_inner();

    let result = sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = ?, reviewed_by = ?
        WHERE id = ?
        AND status = ?
        "#,
    )
    .bind(RequestStatus::Rejected.as_ref())
    .bind(auth.user_id)
    .bind(leave_id)
    .bind(RequestStatus::Pending.as_ref())
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id, "Reject leave failed");
        AppError::from(e)
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::bad_request(
            "Leave request not found or already processed",
        ));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave rejected"
    })))
}

/// for getting a leave application details endpoint
#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found", body = Object, example = json!({
            "message": "Leave request not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<impl Responder> {
    let leave_id = path.into_inner();

    let leave = sqlx::query_as::<_, LeaveRequest>(&format!(
        "SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ?"
    ))
    .bind(leave_id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| AppError::not_found("Leave request not found"))?;

    auth.target_employee(Some(leave.employee_id))?;

    Ok(HttpResponse::Ok().json(leave))
}

/// for getting leave applications endpoint
///
/// Administrators see every request; employees only their own.
#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 400, description = "Invalid status filter"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveFilter>,
) -> AppResult<impl Responder> {
    let employee_filter = if auth.is_administrator() {
        query.employee_id
    } else {
        Some(auth.target_employee(query.employee_id)?)
    };

    // -------------------------
    // Pagination
    // -------------------------
    let per_page = query.per_page.unwrap_or(10).clamp(1, 100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    // -------------------------
    // WHERE clause
    // -------------------------
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

    // -------------------------
    // COUNT query
    // -------------------------
    let count_sql = format!("SELECT COUNT(*) FROM leave_requests{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(*s),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await?;

    // -------------------------
    // DATA query
    // -------------------------
    let data_sql = format!(
        r#"
        SELECT {LEAVE_COLUMNS}
        FROM leave_requests
        {}
        ORDER BY created_at DESC
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, LeaveRequest>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
        };
    }

    let leaves = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data: leaves,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_filter_accepts_known_values_only() {
        assert_eq!(parse_status("rejected").unwrap(), RequestStatus::Rejected);
        assert!(matches!(parse_status("maybe"), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn create_payload_rejects_unknown_leave_type() {
        let ok: Result<CreateLeave, _> = serde_json::from_str(
            r#"{"start_date":"2026-01-01","end_date":"2026-01-02","leave_type":"annual"}"#,
        );
        assert!(ok.is_ok());

        let bad: Result<CreateLeave, _> = serde_json::from_str(
            r#"{"start_date":"2026-01-01","end_date":"2026-01-02","leave_type":"gap-year"}"#,
        );
        assert!(bad.is_err());
    }
}
