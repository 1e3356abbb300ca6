use crate::{
    auth::auth::AuthUser,
    error::{AppError, AppResult},
    model::employee::{EMPLOYEE_STATUSES, Employee, UPDATABLE_COLUMNS},
    utils::db_utils::{build_update_sql, execute_update},
};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::MySqlPool;
use tracing::{debug, info};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "EMP-001")]
    pub employee_code: String,
    #[schema(example = "John")]
    pub first_name: String,
    #[schema(example = "Doe")]
    pub last_name: String,
    #[schema(example = "john@email.com", format = "email")]
    pub email: String,
    #[schema(example = "+8801712345678", nullable = true)]
    pub phone: Option<String>,
    #[schema(example = "Engineering")]
    pub department: String,
    #[schema(example = "Backend Developer")]
    pub position: String,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub join_date: NaiveDate,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct EmployeeQuery {
    /// Page number (start with 1)
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    /// Filter by department
    pub department: Option<String>,
    /// Filter by status (active, inactive)
    pub status: Option<String>,
    /// Search by name or email
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<Employee>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 10)]
    pub total: i64,
}

/// Documents the accepted update fields; the handler takes raw JSON.
#[derive(Deserialize, ToSchema)]
pub struct UpdateEmployee {
    pub employee_code: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    #[schema(example = "active")]
    pub status: Option<String>,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub join_date: Option<NaiveDate>,
}

const EMPLOYEE_COLUMNS: &str = "id, employee_code, first_name, last_name, email, phone, \
     department, position, join_date, status";

fn check_status(payload: &Value) -> AppResult<()> {
    match payload.get("status") {
        None => Ok(()),
        Some(Value::String(s)) if EMPLOYEE_STATUSES.contains(&s.as_str()) => Ok(()),
        Some(_) => Err(AppError::bad_request(
            "Invalid status. Allowed: active, inactive",
        )),
    }
}

fn map_unique(err: sqlx::Error) -> AppError {
    if AppError::is_unique_violation(&err) {
        AppError::Conflict("Employee code or email already exists".into())
    } else {
        AppError::Database(err)
    }
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created successfully", body = Object, example = json!({
            "message": "Employee created successfully",
            "id": 1
        })),
        (status = 403, description = "HR/Admin only"),
        (status = 409, description = "Employee code or email already exists"),
        (status = 500, description = "Internal server error", body = Object, example = json!({
            "message": "Internal Server Error"
        }))
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateEmployee>,
) -> AppResult<impl Responder> {
    auth.require_hr_or_admin()?;

    let result = sqlx::query(
        r#"
        INSERT INTO employees
        (employee_code, first_name, last_name, email, phone, department, position, join_date)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&payload.employee_code)
    .bind(&payload.first_name)
    .bind(&payload.last_name)
    .bind(&payload.email)
    .bind(&payload.phone)
    .bind(&payload.department)
    .bind(&payload.position)
    .bind(payload.join_date)
    .execute(pool.get_ref())
    .await
    .map_err(map_unique)?;

    let id = result.last_insert_id();
    info!(employee_id = id, created_by = auth.user_id, "Employee created");

    Ok(HttpResponse::Created().json(json!({
        "message": "Employee created successfully",
        "id": id
    })))
}

/// List Employees
#[utoipa::path(
    get,
    path = "/api/employees",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeeListResponse),
        (status = 403, description = "HR/Admin only")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_employees(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<EmployeeQuery>,
) -> AppResult<impl Responder> {
    auth.require_hr_or_admin()?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    // ---------- build WHERE clause dynamically ----------
    let mut conditions = Vec::new();
    let mut bindings: Vec<String> = Vec::new();

    if let Some(department) = &query.department {
        conditions.push("department = ?");
        bindings.push(department.clone());
    }

    if let Some(status) = &query.status {
        conditions.push("status = ?");
        bindings.push(status.clone());
    }

    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        conditions.push("(first_name LIKE ? OR last_name LIKE ? OR email LIKE ?)");
        let like = format!("%{search}%");
        bindings.extend([like.clone(), like.clone(), like]);
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    // ---------- total count ----------
    let count_sql = format!("SELECT COUNT(*) FROM employees {where_clause}");
    debug!(sql = %count_sql, bindings = ?bindings, "Counting employees");

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for b in &bindings {
        count_query = count_query.bind(b);
    }
    let total = count_query.fetch_one(pool.get_ref()).await?;

    // ---------- data query ----------
    let data_sql = format!(
        "SELECT {EMPLOYEE_COLUMNS} FROM employees {where_clause} ORDER BY id DESC LIMIT ? OFFSET ?"
    );
    debug!(sql = %data_sql, page, per_page, offset, "Fetching employees");

    let mut data_query = sqlx::query_as::<_, Employee>(&data_sql);
    for b in &bindings {
        data_query = data_query.bind(b);
    }
    let employees = data_query
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        data: employees,
        page,
        per_page,
        total,
    }))
}

/// Update Employee
#[utoipa::path(
    put,
    path = "/api/employees/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    request_body = UpdateEmployee,
    responses(
        (status = 200, description = "Employee updated successfully", body = Object, example = json!({
            "message": "Employee updated successfully"
        })),
        (status = 400, description = "Unknown field or invalid value"),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee not found"
        })),
        (status = 409, description = "Employee code or email already exists")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> AppResult<impl Responder> {
    auth.require_hr_or_admin()?;
    let employee_id = path.into_inner();

    check_status(&body)?;
    let update = build_update_sql("employees", &body, UPDATABLE_COLUMNS, "id", employee_id)?;

    let affected = execute_update(pool.get_ref(), update)
        .await
        .map_err(map_unique)?;

    // MySQL reports 0 rows for an unchanged row as well; confirm it exists.
    if affected == 0 {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM employees WHERE id = ?)")
                .bind(employee_id)
                .fetch_one(pool.get_ref())
                .await?;
        if !exists {
            return Err(AppError::not_found("Employee not found"));
        }
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Employee updated successfully"
    })))
}

/// Delete Employee
#[utoipa::path(
    delete,
    path = "/api/employees/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Successfully deleted", body = Object, example = json!({
            "message": "Successfully deleted"
        })),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee not found"
        }))
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<impl Responder> {
    auth.require_hr_or_admin()?;
    let employee_id = path.into_inner();

    let res = sqlx::query("DELETE FROM employees WHERE id = ?")
        .bind(employee_id)
        .execute(pool.get_ref())
        .await?;

    if res.rows_affected() == 0 {
        return Err(AppError::not_found("Employee not found"));
    }

    info!(employee_id, deleted_by = auth.user_id, "Employee deleted");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Successfully deleted"
    })))
}

/// Get Employee by ID
#[utoipa::path(
    get,
    path = "/api/employees/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee not found"
        }))
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<impl Responder> {
    let employee_id = auth.target_employee(Some(path.into_inner()))?;

    let employee = sqlx::query_as::<_, Employee>(&format!(
        "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?"
    ))
    .bind(employee_id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| AppError::not_found("Employee not found"))?;

    Ok(HttpResponse::Ok().json(employee))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_must_be_known_when_present() {
        assert!(check_status(&json!({"first_name": "A"})).is_ok());
        assert!(check_status(&json!({"status": "inactive"})).is_ok());
        assert!(check_status(&json!({"status": "fired"})).is_err());
        assert!(check_status(&json!({"status": 1})).is_err());
    }

    #[test]
    fn create_payload_allows_missing_phone() {
        let req: CreateEmployee = serde_json::from_str(
            r#"{
                "employee_code": "EMP-9",
                "first_name": "Ana",
                "last_name": "Lee",
                "email": "ana@example.com",
                "department": "Ops",
                "position": "Analyst",
                "join_date": "2025-04-01"
            }"#,
        )
        .unwrap();
        assert!(req.phone.is_none());
        assert_eq!(req.join_date, NaiveDate::from_ymd_opt(2025, 4, 1).unwrap());
    }
}
