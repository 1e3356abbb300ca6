use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "employee_code": "EMP-001",
        "first_name": "John",
        "last_name": "Doe",
        "email": "john.doe@company.com",
        "phone": "+8801712345678",
        "department": "Engineering",
        "position": "Backend Developer",
        "join_date": "2024-01-01",
        "status": "active"
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "EMP-001")]
    pub employee_code: String,

    #[schema(example = "John")]
    pub first_name: String,

    #[schema(example = "Doe")]
    pub last_name: String,

    #[schema(example = "john.doe@company.com")]
    pub email: String,

    #[schema(example = "+8801712345678", nullable = true)]
    pub phone: Option<String>,

    #[schema(example = "Engineering")]
    pub department: String,

    #[schema(example = "Backend Developer")]
    pub position: String,

    #[schema(
        example = "2024-01-01",
        value_type = String,
        format = "date"
    )]
    pub join_date: NaiveDate,

    #[schema(example = "active")]
    pub status: String,
}

/// Columns an update payload may touch.
pub const UPDATABLE_COLUMNS: &[&str] = &[
    "employee_code",
    "first_name",
    "last_name",
    "email",
    "phone",
    "department",
    "position",
    "join_date",
    "status",
];

pub const EMPLOYEE_STATUSES: &[&str] = &["active", "inactive"];
