use sqlx::FromRow;

/// Login account. `employee_id` links the account to an employee profile.
#[derive(Debug, FromRow)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub password: String,
    pub role_id: u8,
    pub employee_id: Option<u64>,
}
