use crate::aggregator::{DayStatus, DayView, MonthlySummary};
use crate::api::attendance::{AttendanceViewResponse, CheckInReq, MonthQuery, WeekQuery};
use crate::api::edit_request::{CreateEditRequest, EditRequestFilter, EditRequestListResponse};
use crate::api::employee::{CreateEmployee, EmployeeListResponse, EmployeeQuery, UpdateEmployee};
use crate::api::leave_request::{CreateLeave, LeaveFilter, LeaveListResponse};
use crate::api::working_saturday::SaturdayRange;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::edit_request::EditRequest;
use crate::model::employee::Employee;
use crate::model::leave_request::{LeaveRequest, LeaveType, RequestStatus};
use crate::model::working_saturday::WorkingSaturday;
use crate::models::{LoginReq, RegisterReq, TokenPair};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Attendance API",
        version = "1.0.0",
        description = r#"
## Attendance & HR Management

Employees check in and out, browse their monthly and weekly attendance
calendar, export it as CSV, request corrections and apply for leave.
Administrators manage employees, review requests and decide which Saturdays
are working days.

### 🔹 Key Features
- **Attendance**
  - Daily check-in/check-out, monthly and weekly calendar views, CSV export
- **Edit Requests**
  - Corrections for past completed days, reviewed by HR/Admin
- **Leave Management**
  - Apply for leave, approve/reject requests, and view leave history
- **Working Saturdays**
  - Saturdays are weekends unless explicitly marked as working
- **Employee Management**
  - Create, update, list, and view employee profiles

### 🔐 Security
All `/api` endpoints require a **JWT Bearer** access token.
Only **Admin** or **HR** can review requests and manage employees.

### 📦 Response Format
- JSON responses; errors are `{"message": "..."}`
- Pagination supported for list endpoints
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,

        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::monthly_view,
        crate::api::attendance::weekly_view,
        crate::api::attendance::export_csv,

        crate::api::edit_request::create_edit_request,
        crate::api::edit_request::list_edit_requests,
        crate::api::edit_request::approve_edit_request,
        crate::api::edit_request::reject_edit_request,

        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::create_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,

        crate::api::working_saturday::list_working_saturdays,
        crate::api::working_saturday::set_working_saturday,

        crate::api::employee::create_employee,
        crate::api::employee::get_employee,
        crate::api::employee::list_employees,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee
    ),
    components(
        schemas(
            RegisterReq,
            LoginReq,
            TokenPair,
            CheckInReq,
            MonthQuery,
            WeekQuery,
            AttendanceViewResponse,
            AttendanceRecord,
            AttendanceStatus,
            DayView,
            DayStatus,
            MonthlySummary,
            CreateEditRequest,
            EditRequestFilter,
            EditRequestListResponse,
            EditRequest,
            CreateLeave,
            LeaveFilter,
            LeaveListResponse,
            LeaveRequest,
            LeaveType,
            RequestStatus,
            SaturdayRange,
            WorkingSaturday,
            CreateEmployee,
            UpdateEmployee,
            EmployeeQuery,
            Employee,
            EmployeeListResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login, token refresh and account registration"),
        (name = "Attendance", description = "Check-in/out and attendance views"),
        (name = "Edit Requests", description = "Attendance correction workflow"),
        (name = "Leave", description = "Leave management APIs"),
        (name = "Working Saturdays", description = "Saturday working-day overrides"),
        (name = "Employee", description = "Employee management APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
