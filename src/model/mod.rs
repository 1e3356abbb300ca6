pub mod attendance;
pub mod edit_request;
pub mod employee;
pub mod leave_request;
pub mod role;
pub mod user;
pub mod working_saturday;
