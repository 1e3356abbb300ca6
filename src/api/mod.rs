pub mod attendance;
pub mod edit_request;
pub mod employee;
pub mod leave_request;
pub mod working_saturday;
