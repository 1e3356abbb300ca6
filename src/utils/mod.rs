pub mod db_utils;
pub mod live_session;
