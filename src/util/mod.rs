pub mod csv_export;
pub mod email;
pub mod error;
pub mod json;
pub mod jwt;
pub mod logger;
pub mod password;
pub mod sms;
pub mod time;
