pub mod access;
pub mod accounts;
pub mod metrics;
pub mod password;
pub mod tokens;
