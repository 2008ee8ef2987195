pub mod audit_helpers;
pub mod auth;
pub mod bulk;
pub mod diff;
pub mod export;
pub mod import;
pub mod init;
pub mod log;
pub mod record;
pub mod status;
pub mod summary;
