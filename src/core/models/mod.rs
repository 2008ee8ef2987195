pub mod actor;
pub mod audit_entry;
pub mod query;
pub mod request;
